//! The brokerage: registration, price-list intake, thread fan-out, and the
//! drain-style shutdown.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use fab_algo::solve_batch;
use fab_core::{Catalog, Customer, MaterialId, OrderBatch, PriceList, Producer, ProducerKey,
    INFINITE_COST};

use crate::quorum::MaterialState;

/// Runtime settings for [`Broker::start`].
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    /// Worker thread count; 0 auto-detects the CPU count.
    pub workers: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

impl BrokerConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }
}

/// A batch travelling through the pipeline together with the customer it
/// must be delivered back to.
struct Job {
    batch: OrderBatch,
    customer: Arc<dyn Customer>,
}

/// Catalogs, quorum state, and the parking lot, all behind one lock.
///
/// They change together: a response merges into a catalog, advances the
/// quorum, and may migrate parked jobs, and none of those steps may observe
/// the others half-done.
#[derive(Default)]
struct CatalogBook {
    catalogs: HashMap<MaterialId, Arc<Catalog>>,
    quorum: HashMap<MaterialId, MaterialState>,
    parked: HashMap<MaterialId, Vec<Job>>,
}

struct RunningThreads {
    receivers: Vec<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

struct Shared {
    producers: Mutex<Vec<Arc<dyn Producer>>>,
    customers: Mutex<Vec<Arc<dyn Customer>>>,
    book: Mutex<CatalogBook>,
    solicited: Mutex<HashSet<MaterialId>>,

    order_queue: Mutex<VecDeque<Job>>,
    order_ready: Condvar,
    completions: Mutex<VecDeque<Job>>,
    completion_ready: Condvar,

    /// Raised by `stop` once no receiver can produce further jobs.
    shutdown: AtomicBool,
    /// Raised by `stop` once every solicited material has reached quorum.
    producers_done: AtomicBool,
    /// Raised by `stop` after the worker pool has been joined.
    workers_done: AtomicBool,
}

/// The welding-cost brokerage.
///
/// Cheap to clone: clones share one brokerage instance, which is how
/// producers get a handle to call [`Broker::add_price_list`] back on.
/// Register producers and customers first, then [`start`](Broker::start);
/// [`stop`](Broker::stop) drains everything in flight.
#[derive(Clone)]
pub struct Broker {
    shared: Arc<Shared>,
    threads: Arc<Mutex<RunningThreads>>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                producers: Mutex::new(Vec::new()),
                customers: Mutex::new(Vec::new()),
                book: Mutex::new(CatalogBook::default()),
                solicited: Mutex::new(HashSet::new()),
                order_queue: Mutex::new(VecDeque::new()),
                order_ready: Condvar::new(),
                completions: Mutex::new(VecDeque::new()),
                completion_ready: Condvar::new(),
                shutdown: AtomicBool::new(false),
                producers_done: AtomicBool::new(false),
                workers_done: AtomicBool::new(false),
            }),
            threads: Arc::new(Mutex::new(RunningThreads {
                receivers: Vec::new(),
                workers: Vec::new(),
                dispatcher: None,
            })),
        }
    }

    /// Register a producer. Must happen before [`Broker::start`]; the
    /// per-material producer totals are taken from this list.
    pub fn add_producer(&self, producer: Arc<dyn Producer>) {
        self.shared.producers.lock().push(producer);
    }

    /// Register a customer. Must happen before [`Broker::start`].
    pub fn add_customer(&self, customer: Arc<dyn Customer>) {
        self.shared.customers.lock().push(customer);
    }

    /// Producer response intake. Safe to call from any thread.
    ///
    /// Merges the list into the material's catalog and advances that
    /// material's quorum; the quorum advances once per call even when the
    /// list carries no usable entries. Lists for the reserved zero material
    /// are ignored. When the call completes the quorum, every batch parked
    /// on the material moves to the order queue.
    pub fn add_price_list(&self, producer: &Arc<dyn Producer>, list: PriceList) {
        if list.material.is_null() {
            return;
        }
        let material = list.material;
        let responder = ProducerKey::of(producer);

        let migrated = {
            let mut book = self.shared.book.lock();
            Arc::make_mut(book.catalogs.entry(material).or_default()).merge(&list);

            let newly_answered = match book.quorum.entry(material) {
                Entry::Occupied(mut entry) => entry.get_mut().record_response(responder),
                Entry::Vacant(entry) => {
                    let total = self.shared.producers.lock().len();
                    entry
                        .insert(MaterialState::first_response(total, responder))
                        .answered()
                }
            };

            if newly_answered {
                let parked = book.parked.remove(&material).unwrap_or_default();
                debug!(
                    "material {} answered, releasing {} parked batches",
                    material.value(),
                    parked.len()
                );
                if parked.is_empty() {
                    false
                } else {
                    // Book lock before queue lock, matching the receivers.
                    let mut queue = self.shared.order_queue.lock();
                    queue.extend(parked);
                    true
                }
            } else {
                false
            }
        };

        if migrated {
            self.shared.order_ready.notify_all();
        }
    }

    /// Spawn the worker pool, the completion dispatcher, and one receiver
    /// per registered customer.
    pub fn start(&self, config: BrokerConfig) {
        let workers = if config.workers == 0 {
            num_cpus::get()
        } else {
            config.workers
        };

        self.shared.shutdown.store(false, Ordering::Release);
        self.shared.producers_done.store(false, Ordering::Release);
        self.shared.workers_done.store(false, Ordering::Release);

        let mut threads = self.threads.lock();
        for _ in 0..workers {
            let shared = Arc::clone(&self.shared);
            threads.workers.push(thread::spawn(move || worker_loop(&shared)));
        }
        {
            let shared = Arc::clone(&self.shared);
            threads.dispatcher = Some(thread::spawn(move || dispatcher_loop(&shared)));
        }
        for customer in self.shared.customers.lock().iter().cloned() {
            let shared = Arc::clone(&self.shared);
            threads
                .receivers
                .push(thread::spawn(move || receiver_loop(&shared, customer)));
        }

        debug!(
            "brokerage started: {} workers, {} receivers",
            workers,
            threads.receivers.len()
        );
    }

    /// Drain and shut down.
    ///
    /// 1. Join receivers; each ends when its customer's demand runs out.
    /// 2. Wait until every solicited material is answered; in-flight
    ///    producers may still be responding after the receivers are gone.
    /// 3. Shut the order queue down and join the workers.
    /// 4. Shut the completion queue down and join the dispatcher.
    pub fn stop(&self) {
        let receivers: Vec<_> = self.threads.lock().receivers.drain(..).collect();
        for handle in receivers {
            let _ = handle.join();
        }
        debug!("receivers drained");

        loop {
            let solicited: Vec<MaterialId> =
                self.shared.solicited.lock().iter().copied().collect();
            let all_answered = {
                let book = self.shared.book.lock();
                solicited.iter().all(|material| {
                    book.quorum
                        .get(material)
                        .map(MaterialState::answered)
                        .unwrap_or(false)
                })
            };
            if all_answered {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        self.shared.producers_done.store(true, Ordering::Release);
        debug!("all solicited materials answered");

        {
            let _queue = self.shared.order_queue.lock();
            self.shared.shutdown.store(true, Ordering::Release);
        }
        self.shared.order_ready.notify_all();
        let workers: Vec<_> = self.threads.lock().workers.drain(..).collect();
        for handle in workers {
            let _ = handle.join();
        }

        {
            let _queue = self.shared.completions.lock();
            self.shared.workers_done.store(true, Ordering::Release);
        }
        self.shared.completion_ready.notify_all();
        if let Some(handle) = self.threads.lock().dispatcher.take() {
            let _ = handle.join();
        }
        debug!("brokerage stopped");
    }
}

/// Pull demand from one customer until it dries up.
fn receiver_loop(shared: &Arc<Shared>, customer: Arc<dyn Customer>) {
    while let Some(batch) = customer.wait_for_demand() {
        let material = batch.material;
        let job = Job {
            batch,
            customer: Arc::clone(&customer),
        };

        // First demand for a material solicits every producer, exactly once.
        let first_for_material = shared.solicited.lock().insert(material);
        if first_for_material {
            let producers = shared.producers.lock().clone();
            for producer in &producers {
                producer.send_price_list(material);
            }
        }

        // Check-and-park under one book acquisition: once a material is
        // answered no new parking entry may appear for it.
        let ready = {
            let mut book = shared.book.lock();
            let answered = book
                .quorum
                .get(&material)
                .map(MaterialState::answered)
                .unwrap_or(false);
            if answered {
                Some(job)
            } else {
                book.parked.entry(material).or_default().push(job);
                None
            }
        };
        if let Some(job) = ready {
            shared.order_queue.lock().push_back(job);
            shared.order_ready.notify_one();
        }
    }
}

/// Drain the order queue, solving each batch against a catalog snapshot.
fn worker_loop(shared: &Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.order_queue.lock();
            loop {
                if let Some(job) = queue.pop_front() {
                    break Some(job);
                }
                if shared.shutdown.load(Ordering::Acquire)
                    && shared.producers_done.load(Ordering::Acquire)
                {
                    break None;
                }
                shared.order_ready.wait(&mut queue);
            }
        };
        let Some(mut job) = job else { return };

        let catalog = shared
            .book
            .lock()
            .catalogs
            .get(&job.batch.material)
            .cloned();
        match catalog {
            Some(catalog) => solve_batch(&catalog, &mut job.batch),
            None => {
                for item in &mut job.batch.items {
                    item.cost = INFINITE_COST;
                }
            }
        }

        shared.completions.lock().push_back(job);
        shared.completion_ready.notify_one();
    }
}

/// Deliver solved batches back to their customers, one at a time.
fn dispatcher_loop(shared: &Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.completions.lock();
            loop {
                if let Some(job) = queue.pop_front() {
                    break Some(job);
                }
                if shared.shutdown.load(Ordering::Acquire)
                    && shared.workers_done.load(Ordering::Acquire)
                {
                    break None;
                }
                shared.completion_ready.wait(&mut queue);
            }
        };
        let Some(job) = job else { return };
        job.customer.completed(job.batch);
    }
}
