/*!
 * Worker Pool
 * Process-wide pool the modern scheduling path submits to, plus the
 * serial legacy queue. Both start lazily and run for the rest of the
 * process
 */

use super::chore::WorkObject;
use super::scheduler;
use log::{error, info, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> WorkQueue<T> {
    const fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    fn push(&self, item: T) {
        self.items.lock().push_back(item);
        self.ready.notify_one();
    }

    fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.ready.wait(&mut items);
        }
    }
}

static POOL_QUEUE: WorkQueue<Arc<WorkObject>> = WorkQueue::new();
static POOL_STARTED: Mutex<bool> = Mutex::new(false);

static LEGACY_QUEUE: WorkQueue<usize> = WorkQueue::new();
static LEGACY_STARTED: Mutex<bool> = Mutex::new(false);

fn ensure_pool_started() -> io::Result<()> {
    let mut started = POOL_STARTED.lock();
    if *started {
        return Ok(());
    }

    let target = crate::thread::hardware_concurrency().max(1);
    let mut online = 0;
    for n in 0..target {
        let spawned = std::thread::Builder::new()
            .name(format!("pool-worker-{n}"))
            .spawn(pool_worker);
        match spawned {
            Ok(_) => online += 1,
            Err(err) if online == 0 => return Err(err),
            Err(err) => {
                warn!("worker pool degraded to {online} workers: {err}");
                break;
            }
        }
    }

    *started = true;
    info!("worker pool started ({online} workers)");
    Ok(())
}

fn ensure_legacy_started() -> io::Result<()> {
    let mut started = LEGACY_STARTED.lock();
    if *started {
        return Ok(());
    }

    std::thread::Builder::new()
        .name("legacy-work-runner".into())
        .spawn(legacy_worker)?;

    *started = true;
    info!("legacy work runner started");
    Ok(())
}

/// Queues a pool work object for one execution.
pub(crate) fn submit(work: Arc<WorkObject>) -> io::Result<()> {
    ensure_pool_started()?;
    POOL_QUEUE.push(work);
    Ok(())
}

/// Queues a chore on the serial legacy runner.
pub(crate) fn submit_legacy(chore: usize) -> io::Result<()> {
    ensure_legacy_started()?;
    LEGACY_QUEUE.push(chore);
    Ok(())
}

fn pool_worker() {
    loop {
        let work = POOL_QUEUE.pop();
        // The dispatch guard rebalances the counter and pin during an
        // unwind; the worker itself outlives any panicking callback.
        let dispatch = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scheduler::run_pool_work(work)
        }));
        if dispatch.is_err() {
            error!("chore callback panicked");
        }
    }
}

fn legacy_worker() {
    loop {
        let chore = LEGACY_QUEUE.pop();
        let dispatch = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scheduler::run_legacy_work(chore)
        }));
        if dispatch.is_err() {
            error!("legacy chore callback panicked");
        }
    }
}
