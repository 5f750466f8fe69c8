use crate::MapNavigator;

use terratile_core::FrameBudget;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Ticks every registered [`MapNavigator`].
///
/// Ticks happen either when the owner calls [`NavigationDriver::pump`], or on a worker thread started with
/// [`NavigationDriver::spawn_worker`]. With a [`FrameBudget`], each tick drains at most
/// [`FrameBudget::items_per_frame`] requests per navigator and feeds the measured request times back into the budget.
pub struct NavigationDriver {
    shared: Arc<DriverShared>,
    worker: Mutex<Option<Worker>>,
}

struct DriverShared {
    navigators: Mutex<Vec<Arc<MapNavigator>>>,
    budget: Option<Mutex<FrameBudget>>,
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl NavigationDriver {
    /// Each tick drains every pending request.
    pub fn new() -> Self {
        Self::from_budget(None)
    }

    pub fn with_budget(budget: FrameBudget) -> Self {
        Self::from_budget(Some(Mutex::new(budget)))
    }

    fn from_budget(budget: Option<Mutex<FrameBudget>>) -> Self {
        Self {
            shared: Arc::new(DriverShared {
                navigators: Mutex::new(Vec::new()),
                budget,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Registering the same navigator twice does nothing.
    pub fn register(&self, navigator: Arc<MapNavigator>) {
        let mut navigators = self.shared.navigators.lock();
        if !navigators.iter().any(|n| Arc::ptr_eq(n, &navigator)) {
            navigators.push(navigator);
        }
    }

    pub fn unregister(&self, navigator: &Arc<MapNavigator>) -> bool {
        let mut navigators = self.shared.navigators.lock();
        let before = navigators.len();
        navigators.retain(|n| !Arc::ptr_eq(n, navigator));
        navigators.len() != before
    }

    pub fn num_navigators(&self) -> usize {
        self.shared.navigators.lock().len()
    }

    /// Runs one tick on the calling thread. Returns the number of requests processed.
    pub fn pump(&self) -> usize {
        self.shared.tick()
    }

    /// Starts ticking every `interval` on a background thread until [`NavigationDriver::shutdown`]. Does nothing if a
    /// worker is already running.
    pub fn spawn_worker(&self, interval: Duration) -> io::Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            log::warn!("Navigation worker is already running");
            return Ok(());
        }

        let (stop, stopped) = channel::bounded::<()>(0);
        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name("navigation".to_owned())
            .spawn(move || loop {
                shared.tick();
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        log::info!("Started navigation worker ticking every {:?}", interval);

        *worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Stops the worker thread, if any, and waits for its current tick to finish.
    pub fn shutdown(&self) {
        let worker = self.worker.lock().take();
        if let Some(Worker { stop, handle }) = worker {
            drop(stop);
            if handle.join().is_err() {
                log::error!("Navigation worker panicked");
            } else {
                log::info!("Stopped navigation worker");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }
}

impl Default for NavigationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NavigationDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl DriverShared {
    fn tick(&self) -> usize {
        // Snapshot so navigators can be registered from inside completion callbacks.
        let navigators = self.navigators.lock().clone();

        let budget = match self.budget.as_ref() {
            Some(budget) => budget,
            None => return navigators.iter().map(|n| n.process_path_requests()).sum(),
        };

        // The budget is only locked between requests, so callbacks may pump again.
        let limit = {
            let mut budget = budget.lock();
            budget.reset_timer();
            budget.items_per_frame() as usize
        };

        let mut processed = 0;
        for navigator in navigators.iter() {
            for _ in 0..limit {
                let start = Instant::now();
                if navigator.process_path_requests_max(1) == 0 {
                    break;
                }
                budget.lock().complete_item(start.elapsed());
                processed += 1;
            }
        }
        budget.lock().update_estimate();

        processed
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
