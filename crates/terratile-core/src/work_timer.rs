use std::time::{Duration, Instant};

/// Accumulates the time spent on individual work items within one tick.
pub struct WorkTimer {
    started: Instant,
    busy_time: Duration,
    items_completed: u32,
}

impl WorkTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            busy_time: Duration::ZERO,
            items_completed: 0,
        }
    }

    /// Wall-clock time since [`WorkTimer::start`].
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn busy_time(&self) -> Duration {
        self.busy_time
    }

    pub fn items_completed(&self) -> u32 {
        self.items_completed
    }

    pub fn complete_item(&mut self, item_time: Duration) {
        self.busy_time += item_time;
        self.items_completed += 1;
    }

    /// Times `f` and records it as one completed item.
    pub fn measure<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.complete_item(start.elapsed());
        out
    }

    pub fn average_item_time_us(&self) -> u32 {
        let busy_us = u32::try_from(self.busy_time.as_micros()).unwrap_or(u32::MAX);
        busy_us / self.items_completed.max(1)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
