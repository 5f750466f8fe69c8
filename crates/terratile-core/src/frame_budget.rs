use crate::work_timer::WorkTimer;

use std::time::Duration;

/// Decides how many requests fit into one scheduling tick.
///
/// The per-item estimate starts at a configured guess and is replaced by the measured average after every tick that
/// completed at least one item.
pub struct FrameBudget {
    num_threads: u32,
    item_time_estimate_us: u32,
    target_frame_time_us: u32,
    timer: Option<WorkTimer>,
}

impl FrameBudget {
    pub fn new(num_threads: u32, target_frame_time_us: u32, initial_item_time_estimate_us: u32) -> Self {
        Self {
            num_threads,
            target_frame_time_us,
            item_time_estimate_us: initial_item_time_estimate_us,
            timer: None,
        }
    }

    /// Begins a new tick.
    pub fn reset_timer(&mut self) {
        self.timer = Some(WorkTimer::start());
    }

    /// Records one completed item. Starts a tick implicitly if [`FrameBudget::reset_timer`] wasn't called.
    pub fn complete_item(&mut self, item_time: Duration) {
        self.timer.get_or_insert_with(WorkTimer::start).complete_item(item_time);
    }

    /// Folds the current tick's measurements into the estimate.
    pub fn update_estimate(&mut self) {
        if let Some(timer) = self.timer.as_ref() {
            if timer.items_completed() > 0 {
                self.item_time_estimate_us = timer.average_item_time_us();
            }
        }
    }

    pub fn item_time_estimate_us(&self) -> u32 {
        self.item_time_estimate_us
    }

    /// Never zero, so a slow item can't starve the queue forever.
    pub fn items_per_frame(&self) -> u32 {
        let budget = self.target_frame_time_us.saturating_mul(self.num_threads);
        (budget / self.item_time_estimate_us.max(1)).max(1)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn estimate_tracks_measured_items() {
        let mut budget = FrameBudget::new(2, 1000, 100);
        assert_eq!(budget.items_per_frame(), 20);

        budget.reset_timer();
        budget.complete_item(Duration::from_micros(400));
        budget.complete_item(Duration::from_micros(600));
        budget.update_estimate();
        assert_eq!(budget.item_time_estimate_us(), 500);
        assert_eq!(budget.items_per_frame(), 4);
    }

    #[test]
    fn empty_tick_keeps_the_estimate() {
        let mut budget = FrameBudget::new(1, 1000, 250);
        budget.reset_timer();
        budget.update_estimate();
        assert_eq!(budget.item_time_estimate_us(), 250);
    }

    #[test]
    fn at_least_one_item_per_frame() {
        let budget = FrameBudget::new(1, 10, 1_000_000);
        assert_eq!(budget.items_per_frame(), 1);
    }
}
