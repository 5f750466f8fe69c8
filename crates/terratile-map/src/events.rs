use crate::{GroundRef, InteractableRef, Region, TilePosition};

use parking_lot::Mutex;
use smallvec::SmallVec;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives map mutations. Every method defaults to doing nothing.
///
/// Observers run synchronously on the thread that mutates the map, while the map is being mutated. They must not try
/// to lock or mutate the map themselves.
pub trait MapObserver: Send + Sync {
    fn on_region_created(&self, _region: &Region) {}

    fn on_region_destroyed(&self, _region: &Region) {}

    fn on_ground_placed(&self, _region: &Region, _position: TilePosition, _tile: &GroundRef) {}

    fn on_ground_removed(&self, _region: &Region, _position: TilePosition, _tile: &GroundRef) {}

    fn on_interactable_placed(&self, _region: &Region, _position: TilePosition, _tile: &InteractableRef) {}

    fn on_interactable_removed(&self, _region: &Region, _position: TilePosition, _tile: &InteractableRef) {}

    fn on_map_imported(&self, _directory: &Path) {}

    fn on_map_exported(&self, _directory: &Path) {}
}

/// Returned by [`MapEvents::subscribe`]; pass it to [`MapEvents::unsubscribe`] to stop receiving events.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Subscription(u64);

/// The observer list of one [`Map`](crate::Map).
///
/// Anyone holding the hub may subscribe, but only the owning map and its regions publish.
#[derive(Default)]
pub struct MapEvents {
    next_id: AtomicU64,
    observers: Mutex<Vec<(Subscription, Arc<dyn MapObserver>)>>,
}

type ObserverSnapshot = SmallVec<[Arc<dyn MapObserver>; 8]>;

impl MapEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn MapObserver>) -> Subscription {
        let id = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((id, observer));
        id
    }

    /// Returns false if `subscription` was not active.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(id, _)| *id != subscription);
        observers.len() != before
    }

    pub fn num_observers(&self) -> usize {
        self.observers.lock().len()
    }

    pub(crate) fn region_created(&self, region: &Region) {
        self.dispatch(|o| o.on_region_created(region));
    }

    pub(crate) fn region_destroyed(&self, region: &Region) {
        self.dispatch(|o| o.on_region_destroyed(region));
    }

    pub(crate) fn ground_placed(&self, region: &Region, position: TilePosition, tile: &GroundRef) {
        self.dispatch(|o| o.on_ground_placed(region, position, tile));
    }

    pub(crate) fn ground_removed(&self, region: &Region, position: TilePosition, tile: &GroundRef) {
        self.dispatch(|o| o.on_ground_removed(region, position, tile));
    }

    pub(crate) fn interactable_placed(&self, region: &Region, position: TilePosition, tile: &InteractableRef) {
        self.dispatch(|o| o.on_interactable_placed(region, position, tile));
    }

    pub(crate) fn interactable_removed(&self, region: &Region, position: TilePosition, tile: &InteractableRef) {
        self.dispatch(|o| o.on_interactable_removed(region, position, tile));
    }

    pub(crate) fn map_imported(&self, directory: &Path) {
        self.dispatch(|o| o.on_map_imported(directory));
    }

    pub(crate) fn map_exported(&self, directory: &Path) {
        self.dispatch(|o| o.on_map_exported(directory));
    }

    /// Observers are called outside the lock, so they may subscribe or unsubscribe while handling an event.
    fn dispatch(&self, f: impl Fn(&dyn MapObserver)) {
        let snapshot: ObserverSnapshot = self.observers.lock().iter().map(|(_, o)| o.clone()).collect();
        for observer in snapshot.iter() {
            f(observer.as_ref());
        }
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
    use crate::RegionPosition;

    struct Counter(Mutex<u32>);

    impl MapObserver for Counter {
        fn on_region_created(&self, _region: &Region) {
            *self.0.lock() += 1;
        }
    }

    /// Unsubscribes itself on the first event.
    struct OneShot {
        events: Arc<MapEvents>,
        subscription: Mutex<Option<Subscription>>,
        calls: Mutex<u32>,
    }

    impl MapObserver for OneShot {
        fn on_region_created(&self, _region: &Region) {
            *self.calls.lock() += 1;
            if let Some(s) = self.subscription.lock().take() {
                self.events.unsubscribe(s);
            }
        }
    }

    #[test]
    fn subscribe_and_unsubscribe() {
        let events = MapEvents::new();
        let counter = Arc::new(Counter(Mutex::new(0)));
        let sub = events.subscribe(counter.clone());
        let region = Region::new(RegionPosition::new(0, 0));

        events.region_created(&region);
        assert_eq!(*counter.0.lock(), 1);

        assert!(events.unsubscribe(sub));
        assert!(!events.unsubscribe(sub));
        events.region_created(&region);
        assert_eq!(*counter.0.lock(), 1);
        assert_eq!(events.num_observers(), 0);
    }

    #[test]
    fn observer_may_unsubscribe_during_dispatch() {
        let events = Arc::new(MapEvents::new());
        let one_shot = Arc::new(OneShot {
            events: events.clone(),
            subscription: Mutex::new(None),
            calls: Mutex::new(0),
        });
        let sub = events.subscribe(one_shot.clone());
        *one_shot.subscription.lock() = Some(sub);

        let region = Region::new(RegionPosition::new(0, 0));
        events.region_created(&region);
        events.region_created(&region);
        assert_eq!(*one_shot.calls.lock(), 1);
        assert_eq!(events.num_observers(), 0);
    }
}
