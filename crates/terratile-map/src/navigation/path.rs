use crate::{GroundRef, InteractableRef, MapEvents, MapObserver, Region, Subscription, TilePosition};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A consumable route from origin to destination, inclusive.
///
/// While it has waypoints left, a path watches its map and becomes dirty when a tile on a remaining waypoint is placed
/// or removed, or when a region containing one is destroyed. It never recomputes itself; movers should poll
/// [`Path::is_dirty`] and request a new path.
///
/// The path stops watching once exhausted, destroyed or dropped.
pub struct Path {
    state: Arc<PathState>,
    subscription: Option<(Arc<MapEvents>, Subscription)>,
}

struct PathState {
    waypoints: Mutex<VecDeque<TilePosition>>,
    dirty: AtomicBool,
}

impl PathState {
    fn dirty_if(&self, hit: bool) {
        if hit {
            self.dirty.store(true, Ordering::Release);
        }
    }

    fn dirty_if_waypoint(&self, position: TilePosition) {
        self.dirty_if(self.waypoints.lock().contains(&position));
    }
}

impl MapObserver for PathState {
    fn on_region_destroyed(&self, region: &Region) {
        let region_position = region.position();
        self.dirty_if(self.waypoints.lock().iter().any(|p| region_position.contains(*p)));
    }

    fn on_ground_placed(&self, _region: &Region, position: TilePosition, _tile: &GroundRef) {
        self.dirty_if_waypoint(position);
    }

    fn on_ground_removed(&self, _region: &Region, position: TilePosition, _tile: &GroundRef) {
        self.dirty_if_waypoint(position);
    }

    fn on_interactable_placed(&self, _region: &Region, position: TilePosition, _tile: &InteractableRef) {
        self.dirty_if_waypoint(position);
    }

    fn on_interactable_removed(&self, _region: &Region, position: TilePosition, _tile: &InteractableRef) {
        self.dirty_if_waypoint(position);
    }
}

impl Path {
    /// The result of a failed search: no waypoints, and dirty from the start.
    pub fn empty() -> Self {
        Self {
            state: Arc::new(PathState {
                waypoints: Mutex::new(VecDeque::new()),
                dirty: AtomicBool::new(true),
            }),
            subscription: None,
        }
    }

    /// A path over `waypoints` that watches `events`. No waypoints gives [`Path::empty`].
    pub fn new(waypoints: impl IntoIterator<Item = TilePosition>, events: &Arc<MapEvents>) -> Self {
        let waypoints: VecDeque<_> = waypoints.into_iter().collect();
        if waypoints.is_empty() {
            return Self::empty();
        }

        let state = Arc::new(PathState {
            waypoints: Mutex::new(waypoints),
            dirty: AtomicBool::new(false),
        });
        let subscription = events.subscribe(state.clone());
        Self {
            state,
            subscription: Some((events.clone(), subscription)),
        }
    }

    /// Pops the next waypoint. Taking the last one destroys the path.
    pub fn next_position(&mut self) -> Option<TilePosition> {
        let (next, exhausted) = {
            let mut waypoints = self.state.waypoints.lock();
            let next = waypoints.pop_front();
            (next, waypoints.is_empty())
        };
        if exhausted {
            self.destroy();
        }
        next
    }

    pub fn peek(&self) -> Option<TilePosition> {
        self.state.waypoints.lock().front().copied()
    }

    pub fn remaining(&self) -> Vec<TilePosition> {
        self.state.waypoints.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.state.waypoints.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.waypoints.lock().is_empty()
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty.load(Ordering::Acquire)
    }

    pub fn mark_dirty(&self) {
        self.state.dirty.store(true, Ordering::Release);
    }

    /// True while the path is still watching its map.
    pub fn is_watching(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stops watching the map. Idempotent.
    pub fn destroy(&mut self) {
        if let Some((events, subscription)) = self.subscription.take() {
            events.unsubscribe(subscription);
        }
    }
}

impl Drop for Path {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("waypoints", &self.remaining())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
