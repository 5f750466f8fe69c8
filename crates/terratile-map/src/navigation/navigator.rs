use crate::{Map, MapError, NavigationDriver, NavigationMode, Node, Path, PathRequest, TilePosition, REGION_AREA};

use terratile_core::{EntryId, Heap, RequestQueue, SmallKeyHashMap, SmallKeyHashSet};

use parking_lot::RwLock;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Serves path requests against a shared map.
///
/// Requests may be queued from any thread with [`MapNavigator::request_path`]. They are answered when some thread
/// drains the queue, either directly through [`MapNavigator::process_path_requests`] or through the
/// [`NavigationDriver`] the navigator is enabled on. **Completion callbacks run on the draining thread**, not on the
/// thread that made the request; callers that care must hand the result back themselves.
///
/// Each search holds the map's read lock for its duration only. Positions are resolved against the map as it is when
/// the request runs, so requests made before a region was destroyed simply see it missing.
pub struct MapNavigator {
    map: Arc<RwLock<Map>>,
    requests: RequestQueue<PathRequest>,
    enabled: AtomicBool,
}

impl MapNavigator {
    pub fn new(map: Arc<RwLock<Map>>) -> Self {
        Self {
            map,
            requests: RequestQueue::new(),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn map(&self) -> &Arc<RwLock<Map>> {
        &self.map
    }

    /// Registers with `driver` so its ticks drain this navigator.
    pub fn enable(self: &Arc<Self>, driver: &NavigationDriver) {
        driver.register(self.clone());
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(self: &Arc<Self>, driver: &NavigationDriver) {
        driver.unregister(self);
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn request_path(
        &self,
        origin: TilePosition,
        destination: TilePosition,
        mode: NavigationMode,
        on_complete: impl FnOnce(Path) + Send + 'static,
    ) {
        self.requests
            .enqueue(PathRequest::new(origin, destination, mode, on_complete));
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Runs every pending request in FIFO order on the calling thread. Returns the number processed.
    pub fn process_path_requests(&self) -> usize {
        self.requests.run_requests(self)
    }

    /// Like [`MapNavigator::process_path_requests`], but stops after `max` requests.
    pub fn process_path_requests_max(&self, max: usize) -> usize {
        self.requests.run_requests_max(self, max)
    }

    /// Searches synchronously.
    pub fn get_path(&self, origin: TilePosition, destination: TilePosition, mode: NavigationMode) -> Path {
        let map = self.map.read();
        find_path(&map, origin, destination, mode)
    }
}

/// Searches `map` and wraps the result in a [`Path`] that watches the map. Failures are logged and give
/// [`Path::empty`].
pub fn find_path(map: &Map, origin: TilePosition, destination: TilePosition, mode: NavigationMode) -> Path {
    match find_waypoints(map, origin, destination, mode) {
        Ok(Some(waypoints)) => Path::new(waypoints, map.events()),
        Ok(None) => {
            log::warn!("Failed to find a path from {} to {}", origin, destination);
            Path::empty()
        }
        Err(e) => {
            log::warn!("Failed to find a path from {} to {}: {}", origin, destination, e);
            Path::empty()
        }
    }
}

/// A* over the 8-connected tile grid.
///
/// Returns the waypoints from `origin` to `destination`, both included, or `None` if the destination can't be reached.
/// A neighbor is passable if its region exists and its tiles allow `mode`. Stepping onto it costs the octile step
/// distance times its navigation weight.
pub fn find_waypoints(
    map: &Map,
    origin: TilePosition,
    destination: TilePosition,
    mode: NavigationMode,
) -> Result<Option<Vec<TilePosition>>, MapError> {
    if map.region_count() == 0 {
        log::warn!("Tried to find a path on a map with no regions");
        return Ok(None);
    }

    // Every node but the origin is inside an existing region.
    let capacity = map.region_count() * REGION_AREA + 1;
    let mut open: Heap<Node> = Heap::with_capacity(capacity);
    let mut all_nodes: SmallKeyHashMap<TilePosition, EntryId> = SmallKeyHashMap::default();
    let mut closed: SmallKeyHashSet<TilePosition> = SmallKeyHashSet::default();

    let start = open.add(Node::new(origin, origin.distance(destination)))?;
    all_nodes.insert(origin, start);

    while let Some(current_id) = open.remove_first() {
        let current = match open.get(current_id) {
            Some(node) => *node,
            None => break,
        };
        closed.insert(current.position);

        if current.position == destination {
            return Ok(Some(retrace(&open, current_id)));
        }

        for (neighbor, weight) in passable_neighbors(map, current.position, mode) {
            if closed.contains(&neighbor) {
                continue;
            }

            let step = current.position.distance(neighbor).saturating_mul(weight);
            let tentative = current.cost_from_start.saturating_add(step);

            match all_nodes.get(&neighbor) {
                Some(&id) => {
                    let queued = open.contains(id);
                    let improves = open.get(id).map_or(false, |n| tentative < n.cost_from_start);
                    if improves || !queued {
                        if let Some(node) = open.get_mut(id) {
                            node.cost_from_start = tentative;
                            node.parent = Some(current_id);
                        }
                        if queued {
                            open.update_item(id);
                        } else {
                            open.requeue(id);
                        }
                    }
                }
                None => {
                    let mut node = Node::new(neighbor, neighbor.distance(destination));
                    node.cost_from_start = tentative;
                    node.parent = Some(current_id);
                    let id = open.add(node)?;
                    all_nodes.insert(neighbor, id);
                }
            }
        }
    }

    Ok(None)
}

fn passable_neighbors(
    map: &Map,
    position: TilePosition,
    mode: NavigationMode,
) -> SmallVec<[(TilePosition, u32); 8]> {
    position
        .neighbors()
        .into_iter()
        .filter_map(|neighbor| {
            let region_position = neighbor.parent_region_position();
            let region = map.region(region_position)?;
            let local = region_position.local_tile_position(neighbor);
            region
                .navigation_modes(local)
                .intersects(mode)
                .then(|| (neighbor, region.navigation_weight(local)))
        })
        .collect()
}

fn retrace(nodes: &Heap<Node>, end: EntryId) -> Vec<TilePosition> {
    let mut waypoints = Vec::new();
    let mut next = Some(end);
    while let Some(id) = next {
        match nodes.get(id) {
            Some(node) => {
                waypoints.push(node.position);
                next = node.parent;
            }
            None => break,
        }
    }
    waypoints.reverse();
    waypoints
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
    use crate::test_tiles::*;
    use crate::{GroundRef, RegionPosition};

    use crossbeam::channel;
    use std::thread;
    use std::time::Duration;

    fn grid(map: &mut Map, min: TilePosition, max: TilePosition, tile: &GroundRef) {
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                map.place_ground(TilePosition::new(x, z), tile.clone());
            }
        }
    }

    fn open_grid(size: i32) -> Map {
        let mut map = Map::new();
        grid(
            &mut map,
            TilePosition::ZERO,
            TilePosition::new(size - 1, size - 1),
            &ground("grass", 10),
        );
        map
    }

    fn shared(map: Map) -> Arc<RwLock<Map>> {
        Arc::new(RwLock::new(map))
    }

    #[test]
    fn diagonal_is_optimal_on_an_open_grid() {
        let map = open_grid(5);
        let path = find_path(&map, TilePosition::ZERO, TilePosition::new(4, 4), NavigationMode::WALK);
        assert!(!path.is_dirty());
        assert_eq!(
            path.remaining(),
            (0..5).map(|i| TilePosition::new(i, i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn origin_is_destination() {
        let map = open_grid(3);
        let waypoints = find_waypoints(&map, TilePosition::new(1, 1), TilePosition::new(1, 1), NavigationMode::ALL);
        assert_eq!(waypoints.unwrap(), Some(vec![TilePosition::new(1, 1)]));
    }

    #[test]
    fn enclosed_destination_is_unreachable() {
        let mut map = open_grid(7);
        let center = TilePosition::new(3, 3);
        for p in center.neighbors() {
            map.place_interactable(p, wall());
        }
        let path = find_path(&map, TilePosition::ZERO, center, NavigationMode::ALL);
        assert!(path.is_empty());
        assert!(path.is_dirty());
    }

    #[test]
    fn far_destination_is_unreachable() {
        let mut map = Map::new();
        map.place_ground(TilePosition::ZERO, ground("grass", 10));
        let far = TilePosition::new(1_000_000_000, 0);
        let path = find_path(&map, TilePosition::ZERO, far, NavigationMode::WALK);
        assert!(path.is_empty());

        let corner = TilePosition::new(i32::MAX, i32::MIN);
        let waypoints = find_waypoints(&map, corner, TilePosition::ZERO, NavigationMode::WALK);
        assert_eq!(waypoints.unwrap(), None);
    }

    #[test]
    fn empty_map_fails_immediately() {
        let map = Map::new();
        let path = find_path(&map, TilePosition::ZERO, TilePosition::new(1, 1), NavigationMode::ALL);
        assert!(path.is_empty());
        assert!(path.is_dirty());
    }

    #[test]
    fn missing_regions_are_impassable() {
        let mut map = Map::new();
        let grass = ground("grass", 10);
        map.place_ground(TilePosition::new(0, 0), grass.clone());
        // Region (2, 0) exists but the gap between them does not.
        map.place_ground(TilePosition::new(100, 0), grass.clone());
        let waypoints = find_waypoints(&map, TilePosition::ZERO, TilePosition::new(100, 0), NavigationMode::ALL);
        assert_eq!(waypoints.unwrap(), None);
    }

    #[test]
    fn heavy_tiles_are_avoided() {
        let mut map = Map::new();
        grid(&mut map, TilePosition::ZERO, TilePosition::new(4, 2), &ground("grass", 10));
        let mud = TilePosition::new(2, 1);
        map.place_ground(mud, ground("mud", 100));

        let waypoints = find_waypoints(&map, TilePosition::new(0, 1), TilePosition::new(4, 1), NavigationMode::WALK)
            .unwrap()
            .unwrap();
        assert_eq!(waypoints.first(), Some(&TilePosition::new(0, 1)));
        assert_eq!(waypoints.last(), Some(&TilePosition::new(4, 1)));
        assert!(!waypoints.contains(&mud));
    }

    #[test]
    fn interactable_weight_overrides_ground() {
        let mut map = Map::new();
        grid(&mut map, TilePosition::ZERO, TilePosition::new(4, 2), &ground("mud", 100));
        // A cheap road along z = 2.
        for x in 0..5 {
            map.place_interactable(TilePosition::new(x, 2), prop("road", NavigationMode::ALL, Some(1)));
        }
        let waypoints = find_waypoints(&map, TilePosition::new(0, 1), TilePosition::new(4, 1), NavigationMode::WALK)
            .unwrap()
            .unwrap();
        assert!(waypoints[1..waypoints.len() - 1].iter().all(|p| p.z == 2));
    }

    #[test]
    fn navigation_modes_filter_tiles() {
        let mut map = Map::new();
        grid(&mut map, TilePosition::ZERO, TilePosition::new(4, 0), &ground("grass", 10));
        map.place_interactable(TilePosition::new(2, 0), prop("chasm", NavigationMode::FLY, None));

        let walk = find_waypoints(&map, TilePosition::ZERO, TilePosition::new(4, 0), NavigationMode::WALK).unwrap();
        assert_eq!(walk, None);

        let fly = find_waypoints(&map, TilePosition::ZERO, TilePosition::new(4, 0), NavigationMode::FLY).unwrap();
        assert_eq!(fly.map(|w| w.len()), Some(5));

        let either = NavigationMode::WALK | NavigationMode::FLY;
        assert!(find_waypoints(&map, TilePosition::ZERO, TilePosition::new(4, 0), either)
            .unwrap()
            .is_some());
    }

    #[test]
    fn paths_cross_region_boundaries() {
        let mut map = Map::new();
        grid(&mut map, TilePosition::new(-3, -1), TilePosition::new(2, 0), &ground("grass", 10));
        assert_eq!(map.region_count(), 4);

        let waypoints = find_waypoints(&map, TilePosition::new(-3, -1), TilePosition::new(2, -1), NavigationMode::WALK)
            .unwrap()
            .unwrap();
        assert_eq!(waypoints.len(), 6);
        assert!(waypoints.iter().all(|p| p.z == -1));
    }

    #[test]
    fn callbacks_run_on_the_draining_thread() {
        let navigator = Arc::new(MapNavigator::new(shared(open_grid(5))));
        let (tx, rx) = channel::unbounded();

        let requester = {
            let navigator = navigator.clone();
            thread::spawn(move || {
                for i in 0..3 {
                    let tx = tx.clone();
                    let destination = TilePosition::new(4, i);
                    navigator.request_path(TilePosition::ZERO, destination, NavigationMode::WALK, move |path| {
                        tx.send((i, path.len(), thread::current().id())).unwrap();
                    });
                }
                thread::current().id()
            })
        };
        let requester_id = requester.join().unwrap();
        assert_eq!(navigator.pending_requests(), 3);

        assert_eq!(navigator.process_path_requests(), 3);
        let results: Vec<_> = rx.try_iter().collect();
        assert_eq!(results.iter().map(|r| r.0).collect::<Vec<_>>(), [0, 1, 2]);
        assert!(results.iter().all(|r| r.1 == 5));
        assert!(results.iter().all(|r| r.2 == thread::current().id() && r.2 != requester_id));
    }

    #[test]
    fn bounded_drain() {
        let navigator = MapNavigator::new(shared(open_grid(5)));
        for _ in 0..4 {
            navigator.request_path(TilePosition::ZERO, TilePosition::new(1, 1), NavigationMode::WALK, |_| {});
        }
        assert_eq!(navigator.process_path_requests_max(3), 3);
        assert_eq!(navigator.pending_requests(), 1);
        assert_eq!(navigator.process_path_requests_max(3), 1);
    }

    #[test]
    fn stale_requests_see_the_current_map() {
        let map = shared(open_grid(5));
        let navigator = MapNavigator::new(map.clone());
        let (tx, rx) = channel::bounded(1);
        navigator.request_path(TilePosition::ZERO, TilePosition::new(4, 4), NavigationMode::WALK, move |path| {
            tx.send(path.is_empty()).unwrap();
        });

        map.write().destroy_region(RegionPosition::new(0, 0));
        navigator.process_path_requests();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(true));
    }

    #[test]
    fn returned_paths_watch_the_map() {
        let map = shared(open_grid(5));
        let navigator = MapNavigator::new(map.clone());
        let path = navigator.get_path(TilePosition::ZERO, TilePosition::new(4, 4), NavigationMode::WALK);
        assert!(!path.is_dirty());

        map.write().place_interactable(TilePosition::new(2, 2), wall());
        assert!(path.is_dirty());
    }

    #[test]
    fn concurrent_requests_and_drains() {
        let navigator = Arc::new(MapNavigator::new(shared(open_grid(10))));
        let (tx, rx) = channel::unbounded();
        crossbeam::scope(|s| {
            for t in 0..4 {
                let navigator = navigator.clone();
                let tx = tx.clone();
                s.spawn(move |_| {
                    for i in 0..10 {
                        let tx = tx.clone();
                        let destination = TilePosition::new(t, i);
                        navigator.request_path(TilePosition::ZERO, destination, NavigationMode::WALK, move |p| {
                            tx.send(p.len()).unwrap();
                        });
                    }
                });
            }
            s.spawn(|_| {
                let mut processed = 0;
                while processed < 40 {
                    processed += navigator.process_path_requests();
                    thread::yield_now();
                }
            });
        })
        .unwrap();

        drop(tx);
        let lengths: Vec<usize> = rx.iter().collect();
        assert_eq!(lengths.len(), 40);
        assert!(lengths.iter().all(|&n| n >= 1));
    }
}
