use crate::{Config, DriverMode};

use terratile_core::FrameBudget;
use terratile_map::{Map, MapError, MapNavigator, NavigationDriver, NavigationMode, Path, TilePosition, TileRegistries};

use parking_lot::RwLock;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// A shared map together with the registries that serialize it and the navigator that searches it.
///
/// The map lives behind an `Arc<RwLock<_>>` so that gameplay code can edit it while path requests are served from
/// another thread. In [`DriverMode::Background`] a worker thread answers requests; in [`DriverMode::Pump`] nothing
/// happens until [`TileWorld::tick`] is called.
pub struct TileWorld {
    config: Config,
    registries: TileRegistries,
    map: Arc<RwLock<Map>>,
    navigator: Arc<MapNavigator>,
    driver: NavigationDriver,
}

impl TileWorld {
    pub fn new(config: Config, registries: TileRegistries) -> io::Result<Self> {
        let nav_config = &config.navigation;
        let driver = if nav_config.budgeted {
            NavigationDriver::with_budget(FrameBudget::new(
                nav_config.threads,
                nav_config.target_tick_time_us,
                nav_config.initial_request_time_estimate_us,
            ))
        } else {
            NavigationDriver::new()
        };

        let map = Arc::new(RwLock::new(Map::new()));
        let navigator = Arc::new(MapNavigator::new(map.clone()));
        navigator.enable(&driver);

        if nav_config.driver == DriverMode::Background {
            driver.spawn_worker(Duration::from_millis(nav_config.tick_interval_ms))?;
        }

        Ok(Self {
            config,
            registries,
            map,
            navigator,
            driver,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registries(&self) -> &TileRegistries {
        &self.registries
    }

    pub fn map(&self) -> &Arc<RwLock<Map>> {
        &self.map
    }

    pub fn navigator(&self) -> &Arc<MapNavigator> {
        &self.navigator
    }

    pub fn driver(&self) -> &NavigationDriver {
        &self.driver
    }

    /// `on_complete` runs on whichever thread ticks navigation.
    pub fn request_path(
        &self,
        origin: TilePosition,
        destination: TilePosition,
        mode: NavigationMode,
        on_complete: impl FnOnce(Path) + Send + 'static,
    ) {
        self.navigator.request_path(origin, destination, mode, on_complete);
    }

    /// Runs one navigation tick on the calling thread. Does nothing while a worker thread owns ticking.
    pub fn tick(&self) -> usize {
        if self.driver.is_running() {
            return 0;
        }
        self.driver.pump()
    }

    /// Exports the map into the configured directory, creating it if needed.
    pub fn save(&self) -> Result<(), MapError> {
        let directory = &self.config.map.directory;
        std::fs::create_dir_all(directory)?;
        self.map.read().export(directory, &self.registries)
    }

    /// Replaces the map with the one in the configured directory.
    pub fn load(&self) -> Result<(), MapError> {
        self.map.write().import(&self.config.map.directory, &self.registries)
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
    use crate::{MapConfig, NavigationConfig};

    use terratile_map::{GroundTile, InteractableTile, Tile};

    use crossbeam::channel;

    struct Floor;

    impl Tile for Floor {
        fn registry_name(&self) -> &str {
            "floor"
        }
    }

    impl GroundTile for Floor {}

    struct Pillar;

    impl Tile for Pillar {
        fn registry_name(&self) -> &str {
            "pillar"
        }
    }

    impl InteractableTile for Pillar {
        fn navigation_modes(&self, _: &terratile_map::Region, _: TilePosition) -> NavigationMode {
            NavigationMode::NONE
        }
    }

    fn registries() -> TileRegistries {
        let mut registries = TileRegistries::new();
        registries.ground.add(Arc::new(Floor));
        registries.interactable.add(Arc::new(Pillar));
        registries
    }

    fn config(directory: &std::path::Path, driver: DriverMode) -> Config {
        Config {
            map: MapConfig {
                directory: directory.to_owned(),
            },
            navigation: NavigationConfig {
                driver,
                tick_interval_ms: 1,
                ..Default::default()
            },
        }
    }

    fn build_room(world: &TileWorld) {
        let floor = world.registries().ground("floor").unwrap().clone();
        let pillar = world.registries().interactable("pillar").unwrap().clone();
        let mut map = world.map().write();
        for x in 0..8 {
            for z in 0..8 {
                map.place_ground(TilePosition::new(x, z), floor.clone());
            }
        }
        for z in 0..7 {
            map.place_interactable(TilePosition::new(4, z), pillar.clone());
        }
    }

    #[test]
    fn pumped_world_answers_on_tick() {
        let dir = tempfile::tempdir().unwrap();
        let world = TileWorld::new(config(dir.path(), DriverMode::Pump), registries()).unwrap();
        build_room(&world);

        let (tx, rx) = channel::bounded(1);
        world.request_path(TilePosition::new(0, 0), TilePosition::new(7, 0), NavigationMode::WALK, move |path| {
            tx.send(path.remaining()).unwrap();
        });
        assert!(rx.try_recv().is_err());

        assert_eq!(world.tick(), 1);
        let waypoints = rx.try_recv().unwrap();
        assert_eq!(waypoints.first(), Some(&TilePosition::new(0, 0)));
        assert_eq!(waypoints.last(), Some(&TilePosition::new(7, 0)));
        assert!(waypoints.contains(&TilePosition::new(4, 7)));
    }

    #[test]
    fn background_world_answers_without_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let world = TileWorld::new(config(dir.path(), DriverMode::Background), registries()).unwrap();
        build_room(&world);

        let (tx, rx) = channel::bounded(1);
        world.request_path(TilePosition::new(0, 0), TilePosition::new(7, 7), NavigationMode::WALK, move |path| {
            tx.send(path.is_empty()).unwrap();
        });
        assert_eq!(world.tick(), 0);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(false));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let save_dir = dir.path().join("nested").join("save");
        let world = TileWorld::new(config(&save_dir, DriverMode::Pump), registries()).unwrap();
        build_room(&world);
        world.save().unwrap();

        let loaded = TileWorld::new(config(&save_dir, DriverMode::Pump), registries()).unwrap();
        loaded.load().unwrap();
        let map = loaded.map().read();
        assert_eq!(map.region_count(), 1);
        assert!(map.ground(TilePosition::new(7, 7)).is_some());
        assert_eq!(
            map.interactable(TilePosition::new(4, 3)).map(|t| t.registry_name().to_owned()),
            Some("pillar".to_owned())
        );
        assert!(map.interactable(TilePosition::new(4, 7)).is_none());
    }
}
