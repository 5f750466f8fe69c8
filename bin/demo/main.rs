//! Builds a small world, asks for a couple of paths across it and saves it.
//!
//! Usage: `demo [config.ron]`

use terratile::map::{
    GroundTile, InteractableTile, NavigationMode, Path, Region, Tile, TilePosition, TileRegistries,
};
use terratile::{Config, TileWorld};

use crossbeam::channel::{self, Receiver};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

struct Ground {
    name: &'static str,
    weight: u32,
}

impl Tile for Ground {
    fn registry_name(&self) -> &str {
        self.name
    }
}

impl GroundTile for Ground {
    fn navigation_weight(&self, _: &Region, _: TilePosition) -> u32 {
        self.weight
    }
}

struct Obstacle {
    name: &'static str,
    modes: NavigationMode,
}

impl Tile for Obstacle {
    fn registry_name(&self) -> &str {
        self.name
    }
}

impl InteractableTile for Obstacle {
    fn navigation_modes(&self, _: &Region, _: TilePosition) -> NavigationMode {
        self.modes
    }
}

fn registries() -> TileRegistries {
    let mut registries = TileRegistries::new();
    registries.ground.add(Arc::new(Ground {
        name: "grass",
        weight: 10,
    }));
    registries.ground.add(Arc::new(Ground { name: "mud", weight: 40 }));
    registries.interactable.add(Arc::new(Obstacle {
        name: "rock",
        modes: NavigationMode::NONE,
    }));
    registries.interactable.add(Arc::new(Obstacle {
        name: "water",
        modes: NavigationMode::FLY | NavigationMode::PHASE,
    }));
    registries
}

/// A meadow straddling two regions, split by a rock wall with a single gap and a lake next to it.
fn build(world: &TileWorld) -> Result<(), Box<dyn Error>> {
    let tile_registries = world.registries();
    let missing = |name: &str| format!("no tile named {}", name);
    let grass = tile_registries.ground("grass").ok_or_else(|| missing("grass"))?;
    let mud = tile_registries.ground("mud").ok_or_else(|| missing("mud"))?;
    let rock = tile_registries.interactable("rock").ok_or_else(|| missing("rock"))?;
    let water = tile_registries.interactable("water").ok_or_else(|| missing("water"))?;

    let mut map = world.map().write();
    for x in -30..30 {
        for z in 0..20 {
            let tile = if (x + z) % 7 == 0 { mud } else { grass };
            map.place_ground(TilePosition::new(x, z), tile.clone());
        }
    }
    for z in 0..18 {
        map.place_interactable(TilePosition::new(0, z), rock.clone());
    }
    for x in -6..-1 {
        for z in 0..12 {
            map.place_interactable(TilePosition::new(x, z), water.clone());
        }
    }
    log::info!("Built {} regions", map.region_count());

    Ok(())
}

fn wait_for(world: &TileWorld, rx: &Receiver<Path>) -> Result<Path, Box<dyn Error>> {
    loop {
        world.tick();
        match rx.recv_timeout(Duration::from_millis(world.config().navigation.tick_interval_ms)) {
            Ok(path) => return Ok(path),
            Err(channel::RecvTimeoutError::Timeout) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::read_file(path)?,
        None => Config::default(),
    };
    let world = TileWorld::new(config, registries())?;
    build(&world)?;

    let origin = TilePosition::new(-20, 5);
    let destination = TilePosition::new(20, 5);
    let (tx, rx) = channel::unbounded();
    for mode in [NavigationMode::WALK, NavigationMode::FLY] {
        let tx = tx.clone();
        world.request_path(origin, destination, mode, move |path| {
            let _ = tx.send(path);
        });
    }

    let walk = wait_for(&world, &rx)?;
    let fly = wait_for(&world, &rx)?;
    log::info!("Walking takes {} steps: {:?}", walk.len(), walk.remaining());
    log::info!("Flying takes {} steps", fly.len());

    if let Some(waypoint) = walk.remaining().get(walk.len() / 2).copied() {
        if let Some(rock) = world.registries().interactable("rock") {
            world.map().write().place_interactable(waypoint, rock.clone());
            log::info!("Dropped a rock on {}, walking path dirty: {}", waypoint, walk.is_dirty());
        }
    }

    world.save()?;
    log::info!("Saved to {}", world.config().map.directory.display());

    Ok(())
}
