//! Tile types shared by the unit tests.

use crate::{
    GroundRef, GroundTile, InteractableRef, InteractableTile, NavigationMode, Region, Tile, TileEntity, TilePosition,
};

use terratile_core::io::{read_i32, read_string, write_i32, write_string};

use parking_lot::Mutex;
use std::any::Any;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Records hook calls in order, as `"<what> <x>,<z>"`.
pub type HookLog = Arc<Mutex<Vec<String>>>;

pub fn hook_log() -> HookLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Option<HookLog>, what: &str, position: TilePosition) {
    if let Some(log) = log {
        log.lock().push(format!("{} {},{}", what, position.x, position.z));
    }
}

pub struct TestGround {
    name: String,
    weight: u32,
    log: Option<HookLog>,
}

impl Tile for TestGround {
    fn registry_name(&self) -> &str {
        &self.name
    }

    fn on_placed(&self, _region: &Region, position: TilePosition) {
        record(&self.log, &format!("{} placed", self.name), position);
    }

    fn on_removed(&self, _region: &Region, position: TilePosition) {
        record(&self.log, &format!("{} removed", self.name), position);
    }
}

impl GroundTile for TestGround {
    fn navigation_weight(&self, _region: &Region, _position: TilePosition) -> u32 {
        self.weight
    }
}

pub fn ground(name: &str, weight: u32) -> GroundRef {
    Arc::new(TestGround {
        name: name.to_owned(),
        weight,
        log: None,
    })
}

pub fn logged_ground(name: &str, log: &HookLog) -> GroundRef {
    Arc::new(TestGround {
        name: name.to_owned(),
        weight: 10,
        log: Some(log.clone()),
    })
}

/// An interactable with configurable navigation behavior and no entity.
pub struct TestProp {
    name: &'static str,
    modes: NavigationMode,
    weight: Option<u32>,
}

impl Tile for TestProp {
    fn registry_name(&self) -> &str {
        self.name
    }
}

impl InteractableTile for TestProp {
    fn navigation_modes(&self, _region: &Region, _position: TilePosition) -> NavigationMode {
        self.modes
    }

    fn navigation_weight_override(&self, _region: &Region, _position: TilePosition) -> Option<u32> {
        self.weight
    }
}

/// Blocks every kind of movement.
pub fn wall() -> InteractableRef {
    Arc::new(TestProp {
        name: "wall",
        modes: NavigationMode::NONE,
        weight: None,
    })
}

pub fn prop(name: &'static str, modes: NavigationMode, weight: Option<u32>) -> InteractableRef {
    Arc::new(TestProp { name, modes, weight })
}

pub struct Chest {
    log: Option<HookLog>,
}

impl Tile for Chest {
    fn registry_name(&self) -> &str {
        "chest"
    }

    fn on_placed(&self, _region: &Region, position: TilePosition) {
        record(&self.log, "chest placed", position);
    }

    fn on_removed(&self, _region: &Region, position: TilePosition) {
        record(&self.log, "chest removed", position);
    }
}

impl InteractableTile for Chest {
    fn create_tile_entity(&self, _region: &Region, _position: TilePosition) -> Option<Box<dyn TileEntity>> {
        Some(Box::new(ChestEntity {
            coins: 0,
            label: String::new(),
            log: self.log.clone(),
        }))
    }
}

pub fn chest() -> InteractableRef {
    Arc::new(Chest { log: None })
}

pub fn logged_chest(log: &HookLog) -> InteractableRef {
    Arc::new(Chest { log: Some(log.clone()) })
}

#[derive(Debug)]
pub struct ChestEntity {
    pub coins: i32,
    pub label: String,
    log: Option<HookLog>,
}

impl ChestEntity {
    pub fn with_coins(coins: i32) -> Self {
        Self {
            coins,
            label: String::new(),
            log: None,
        }
    }
}

impl TileEntity for ChestEntity {
    fn import_values(&mut self, source: &dyn TileEntity) {
        if let Some(source) = source.downcast_ref::<ChestEntity>() {
            self.coins = source.coins;
            self.label = source.label.clone();
        }
    }

    fn duplicate(&self, _region: &Region, _position: TilePosition) -> Box<dyn TileEntity> {
        Box::new(ChestEntity {
            coins: self.coins,
            label: self.label.clone(),
            log: self.log.clone(),
        })
    }

    fn on_placed(&self, region: &Region, position: TilePosition) {
        let local = region.position().local_tile_position(position);
        let what = match region.tile_entity(local) {
            Some(_) => "entity placed",
            None => "entity placed but not stored",
        };
        record(&self.log, what, position);
    }

    fn on_removed(&mut self, _region: &Region, position: TilePosition) {
        record(&self.log, "entity removed", position);
    }

    fn export(&self, writer: &mut dyn Write) -> io::Result<()> {
        write_i32(writer, self.coins)?;
        write_string(writer, &self.label)
    }

    fn import(&mut self, reader: &mut dyn Read) -> io::Result<()> {
        self.coins = read_i32(reader)?;
        self.label = read_string(reader)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
