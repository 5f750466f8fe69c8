//! Copying and stamping rectangular windows of a map.
//!
//! # Format
//!
//! ```text
//! ground registry blob
//! interactable registry blob
//! i32 width, i32 height
//! width * height records, x outer and z inner, same shape as region records
//! ```

use crate::{
    GroundRef, InteractableRef, Map, MapError, Region, RegionPosition, TileEntity, TilePosition, TileRegistries,
    TileStack,
};

use terratile_core::io::{read_i32, read_u16, write_i32, write_u16};
use terratile_core::{DynamicRegistry, SmallKeyHashMap};

use itertools::iproduct;
use std::io::{self, Read, Write};

/// Blueprints larger than this many tiles are rejected on import.
pub const MAX_BLUEPRINT_AREA: usize = 1 << 22;

/// How [`Blueprint::paste`] treats tiles that are already on the map.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PastePolicy {
    /// Clear every position in the window, then stamp the blueprint.
    ReplaceAll,
    /// Only fill slots that are currently empty, per tile kind.
    ReplaceAir,
    /// Stamp every tile the blueprint has, replacing whatever is there. Empty blueprint slots leave the map alone.
    ReplaceOverlap,
}

/// A detached copy of a `width x height` window of tiles and their tile entities.
///
/// Positions inside a blueprint are offsets from its minimum corner.
#[derive(Default)]
pub struct Blueprint {
    size: TilePosition,
    /// Indexed by `x * height + z`.
    tiles: Vec<TileStack>,
    tile_entities: SmallKeyHashMap<TilePosition, Box<dyn TileEntity>>,
}

impl Blueprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the window starting at `min`. Tile entities are copied with [`TileEntity::duplicate`].
    ///
    /// Negative sizes are treated as zero.
    pub fn copy(map: &Map, min: TilePosition, size: TilePosition) -> Self {
        let size = size.max(TilePosition::ZERO);
        let mut tiles = Vec::with_capacity((size.x * size.z) as usize);
        let mut tile_entities = SmallKeyHashMap::default();

        for offset in offsets(size) {
            let global = min + offset;
            let stack = match map.try_get_tile_stack_with_region(global) {
                Some((region, stack)) => {
                    if stack.interactable.is_some() {
                        let local = region.position().local_tile_position(global);
                        if let Some(entity) = region.tile_entity(local) {
                            tile_entities.insert(offset, entity.duplicate(region, global));
                        }
                    }
                    TileStack {
                        ground: stack.ground.clone(),
                        interactable: stack.interactable.clone(),
                        ..Default::default()
                    }
                }
                None => TileStack::default(),
            };
            tiles.push(stack);
        }

        Self {
            size,
            tiles,
            tile_entities,
        }
    }

    /// `(width, height)` as `(x, z)`.
    pub fn size(&self) -> TilePosition {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_stack(&self, offset: TilePosition) -> Option<&TileStack> {
        self.index(offset).map(|i| &self.tiles[i])
    }

    pub fn tile_entity(&self, offset: TilePosition) -> Option<&dyn TileEntity> {
        self.tile_entities.get(&offset).map(|e| e.as_ref())
    }

    /// Stamps this blueprint with its minimum corner at `at`.
    ///
    /// Freshly placed tile entities take their values from the blueprint's copies through
    /// [`TileEntity::import_values`].
    pub fn paste(&self, map: &mut Map, at: TilePosition, policy: PastePolicy) {
        for (offset, stack) in offsets(self.size).zip(self.tiles.iter()) {
            let global = at + offset;
            match policy {
                PastePolicy::ReplaceAll => {
                    map.remove_ground(global);
                    map.remove_interactable(global);
                    self.stamp(map, global, offset, stack.ground.as_ref(), stack.interactable.as_ref());
                }
                PastePolicy::ReplaceAir => {
                    let (has_ground, has_interactable) = map
                        .try_get_tile_stack(global)
                        .map(|s| (s.ground.is_some(), s.interactable.is_some()))
                        .unwrap_or((false, false));
                    let ground = stack.ground.as_ref().filter(|_| !has_ground);
                    let interactable = stack.interactable.as_ref().filter(|_| !has_interactable);
                    self.stamp(map, global, offset, ground, interactable);
                }
                PastePolicy::ReplaceOverlap => {
                    self.stamp(map, global, offset, stack.ground.as_ref(), stack.interactable.as_ref());
                }
            }
        }
    }

    fn stamp(
        &self,
        map: &mut Map,
        global: TilePosition,
        offset: TilePosition,
        ground: Option<&GroundRef>,
        interactable: Option<&InteractableRef>,
    ) {
        if let Some(ground) = ground {
            map.place_ground(global, ground.clone());
        }
        if let Some(interactable) = interactable {
            if let Some(entity) = map.place_interactable(global, interactable.clone()) {
                if let Some(source) = self.tile_entities.get(&offset) {
                    entity.import_values(source.as_ref());
                }
            }
        }
    }

    pub fn export(&self, writer: &mut dyn Write, registries: &TileRegistries) -> Result<(), MapError> {
        // Ids are assigned up front so the registry blobs can precede the records.
        let mut ground_ids = DynamicRegistry::from_registry(&registries.ground)?;
        let mut interactable_ids = DynamicRegistry::from_registry(&registries.interactable)?;
        for stack in self.tiles.iter() {
            ground_ids.id_of(stack.ground.as_ref())?;
            interactable_ids.id_of(stack.interactable.as_ref())?;
        }
        ground_ids.export(writer)?;
        interactable_ids.export(writer)?;

        write_i32(writer, self.size.x)?;
        write_i32(writer, self.size.z)?;

        for (offset, stack) in offsets(self.size).zip(self.tiles.iter()) {
            write_u16(writer, ground_ids.id_of(stack.ground.as_ref())?)?;
            write_u16(writer, interactable_ids.id_of(stack.interactable.as_ref())?)?;
            if stack.interactable.is_some() {
                if let Some(entity) = self.tile_entities.get(&offset) {
                    entity.export(writer)?;
                }
            }
        }
        Ok(())
    }

    pub fn import(reader: &mut dyn Read, registries: &TileRegistries) -> Result<Self, MapError> {
        let ground_ids = DynamicRegistry::import(reader, &registries.ground)?;
        let interactable_ids = DynamicRegistry::import(reader, &registries.interactable)?;

        let size = TilePosition::new(read_i32(reader)?, read_i32(reader)?);
        let area = (size.x >= 0 && size.z >= 0)
            .then(|| size.x as usize * size.z as usize)
            .filter(|&area| area <= MAX_BLUEPRINT_AREA)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("bad blueprint size {}", size)))?;

        // Tile entity factories need a region; blueprints aren't part of one.
        let scratch = Region::new(RegionPosition::default());
        let mut tiles = Vec::with_capacity(area);
        let mut tile_entities = SmallKeyHashMap::default();
        for offset in offsets(size) {
            let ground = ground_ids.value(read_u16(reader)?).cloned();
            let interactable = interactable_ids.value(read_u16(reader)?).cloned();
            if let Some(tile) = &interactable {
                if let Some(mut entity) = tile.create_tile_entity(&scratch, offset) {
                    entity.import(reader)?;
                    tile_entities.insert(offset, entity);
                }
            }
            tiles.push(TileStack {
                ground,
                interactable,
                ..Default::default()
            });
        }

        Ok(Self {
            size,
            tiles,
            tile_entities,
        })
    }

    fn index(&self, offset: TilePosition) -> Option<usize> {
        let inside = (0..self.size.x).contains(&offset.x) && (0..self.size.z).contains(&offset.z);
        inside.then(|| (offset.x * self.size.z + offset.z) as usize)
    }
}

/// Offsets in record order, x outer and z inner.
fn offsets(size: TilePosition) -> impl Iterator<Item = TilePosition> {
    iproduct!(0..size.x, 0..size.z).map(|(x, z)| TilePosition::new(x, z))
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
