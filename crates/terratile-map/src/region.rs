use crate::{
    coordinates::is_local, GroundRef, InteractableRef, MapError, MapEvents, NavigationMode, RegionPosition,
    RenderHandle, TileEntity, TilePosition, TileStack, DEFAULT_NAVIGATION_WEIGHT, REGION_AREA,
};

use terratile_core::io::{read_u16, write_u16};
use terratile_core::{DynamicRegistry, SmallKeyHashMap};

use std::io::{Read, Write};
use std::mem;
use std::sync::Arc;

/// One `REGION_SIZE x REGION_SIZE` chunk of the map.
///
/// Every method takes positions local to the region, in `0..REGION_SIZE` on both axes, and panics on anything else.
/// Tile hooks and map events see global positions.
///
/// A region created by its [`Map`](crate::Map) publishes placement events to the map's [`MapEvents`]. A region created
/// with [`Region::new`] is detached and publishes nothing.
pub struct Region {
    position: RegionPosition,
    /// Indexed by `x * REGION_SIZE + z`.
    tiles: Vec<TileStack>,
    /// Keyed by local position.
    tile_entities: SmallKeyHashMap<TilePosition, Box<dyn TileEntity>>,
    events: Option<Arc<MapEvents>>,
}

impl Region {
    pub fn new(position: RegionPosition) -> Self {
        Self {
            position,
            tiles: vec![TileStack::default(); REGION_AREA],
            tile_entities: SmallKeyHashMap::default(),
            events: None,
        }
    }

    pub(crate) fn attached(position: RegionPosition, events: Arc<MapEvents>) -> Self {
        Self {
            events: Some(events),
            ..Self::new(position)
        }
    }

    #[inline]
    pub fn position(&self) -> RegionPosition {
        self.position
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.events.is_some()
    }

    #[inline]
    pub fn global_position(&self, local: TilePosition) -> TilePosition {
        self.position.global_tile_position(local)
    }

    /// All stacks, indexed by `x * REGION_SIZE + z`.
    pub fn tile_stacks(&self) -> &[TileStack] {
        &self.tiles
    }

    pub fn tile_stack(&self, local: TilePosition) -> &TileStack {
        &self.tiles[index(local)]
    }

    /// Number of positions with a ground or interactable tile.
    pub fn num_occupied(&self) -> usize {
        self.tiles.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn set_ground_render_handle(
        &mut self,
        local: TilePosition,
        handle: Option<RenderHandle>,
    ) -> Option<RenderHandle> {
        mem::replace(&mut self.tiles[index(local)].ground_render, handle)
    }

    pub fn set_interactable_render_handle(
        &mut self,
        local: TilePosition,
        handle: Option<RenderHandle>,
    ) -> Option<RenderHandle> {
        mem::replace(&mut self.tiles[index(local)].interactable_render, handle)
    }

    #[inline]
    pub fn ground(&self, local: TilePosition) -> Option<&GroundRef> {
        self.tiles[index(local)].ground.as_ref()
    }

    /// Replaces any existing ground tile, running its removal lifecycle first.
    pub fn place_ground(&mut self, local: TilePosition, tile: GroundRef) {
        let i = index(local);
        if self.tiles[i].ground.is_some() {
            self.remove_ground(local);
        }

        self.tiles[i].ground = Some(tile.clone());
        let global = self.global_position(local);
        tile.on_placed(self, global);
        if let Some(events) = &self.events {
            events.ground_placed(self, global, &tile);
        }
    }

    pub fn remove_ground(&mut self, local: TilePosition) -> Option<GroundRef> {
        let i = index(local);
        let tile = self.tiles[i].ground.clone()?;

        let global = self.global_position(local);
        tile.on_removed(self, global);
        self.tiles[i].ground = None;
        if let Some(events) = &self.events {
            events.ground_removed(self, global, &tile);
        }

        Some(tile)
    }

    #[inline]
    pub fn interactable(&self, local: TilePosition) -> Option<&InteractableRef> {
        self.tiles[index(local)].interactable.as_ref()
    }

    /// Replaces any existing interactable tile, running its removal lifecycle first. Returns the new tile entity, if
    /// the tile created one.
    pub fn place_interactable(&mut self, local: TilePosition, tile: InteractableRef) -> Option<&mut dyn TileEntity> {
        let i = index(local);
        if self.tiles[i].interactable.is_some() {
            self.remove_interactable(local);
        }

        self.tiles[i].interactable = Some(tile.clone());
        let global = self.global_position(local);
        tile.on_placed(self, global);

        let has_entity = match tile.create_tile_entity(self, global) {
            Some(entity) => {
                self.tile_entities.insert(local, entity);
                if let Some(entity) = self.tile_entities.get(&local) {
                    entity.on_placed(self, global);
                }
                true
            }
            None => false,
        };

        if let Some(events) = &self.events {
            events.interactable_placed(self, global, &tile);
        }

        if has_entity {
            self.tile_entity_mut(local)
        } else {
            None
        }
    }

    /// The tile entity's removal hook runs before the tile's.
    pub fn remove_interactable(&mut self, local: TilePosition) -> Option<InteractableRef> {
        let i = index(local);
        let tile = self.tiles[i].interactable.clone()?;

        let global = self.global_position(local);
        if let Some(mut entity) = self.tile_entities.remove(&local) {
            entity.on_removed(self, global);
        }
        tile.on_removed(self, global);
        self.tiles[i].interactable = None;
        if let Some(events) = &self.events {
            events.interactable_removed(self, global, &tile);
        }

        Some(tile)
    }

    pub fn tile_entity(&self, local: TilePosition) -> Option<&dyn TileEntity> {
        self.tile_entities.get(&local).map(|e| e.as_ref())
    }

    pub fn tile_entity_mut(&mut self, local: TilePosition) -> Option<&mut dyn TileEntity> {
        self.tile_entities.get_mut(&local).map(|e| -> &mut dyn TileEntity { e.as_mut() })
    }

    /// Tile entities keyed by local position, in no particular order.
    pub fn tile_entities(&self) -> impl Iterator<Item = (TilePosition, &dyn TileEntity)> {
        self.tile_entities.iter().map(|(p, e)| (*p, e.as_ref()))
    }

    /// Which movement the tiles at `local` allow: the interactable's modes, else everything if there is ground, else
    /// nothing.
    pub fn navigation_modes(&self, local: TilePosition) -> NavigationMode {
        let stack = self.tile_stack(local);
        let global = self.global_position(local);
        match (&stack.interactable, &stack.ground) {
            (Some(interactable), _) => interactable.navigation_modes(self, global),
            (None, Some(_)) => NavigationMode::ALL,
            (None, None) => NavigationMode::NONE,
        }
    }

    /// The interactable's override, else the ground's weight, else [`DEFAULT_NAVIGATION_WEIGHT`].
    pub fn navigation_weight(&self, local: TilePosition) -> u32 {
        let stack = self.tile_stack(local);
        let global = self.global_position(local);
        stack
            .interactable
            .as_ref()
            .and_then(|i| i.navigation_weight_override(self, global))
            .or_else(|| stack.ground.as_ref().map(|g| g.navigation_weight(self, global)))
            .unwrap_or(DEFAULT_NAVIGATION_WEIGHT)
    }

    /// Writes one record per position, x outer and z inner: the ground id, the interactable id, then the tile entity's
    /// payload if there is one. Unseen tiles are added to the registries.
    pub fn export(
        &self,
        writer: &mut dyn Write,
        ground_ids: &mut DynamicRegistry<GroundRef>,
        interactable_ids: &mut DynamicRegistry<InteractableRef>,
    ) -> Result<(), MapError> {
        for local in RegionPosition::local_tile_positions() {
            let stack = self.tile_stack(local);
            write_u16(writer, ground_ids.id_of(stack.ground.as_ref())?)?;
            write_u16(writer, interactable_ids.id_of(stack.interactable.as_ref())?)?;
            if stack.interactable.is_some() {
                if let Some(entity) = self.tile_entity(local) {
                    entity.export(writer)?;
                }
            }
        }
        Ok(())
    }

    /// Reads records written by [`Region::export`], replaying them as placements so every hook and event fires.
    ///
    /// Ids that don't resolve leave the position empty.
    pub fn import(
        &mut self,
        reader: &mut dyn Read,
        ground_ids: &DynamicRegistry<GroundRef>,
        interactable_ids: &DynamicRegistry<InteractableRef>,
    ) -> Result<(), MapError> {
        for local in RegionPosition::local_tile_positions() {
            let ground_id = read_u16(reader)?;
            if let Some(ground) = ground_ids.value(ground_id) {
                self.place_ground(local, ground.clone());
            }

            let interactable_id = read_u16(reader)?;
            if let Some(interactable) = interactable_ids.value(interactable_id) {
                if let Some(entity) = self.place_interactable(local, interactable.clone()) {
                    entity.import(reader)?;
                }
            }
        }
        Ok(())
    }
}

#[inline]
fn index(local: TilePosition) -> usize {
    assert!(is_local(local), "{} is not a local tile position", local);
    local.local_index()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
