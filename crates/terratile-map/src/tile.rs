//! Tile types, tile entities and the per-position [`TileStack`].
//!
//! Tile types are stateless behavior objects shared through `Arc`s. Two references name the same tile type iff they
//! point at the same allocation; see [`same_tile`]. Per-position state lives in [`TileEntity`]s, created by an
//! interactable tile when it is placed.

use crate::{Region, TilePosition};

use terratile_core::{Registry, RegistryEntry};

use std::any::Any;
use std::fmt;
use std::io::{self, Read, Write};
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::sync::Arc;

/// Traversal weight of a tile that doesn't declare one.
pub const DEFAULT_NAVIGATION_WEIGHT: u32 = 10;

/// Behavior shared by ground and interactable tiles.
///
/// Hooks receive the region the tile is in and the tile's global position.
pub trait Tile: Send + Sync {
    /// Unique within the tile's registry. Also the name written to registry blobs.
    fn registry_name(&self) -> &str;

    fn on_placed(&self, _region: &Region, _position: TilePosition) {}

    fn on_removed(&self, _region: &Region, _position: TilePosition) {}
}

pub trait GroundTile: Tile {
    /// Cost multiplier for walking over this tile.
    fn navigation_weight(&self, _region: &Region, _position: TilePosition) -> u32 {
        DEFAULT_NAVIGATION_WEIGHT
    }
}

pub trait InteractableTile: Tile {
    fn navigation_modes(&self, _region: &Region, _position: TilePosition) -> NavigationMode {
        NavigationMode::ALL
    }

    /// Replaces the ground tile's weight under this tile, if `Some`.
    fn navigation_weight_override(&self, _region: &Region, _position: TilePosition) -> Option<u32> {
        None
    }

    /// Called once per placement. Tiles without per-position state return `None`.
    fn create_tile_entity(&self, _region: &Region, _position: TilePosition) -> Option<Box<dyn TileEntity>> {
        None
    }
}

pub type GroundRef = Arc<dyn GroundTile>;
pub type InteractableRef = Arc<dyn InteractableTile>;

impl RegistryEntry<String> for dyn GroundTile {
    fn registry_key(&self) -> String {
        self.registry_name().to_owned()
    }
}

impl RegistryEntry<String> for dyn InteractableTile {
    fn registry_key(&self) -> String {
        self.registry_name().to_owned()
    }
}

/// True if `a` and `b` are the same tile type.
///
/// Only the data pointers are compared. Vtable pointers for one type may differ between codegen units.
#[inline]
pub fn same_tile<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

fn same_optional_tile<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_tile(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// The static tile registries, injected wherever tiles are serialized.
#[derive(Clone, Default)]
pub struct TileRegistries {
    pub ground: Registry<GroundRef>,
    pub interactable: Registry<InteractableRef>,
}

impl TileRegistries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ground(&self, name: &str) -> Option<&GroundRef> {
        self.ground.get(&name.to_owned())
    }

    pub fn interactable(&self, name: &str) -> Option<&InteractableRef> {
        self.interactable.get(&name.to_owned())
    }
}

/// Per-position state of a placed interactable tile, like the contents of a container.
pub trait TileEntity: Any + Send + Sync {
    /// Copies state from `source`, which is usually another instance of the same type.
    fn import_values(&mut self, source: &dyn TileEntity);

    /// A detached copy of this entity for the tile at `position`.
    fn duplicate(&self, region: &Region, position: TilePosition) -> Box<dyn TileEntity>;

    /// Runs once the entity is stored, so `region.tile_entity` already finds it.
    fn on_placed(&self, _region: &Region, _position: TilePosition) {}

    fn on_removed(&mut self, _region: &Region, _position: TilePosition) {}

    fn export(&self, writer: &mut dyn Write) -> io::Result<()>;

    fn import(&mut self, reader: &mut dyn Read) -> io::Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'a> dyn TileEntity + 'a {
    pub fn downcast_ref<T: TileEntity>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: TileEntity>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

/// Which kinds of movement a tile allows.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct NavigationMode(u8);

impl NavigationMode {
    pub const NONE: Self = Self(0);
    pub const WALK: Self = Self(1);
    pub const FLY: Self = Self(1 << 1);
    pub const PHASE: Self = Self(1 << 2);
    pub const ALL: Self = Self(Self::WALK.0 | Self::FLY.0 | Self::PHASE.0);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if any mode is shared.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NavigationMode {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NavigationMode {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NavigationMode {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names = [(Self::WALK, "WALK"), (Self::FLY, "FLY"), (Self::PHASE, "PHASE")];
        let mut first = true;
        for (mode, name) in names {
            if self.contains(mode) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A handle owned by whatever renders the tile. Opaque to the map.
pub type RenderHandle = Arc<dyn Any + Send + Sync>;

/// Everything at one tile position.
///
/// Equality compares tile identity only; render handles are ignored.
#[derive(Clone, Default)]
pub struct TileStack {
    pub ground: Option<GroundRef>,
    pub interactable: Option<InteractableRef>,
    pub ground_render: Option<RenderHandle>,
    pub interactable_render: Option<RenderHandle>,
}

impl TileStack {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ground.is_none() && self.interactable.is_none()
    }
}

impl PartialEq for TileStack {
    fn eq(&self, other: &Self) -> bool {
        same_optional_tile(&self.ground, &other.ground) && same_optional_tile(&self.interactable, &other.interactable)
    }
}

impl Eq for TileStack {}

impl fmt::Debug for TileStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileStack")
            .field("ground", &self.ground.as_ref().map(|t| t.registry_name()))
            .field("interactable", &self.interactable.as_ref().map(|t| t.registry_name()))
            .finish()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
