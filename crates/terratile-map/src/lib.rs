//! The terratile map data model.
//!
//! # Regions
//!
//! The world is an unbounded grid of tiles, partitioned into square [`Region`]s of [`REGION_SIZE`] tiles per side.
//! Regions are allocated lazily when the first tile is placed in them. Global [`TilePosition`]s resolve to their
//! owning [`RegionPosition`] by floor division, so negative coordinates land in the correct region.
//!
//! # Tiles
//!
//! Every position holds a [`TileStack`]: an optional ground tile and an optional interactable tile. Tile types are
//! stateless, shared behavior objects. Interactable tiles may attach a stateful [`TileEntity`] to the position they are
//! placed on.
//!
//! # Serialization
//!
//! Tiles are written as compact `u16` ids assigned by a [`DynamicRegistry`](terratile_core::DynamicRegistry) for the
//! duration of one export. The registry's names are written next to the data so that an import can resolve ids back
//! to tile types, even if the static [`TileRegistries`] were reordered in between.
//!
//! # Navigation
//!
//! [`MapNavigator`] runs A* over a shared map, serving [`PathRequest`]s queued from any thread. Returned [`Path`]s
//! watch the map and flag themselves dirty when a tile on their remaining route changes.

mod blueprint;
mod coordinates;
mod error;
mod events;
mod map;
mod navigation;
mod region;
mod tile;

#[cfg(test)]
mod test_tiles;

pub use blueprint::*;
pub use coordinates::*;
pub use error::*;
pub use events::*;
pub use map::*;
pub use navigation::*;
pub use region::*;
pub use tile::*;
