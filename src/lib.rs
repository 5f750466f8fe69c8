//! Terratile: a chunked 2D tile world with background A* pathfinding.
//!
//! The data model and navigation live in [`terratile_map`], reusable containers in [`terratile_core`]. This crate
//! wires them together from a RON [`Config`] into a [`TileWorld`].

mod config;
mod world;

pub use config::*;
pub use world::*;

pub use terratile_core as core;
pub use terratile_map as map;
