use terratile_core::{HeapError, RegistryError};

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("pathfinding: {0}")]
    Heap(#[from] HeapError),
}
