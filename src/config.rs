use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub map: MapConfig,
    pub navigation: NavigationConfig,
}

impl Config {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = std::fs::File::open(path)?;

        Ok(ron::de::from_reader(reader)?)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::Error),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Where [`TileWorld::save`](crate::TileWorld::save) and [`TileWorld::load`](crate::TileWorld::load) keep the map.
    pub directory: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("map"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub enum DriverMode {
    /// The owner ticks navigation by calling [`TileWorld::tick`](crate::TileWorld::tick).
    Pump,
    /// A worker thread ticks every `tick_interval_ms`.
    Background,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    pub driver: DriverMode,
    pub tick_interval_ms: u64,
    /// Only used when `budgeted`.
    pub threads: u32,
    pub target_tick_time_us: u32,
    pub initial_request_time_estimate_us: u32,
    pub budgeted: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            driver: DriverMode::Pump,
            tick_interval_ms: 16,
            threads: 1,
            target_tick_time_us: 4_000,
            initial_request_time_estimate_us: 500,
            budgeted: false,
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
