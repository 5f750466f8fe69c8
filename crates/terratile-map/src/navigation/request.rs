use crate::{MapNavigator, NavigationMode, Path, TilePosition};

use terratile_core::Request;

use std::fmt;

/// A queued path search. See [`MapNavigator::request_path`].
pub struct PathRequest {
    pub origin: TilePosition,
    pub destination: TilePosition,
    pub mode: NavigationMode,
    on_complete: Box<dyn FnOnce(Path) + Send>,
}

impl PathRequest {
    pub fn new(
        origin: TilePosition,
        destination: TilePosition,
        mode: NavigationMode,
        on_complete: impl FnOnce(Path) + Send + 'static,
    ) -> Self {
        Self {
            origin,
            destination,
            mode,
            on_complete: Box::new(on_complete),
        }
    }
}

impl Request<MapNavigator> for PathRequest {
    /// The map lock is released before `on_complete` runs.
    fn run(self, navigator: &MapNavigator) {
        let path = navigator.get_path(self.origin, self.destination, self.mode);
        (self.on_complete)(path);
    }
}

impl fmt::Debug for PathRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathRequest")
            .field("origin", &self.origin)
            .field("destination", &self.destination)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
