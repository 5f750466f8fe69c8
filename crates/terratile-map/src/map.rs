//! The region directory.
//!
//! # Directory Format
//!
//! ```text
//! <dir>/ground.registry          dynamic registry blob for ground tiles
//! <dir>/interactable.registry    dynamic registry blob for interactable tiles
//! <dir>/regions/<X>,<Z>.region   one file per region, see `Region::export`
//! ```

use crate::{
    GroundRef, InteractableRef, MapError, MapEvents, MapObserver, Region, RegionPosition, Subscription, TileEntity,
    TilePosition, TileRegistries, TileStack,
};

use terratile_core::{DynamicRegistry, SmallKeyHashMap, SmallKeyHashSet};

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const REGIONS_DIR: &str = "regions";
pub const REGION_EXTENSION: &str = "region";
pub const GROUND_REGISTRY_FILE: &str = "ground.registry";
pub const INTERACTABLE_REGISTRY_FILE: &str = "interactable.registry";

/// All regions of one world.
///
/// Regions are created lazily when a tile is placed in them and are kept in creation order, which is also export order.
/// Mutations are published to [`MapEvents`] synchronously.
pub struct Map {
    regions: SmallKeyHashMap<RegionPosition, Region>,
    /// Same set as `regions`, in creation order.
    order: Vec<RegionPosition>,
    events: Arc<MapEvents>,
}

impl Default for Map {
    fn default() -> Self {
        Self {
            regions: SmallKeyHashMap::default(),
            order: Vec::new(),
            events: Arc::new(MapEvents::new()),
        }
    }
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &Arc<MapEvents> {
        &self.events
    }

    pub fn subscribe(&self, observer: Arc<dyn MapObserver>) -> Subscription {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.events.unsubscribe(subscription)
    }

    pub fn region_count(&self) -> usize {
        self.order.len()
    }

    pub fn has_region(&self, position: RegionPosition) -> bool {
        self.regions.contains_key(&position)
    }

    pub fn region(&self, position: RegionPosition) -> Option<&Region> {
        self.regions.get(&position)
    }

    pub fn region_mut(&mut self, position: RegionPosition) -> Option<&mut Region> {
        self.regions.get_mut(&position)
    }

    /// Regions in creation order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.order.iter().filter_map(move |p| self.regions.get(p))
    }

    /// Creates the region if needed. A new region is stored before `on_region_created` fires.
    pub fn get_or_create_region(&mut self, position: RegionPosition) -> &mut Region {
        let events = &self.events;
        let order = &mut self.order;
        let mut created = false;
        let region = self.regions.entry(position).or_insert_with(|| {
            created = true;
            order.push(position);
            Region::attached(position, events.clone())
        });
        if created {
            log::debug!("Created region {}", position);
            events.region_created(region);
        }
        region
    }

    /// Returns false, with a warning, if there is no such region.
    pub fn destroy_region(&mut self, position: RegionPosition) -> bool {
        match self.regions.remove(&position) {
            Some(region) => {
                self.order.retain(|p| *p != position);
                log::debug!("Destroyed region {}", position);
                self.events.region_destroyed(&region);
                true
            }
            None => {
                log::warn!("Tried to destroy region {}, which does not exist", position);
                false
            }
        }
    }

    /// Destroys every region, oldest first.
    pub fn clear(&mut self) {
        for position in self.order.clone() {
            self.destroy_region(position);
        }
    }

    pub fn try_get_tile_stack(&self, global: TilePosition) -> Option<&TileStack> {
        self.try_get_tile_stack_with_region(global).map(|(_, stack)| stack)
    }

    pub fn try_get_tile_stack_with_region(&self, global: TilePosition) -> Option<(&Region, &TileStack)> {
        let (region_position, local) = locate(global);
        let region = self.regions.get(&region_position)?;
        Some((region, region.tile_stack(local)))
    }

    pub fn place_ground(&mut self, global: TilePosition, tile: GroundRef) {
        let (region_position, local) = locate(global);
        self.get_or_create_region(region_position).place_ground(local, tile);
    }

    pub fn ground(&self, global: TilePosition) -> Option<&GroundRef> {
        self.try_get_tile_stack(global)?.ground.as_ref()
    }

    /// Does not create a region.
    pub fn remove_ground(&mut self, global: TilePosition) -> Option<GroundRef> {
        let (region_position, local) = locate(global);
        self.regions.get_mut(&region_position)?.remove_ground(local)
    }

    pub fn place_interactable(&mut self, global: TilePosition, tile: InteractableRef) -> Option<&mut dyn TileEntity> {
        let (region_position, local) = locate(global);
        self.get_or_create_region(region_position)
            .place_interactable(local, tile)
    }

    pub fn interactable(&self, global: TilePosition) -> Option<&InteractableRef> {
        self.try_get_tile_stack(global)?.interactable.as_ref()
    }

    /// Does not create a region.
    pub fn remove_interactable(&mut self, global: TilePosition) -> Option<InteractableRef> {
        let (region_position, local) = locate(global);
        self.regions.get_mut(&region_position)?.remove_interactable(local)
    }

    pub fn tile_entity(&self, global: TilePosition) -> Option<&dyn TileEntity> {
        let (region_position, local) = locate(global);
        self.regions.get(&region_position)?.tile_entity(local)
    }

    pub fn tile_entity_mut(&mut self, global: TilePosition) -> Option<&mut dyn TileEntity> {
        let (region_position, local) = locate(global);
        self.regions.get_mut(&region_position)?.tile_entity_mut(local)
    }

    /// Writes every region into `directory`, which must already exist.
    ///
    /// Dynamic registries are seeded from `registries`, so ids follow registry order. Region files left over from an
    /// earlier export of regions that no longer exist are deleted.
    pub fn export(&self, directory: &Path, registries: &TileRegistries) -> Result<(), MapError> {
        if !directory.is_dir() {
            log::warn!("Tried to export a map into {}, which is not a directory", directory.display());
            return Ok(());
        }

        let regions_dir = directory.join(REGIONS_DIR);
        fs::create_dir_all(&regions_dir)?;

        let mut ground_ids = DynamicRegistry::from_registry(&registries.ground)?;
        let mut interactable_ids = DynamicRegistry::from_registry(&registries.interactable)?;

        let mut written = SmallKeyHashSet::default();
        for region in self.regions() {
            let path = region_file_path(&regions_dir, region.position());
            let mut writer = BufWriter::new(File::create(&path)?);
            region.export(&mut writer, &mut ground_ids, &mut interactable_ids)?;
            writer.flush()?;
            written.insert(path);
        }

        for (path, _) in list_region_files(&regions_dir)? {
            if !written.contains(&path) {
                log::debug!("Removing stale region file {}", path.display());
                fs::remove_file(&path)?;
            }
        }

        // Written last because exporting regions may assign ids to unregistered tiles.
        write_registry_file(&directory.join(GROUND_REGISTRY_FILE), &ground_ids)?;
        write_registry_file(&directory.join(INTERACTABLE_REGISTRY_FILE), &interactable_ids)?;

        log::debug!(
            "Exported {} regions to {} ({} ground, {} interactable ids)",
            self.region_count(),
            directory.display(),
            ground_ids.len(),
            interactable_ids.len()
        );
        self.events.map_exported(directory);

        Ok(())
    }

    /// Replaces every region with the ones stored in `directory`.
    ///
    /// Regions are replayed as placements, so hooks and events fire as if the tiles were placed by hand. Registry
    /// blobs that are missing fall back to the order of `registries`. Files whose names don't parse as `X,Z.region`
    /// are skipped, and a region file that fails to read part way keeps the tiles read so far. Only directory-level
    /// failures are errors.
    pub fn import(&mut self, directory: &Path, registries: &TileRegistries) -> Result<(), MapError> {
        if !directory.is_dir() {
            log::warn!("Tried to import a map from {}, which is not a directory", directory.display());
            return Ok(());
        }

        self.clear();

        let ground_ids = read_registry_file(&directory.join(GROUND_REGISTRY_FILE), &registries.ground)?;
        let interactable_ids =
            read_registry_file(&directory.join(INTERACTABLE_REGISTRY_FILE), &registries.interactable)?;

        let regions_dir = directory.join(REGIONS_DIR);
        if regions_dir.is_dir() {
            for (path, position) in list_region_files(&regions_dir)? {
                let file = match File::open(&path) {
                    Ok(file) => file,
                    Err(e) => {
                        log::warn!("Skipping region file {}: {}", path.display(), e);
                        continue;
                    }
                };
                let mut reader = BufReader::new(file);
                let region = self.get_or_create_region(position);
                if let Err(e) = region.import(&mut reader, &ground_ids, &interactable_ids) {
                    // Tiles read before the failure stay placed.
                    log::warn!("Region file {} is corrupt, keeping what was read: {}", path.display(), e);
                }
            }
        }

        log::debug!("Imported {} regions from {}", self.region_count(), directory.display());
        self.events.map_imported(directory);

        Ok(())
    }
}

#[inline]
fn locate(global: TilePosition) -> (RegionPosition, TilePosition) {
    let region_position = global.parent_region_position();
    (region_position, region_position.local_tile_position(global))
}

fn region_file_path(regions_dir: &Path, position: RegionPosition) -> PathBuf {
    regions_dir.join(format!("{}.{}", position, REGION_EXTENSION))
}

/// Region files sorted by file name. Files with the right extension but a malformed name are skipped with a warning.
fn list_region_files(regions_dir: &Path) -> Result<Vec<(PathBuf, RegionPosition)>, MapError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(regions_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(REGION_EXTENSION) {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        match stem.parse::<RegionPosition>() {
            Ok(position) => files.push((path, position)),
            Err(e) => log::warn!("Skipping region file {}: {}", path.display(), e),
        }
    }
    files.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn write_registry_file<V>(path: &Path, ids: &DynamicRegistry<V>) -> Result<(), MapError>
where
    V: terratile_core::RegistryEntry<String> + Clone,
{
    let mut writer = BufWriter::new(File::create(path)?);
    ids.export(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn read_registry_file<V>(
    path: &Path,
    registry: &terratile_core::Registry<V>,
) -> Result<DynamicRegistry<V>, MapError>
where
    V: terratile_core::RegistryEntry<String> + Clone,
{
    if !path.is_file() {
        log::debug!("No registry at {}; using registry order", path.display());
        return Ok(DynamicRegistry::from_registry(registry)?);
    }
    let mut reader = BufReader::new(File::open(path)?);
    Ok(DynamicRegistry::import(&mut reader, registry)?)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
