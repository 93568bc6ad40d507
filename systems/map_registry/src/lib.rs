#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Registry of map descriptors loaded from a directory of JSON files.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tower_sandbox_core::{
    Error, MapDescriptor, MapId, MapMetadata, MapSize, Result, TileCoord,
};
use tracing::{debug, info};

const MAP_FILE_EXTENSION: &str = "json";

/// Read-only collection of every map found in a directory.
///
/// The registry is constructed explicitly and handed to consumers; nothing is
/// cached behind the caller's back.
#[derive(Clone, Debug)]
pub struct MapRegistry {
    maps: Vec<MapDescriptor>,
}

impl MapRegistry {
    /// Loads every `*.json` map file stored directly inside `directory`.
    ///
    /// Files are read in file-name order, which is also the order reported by
    /// [`MapRegistry::list_maps`]. Files with other extensions are ignored.
    pub fn load(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(Error::MapDirectoryNotFound {
                path: directory.to_path_buf(),
            });
        }

        let files = map_files(directory)?;
        if files.is_empty() {
            return Err(Error::NoMapsFound {
                path: directory.to_path_buf(),
            });
        }

        let mut maps = Vec::with_capacity(files.len());
        let mut seen = HashSet::with_capacity(files.len());
        for file in files {
            debug!(path = %file.display(), "loading map file");
            let contents = fs::read_to_string(&file).map_err(|source| Error::Io {
                path: file.clone(),
                source,
            })?;
            let descriptor = parse_map(&contents, &file)?;
            if !seen.insert(descriptor.id().clone()) {
                return Err(Error::MalformedMapData {
                    path: file,
                    reason: format!("duplicate map id `{}`", descriptor.id()),
                });
            }
            maps.push(descriptor);
        }

        info!(
            directory = %directory.display(),
            maps = maps.len(),
            "map registry loaded"
        );
        Ok(Self { maps })
    }

    /// Every loaded map in load order.
    #[must_use]
    pub fn list_maps(&self) -> &[MapDescriptor] {
        &self.maps
    }

    /// Looks up the map with the provided identifier.
    pub fn get_map(&self, id: &str) -> Result<&MapDescriptor> {
        self.maps
            .iter()
            .find(|descriptor| descriptor.id().as_str() == id.trim())
            .ok_or_else(|| Error::MapNotFound { id: id.to_owned() })
    }
}

fn map_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let io_error = |source| Error::Io {
        path: directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_map = path.is_file()
            && path
                .extension()
                .is_some_and(|extension| extension == MAP_FILE_EXTENSION);
        if is_map {
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-map entry");
        }
    }
    files.sort();
    Ok(files)
}

/// On-disk layout of a map file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapFile {
    id: String,
    name: String,
    waves: PathBuf,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tileset: Option<String>,
    #[serde(default)]
    size: Option<MapSize>,
    #[serde(default)]
    path: Vec<TileCoord>,
    #[serde(default)]
    spawn_delay: f64,
}

fn parse_map(contents: &str, file: &Path) -> Result<MapDescriptor> {
    let malformed = |reason: String| Error::MalformedMapData {
        path: file.to_path_buf(),
        reason,
    };

    let raw: MapFile =
        serde_json::from_str(contents).map_err(|error| malformed(error.to_string()))?;

    let id = MapId::new(&raw.id).ok_or_else(|| malformed("`id` must not be empty".to_owned()))?;
    let name = raw.name.trim();
    if name.is_empty() {
        return Err(malformed("`name` must not be empty".to_owned()));
    }
    if raw.waves.as_os_str().is_empty() {
        return Err(malformed("`waves` must reference a wave file".to_owned()));
    }
    if let Some(size) = raw.size {
        if size.columns == 0 || size.rows == 0 {
            return Err(malformed(format!(
                "`size` must be at least 1x1, found {}x{}",
                size.columns, size.rows
            )));
        }
        if let Some(outside) = raw.path.iter().find(|waypoint| !waypoint.is_within(size)) {
            return Err(malformed(format!(
                "waypoint [{}, {}] lies outside the {}x{} grid",
                outside.column(),
                outside.row(),
                size.columns,
                size.rows
            )));
        }
    }
    let spawn_delay = Duration::try_from_secs_f64(raw.spawn_delay).map_err(|_| {
        malformed(format!(
            "`spawn_delay` must be a non-negative number of seconds, found {}",
            raw.spawn_delay
        ))
    })?;

    let base = file.parent().unwrap_or_else(|| Path::new("."));
    let metadata = MapMetadata {
        description: raw.description.trim().to_owned(),
        tileset: raw.tileset.filter(|tileset| !tileset.trim().is_empty()),
        size: raw.size,
        path: raw.path,
        spawn_delay,
    };

    Ok(MapDescriptor::new(
        id,
        name.to_owned(),
        base.join(raw.waves),
        metadata,
    ))
}
