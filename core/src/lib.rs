#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tower Sandbox toolkit.
//!
//! This crate defines the data model that connects the loading systems and
//! the adapters. The map registry produces [`MapDescriptor`] values, the wave
//! loader turns a descriptor's wave file into [`WaveRecord`] values, and the
//! difficulty adjuster derives [`AdjustedWaveRecord`] views from them without
//! touching the source records. Every fallible operation reports an [`Error`].

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by every Tower Sandbox system.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unique identifier of a map within a registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MapId(String);

impl MapId {
    /// Creates a map identifier, trimming surrounding whitespace.
    ///
    /// Returns `None` when the trimmed value is empty.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MapId {
    type Error = EmptyIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(EmptyIdentifier)
    }
}

impl From<MapId> for String {
    fn from(value: MapId) -> Self {
        value.0
    }
}

/// Name of an enemy type spawned by a wave.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnemyKind(String);

impl EnemyKind {
    /// Creates an enemy kind, trimming surrounding whitespace.
    ///
    /// Returns `None` when the trimmed value is empty.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Borrows the enemy kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EnemyKind {
    type Error = EmptyIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(EmptyIdentifier)
    }
}

impl From<EnemyKind> for String {
    fn from(value: EnemyKind) -> Self {
        value.0
    }
}

/// Rejection produced when an identifier is empty after trimming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

/// One-based position of a wave within a map's wave file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Index assigned to the first wave of every map.
    pub const FIRST: Self = Self(1);

    /// Creates a wave index, rejecting zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the wave following this one, if representable.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl fmt::Display for WaveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a single map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u64 {
        u64::from(self.column().abs_diff(other.column()))
            + u64::from(self.row().abs_diff(other.row()))
    }

    /// Whether the coordinate lies on a grid of the provided size.
    #[must_use]
    pub const fn is_within(&self, size: MapSize) -> bool {
        self.column < size.columns && self.row < size.rows
    }
}

impl From<(u32, u32)> for TileCoord {
    fn from((column, row): (u32, u32)) -> Self {
        Self::new(column, row)
    }
}

impl From<TileCoord> for (u32, u32) {
    fn from(value: TileCoord) -> Self {
        (value.column, value.row)
    }
}

/// Dimensions of a map measured in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapSize {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
}

/// Optional descriptive data attached to a map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapMetadata {
    /// Free-form description shown next to the map name in menus.
    pub description: String,
    /// Visual theme used by the map.
    pub tileset: Option<String>,
    /// Dimensions of the playable grid.
    pub size: Option<MapSize>,
    /// Ordered waypoints enemies follow from the spawn to the goal.
    pub path: Vec<TileCoord>,
    /// Delay applied before the first spawn of every wave.
    pub spawn_delay: Duration,
}

impl MapMetadata {
    /// Total number of tiles walked along the waypoint path.
    #[must_use]
    pub fn path_length(&self) -> u64 {
        self.path
            .windows(2)
            .map(|pair| pair[0].manhattan_distance(pair[1]))
            .fold(0, u64::saturating_add)
    }
}

/// Immutable description of a playable map and its wave file.
#[derive(Clone, Debug, PartialEq)]
pub struct MapDescriptor {
    id: MapId,
    name: String,
    wave_file: PathBuf,
    metadata: MapMetadata,
}

impl MapDescriptor {
    /// Creates a map descriptor.
    #[must_use]
    pub fn new(id: MapId, name: String, wave_file: PathBuf, metadata: MapMetadata) -> Self {
        Self {
            id,
            name,
            wave_file,
            metadata,
        }
    }

    /// Identifier that is unique within the registry.
    #[must_use]
    pub fn id(&self) -> &MapId {
        &self.id
    }

    /// Human-readable map name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved location of the map's wave definition file.
    #[must_use]
    pub fn wave_file(&self) -> &Path {
        &self.wave_file
    }

    /// Optional descriptive data.
    #[must_use]
    pub fn metadata(&self) -> &MapMetadata {
        &self.metadata
    }
}

/// A single wave exactly as it was read from a wave definition file.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveRecord {
    /// Position of the wave within the map.
    pub index: WaveIndex,
    /// Enemy type spawned by the wave.
    pub enemy: EnemyKind,
    /// Number of regular enemies spawned. Always at least one.
    pub count: u32,
    /// Time between two consecutive spawns.
    pub spawn_interval: Duration,
    /// Hit points of each enemy, when the file provides them.
    pub health: Option<f64>,
    /// Movement speed of each enemy, when the file provides it.
    pub speed: Option<f64>,
    /// Extra enemy appended to the wave.
    pub special: Option<EnemyKind>,
}

/// Scalar that scales base wave values to produce a harder or easier variant.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Difficulty(f64);

impl Difficulty {
    /// Lowest accepted difficulty.
    pub const MIN: f64 = 0.1;
    /// Highest accepted difficulty.
    pub const MAX: f64 = 10.0;
    /// Difficulty under which the default adjuster leaves every wave unchanged.
    pub const BASELINE: Self = Self(1.0);

    /// Validates a raw difficulty value.
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidDifficulty { value })
        }
    }

    /// Retrieves the raw scalar.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::BASELINE
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Derived view of a [`WaveRecord`] after a difficulty was applied.
#[derive(Clone, Debug, PartialEq)]
pub struct AdjustedWaveRecord {
    /// Position of the wave within the map.
    pub index: WaveIndex,
    /// Enemy type spawned by the wave.
    pub enemy: EnemyKind,
    /// Number of regular enemies after scaling.
    pub count: u32,
    /// Time between two consecutive spawns after scaling.
    pub spawn_interval: Duration,
    /// Scaled hit points, present when the base record had them.
    pub health: Option<f64>,
    /// Scaled movement speed, present when the base record had it.
    pub speed: Option<f64>,
    /// Extra enemy appended to the wave.
    pub special: Option<EnemyKind>,
    /// Human-readable notes describing how the wave differs from its base.
    pub tags: Vec<String>,
}

/// Broad classification of [`Error`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A map, map directory or wave file does not exist.
    NotFound,
    /// Loaded data violates its schema.
    MalformedData,
    /// A caller-supplied parameter is outside its accepted range.
    InvalidParameter,
    /// The operating system refused a read or write of a file or the console.
    Io,
}

/// Errors reported by the Tower Sandbox systems.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured map directory does not exist.
    #[error("map directory {} does not exist", .path.display())]
    MapDirectoryNotFound {
        /// Directory that was searched.
        path: PathBuf,
    },
    /// The map directory exists but contains no map files.
    #[error("no map files found in {}", .path.display())]
    NoMapsFound {
        /// Directory that was searched.
        path: PathBuf,
    },
    /// No map with the requested identifier was loaded.
    #[error("map `{id}` does not exist")]
    MapNotFound {
        /// Identifier that was requested.
        id: String,
    },
    /// A map file is missing required fields or has fields of the wrong type.
    #[error("malformed map data in {}: {reason}", .path.display())]
    MalformedMapData {
        /// Map file that failed validation.
        path: PathBuf,
        /// Description of the violation.
        reason: String,
    },
    /// The wave file referenced by a map does not exist.
    #[error("wave file {} for map `{map}` does not exist", .path.display())]
    WaveFileNotFound {
        /// Map that references the file.
        map: MapId,
        /// Resolved location of the missing file.
        path: PathBuf,
    },
    /// A wave file row violates the wave schema.
    #[error("malformed wave data in {} (line {line}): {reason}", .path.display())]
    MalformedWaveData {
        /// Wave file that failed validation.
        path: PathBuf,
        /// One-based line number of the offending row.
        line: u64,
        /// Description of the violation.
        reason: String,
    },
    /// The difficulty parameter is outside the accepted range.
    #[error(
        "difficulty {value} is outside the accepted range {}..={}",
        Difficulty::MIN,
        Difficulty::MAX
    )]
    InvalidDifficulty {
        /// Rejected value.
        value: f64,
    },
    /// A scaling policy would not be monotonic in difficulty.
    #[error("invalid scaling policy: {reason}")]
    InvalidScalingPolicy {
        /// Description of the violation.
        reason: String,
    },
    /// Input ended before a map was chosen from the menu.
    #[error("map selection aborted before a map was chosen")]
    SelectionAborted,
    /// Reading or writing a file failed.
    #[error("failed to access {}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: std::io::Error,
    },
    /// Reading from or writing to the terminal failed.
    #[error("console input or output failed")]
    Console {
        /// Underlying operating system error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MapDirectoryNotFound { .. }
            | Self::MapNotFound { .. }
            | Self::WaveFileNotFound { .. } => ErrorKind::NotFound,
            Self::NoMapsFound { .. }
            | Self::MalformedMapData { .. }
            | Self::MalformedWaveData { .. } => ErrorKind::MalformedData,
            Self::InvalidDifficulty { .. }
            | Self::InvalidScalingPolicy { .. }
            | Self::SelectionAborted => ErrorKind::InvalidParameter,
            Self::Io { .. } | Self::Console { .. } => ErrorKind::Io,
        }
    }
}
