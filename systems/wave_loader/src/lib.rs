#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Parser for the tabular wave definition file attached to every map.
//!
//! A wave file is CSV with a header row. The columns are, in order:
//!
//! | column           | required | meaning                                   |
//! |------------------|----------|-------------------------------------------|
//! | `wave`           | yes      | one-based wave index, contiguous          |
//! | `enemy_type`     | yes      | enemy spawned by the wave                 |
//! | `count`          | yes      | number of enemies, at least one           |
//! | `spawn_interval` | yes      | seconds between two spawns                |
//! | `base_health`    | no       | hit points of each enemy                  |
//! | `base_speed`     | no       | movement speed of each enemy              |
//! | `special`        | no       | extra enemy appended to the wave          |
//!
//! Optional columns may be omitted entirely or left empty per row.

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tower_sandbox_core::{EnemyKind, Error, MapDescriptor, Result, WaveIndex, WaveRecord};
use tracing::{debug, warn};

/// Columns every wave file must declare in its header.
pub const REQUIRED_COLUMNS: [&str; 4] = ["wave", "enemy_type", "count", "spawn_interval"];
/// Columns a wave file may declare in addition to [`REQUIRED_COLUMNS`].
pub const OPTIONAL_COLUMNS: [&str; 3] = ["base_health", "base_speed", "special"];

const HEADER_LINE: u64 = 1;

/// Loads the waves referenced by `descriptor`.
///
/// The file handle lives only for the duration of the call.
pub fn load_waves(descriptor: &MapDescriptor) -> Result<Vec<WaveRecord>> {
    let path = descriptor.wave_file();
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::WaveFileNotFound {
            map: descriptor.id().clone(),
            path: path.to_path_buf(),
        },
        _ => Error::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    debug!(map = %descriptor.id(), path = %path.display(), "loading wave file");
    let waves = parse_waves(file, path)?;
    debug!(map = %descriptor.id(), waves = waves.len(), "wave file parsed");
    Ok(waves)
}

/// Parses wave records from any CSV source.
///
/// `source` only labels errors. Every row is validated eagerly; the first
/// violation aborts parsing and no partial sequence is returned.
pub fn parse_waves(reader: impl Read, source: &Path) -> Result<Vec<WaveRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|error| csv_error(error, source, HEADER_LINE))?
        .clone();
    check_headers(&headers, source)?;

    let mut waves: Vec<WaveRecord> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|error| csv_error(error, source, HEADER_LINE))?;
        let line = record.position().map_or(HEADER_LINE, csv::Position::line);
        let row: WaveRow = record
            .deserialize(Some(&headers))
            .map_err(|error| {
                malformed(source, line, describe_row_error(&error, &headers))
            })?;

        let expected = waves
            .last()
            .map_or(Some(WaveIndex::FIRST), |previous| previous.index.next());
        let wave = row.into_record(expected, source, line)?;
        waves.push(wave);
    }

    if waves.is_empty() {
        return Err(malformed(source, HEADER_LINE, "no waves defined".to_owned()));
    }
    Ok(waves)
}

/// Writes `records` in the wave file layout, header included.
pub fn write_waves(records: &[WaveRecord], writer: impl Write) -> io::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(WaveRowOut {
            wave: record.index.get(),
            enemy_type: record.enemy.as_str(),
            count: record.count,
            spawn_interval: record.spawn_interval.as_secs_f64(),
            base_health: record.health,
            base_speed: record.speed,
            special: record.special.as_ref().map(EnemyKind::as_str),
        })?;
    }
    writer.flush()
}

fn check_headers(headers: &csv::StringRecord, source: &Path) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        return Err(malformed(
            source,
            HEADER_LINE,
            format!("missing required column(s): {}", missing.join(", ")),
        ));
    }

    for header in headers.iter() {
        if !REQUIRED_COLUMNS.contains(&header) && !OPTIONAL_COLUMNS.contains(&header) {
            warn!(path = %source.display(), column = header, "ignoring unknown wave column");
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct WaveRow {
    wave: u32,
    enemy_type: String,
    count: u32,
    spawn_interval: f64,
    #[serde(default)]
    base_health: Option<f64>,
    #[serde(default)]
    base_speed: Option<f64>,
    #[serde(default)]
    special: Option<String>,
}

impl WaveRow {
    fn into_record(
        self,
        expected: Option<WaveIndex>,
        source: &Path,
        line: u64,
    ) -> Result<WaveRecord> {
        let reject = |reason: String| malformed(source, line, reason);

        let index = WaveIndex::new(self.wave)
            .filter(|index| Some(*index) == expected)
            .ok_or_else(|| match expected {
                Some(expected) => reject(format!(
                    "wave index {} breaks the sequence, expected {expected}",
                    self.wave
                )),
                None => reject(format!("wave index {} cannot follow the last wave", self.wave)),
            })?;
        let enemy = EnemyKind::new(&self.enemy_type)
            .ok_or_else(|| reject("`enemy_type` must not be empty".to_owned()))?;
        if self.count == 0 {
            return Err(reject("`count` must be at least 1".to_owned()));
        }
        let spawn_interval = Duration::try_from_secs_f64(self.spawn_interval).map_err(|_| {
            reject(format!(
                "`spawn_interval` must be a non-negative number of seconds, found {}",
                self.spawn_interval
            ))
        })?;
        let health = positive(self.base_health, "base_health").map_err(reject)?;
        let speed = positive(self.base_speed, "base_speed").map_err(reject)?;

        Ok(WaveRecord {
            index,
            enemy,
            count: self.count,
            spawn_interval,
            health,
            speed,
            special: self.special.as_deref().and_then(EnemyKind::new),
        })
    }
}

#[derive(Serialize)]
struct WaveRowOut<'a> {
    wave: u32,
    enemy_type: &'a str,
    count: u32,
    spawn_interval: f64,
    base_health: Option<f64>,
    base_speed: Option<f64>,
    special: Option<&'a str>,
}

fn positive(value: Option<f64>, column: &str) -> std::result::Result<Option<f64>, String> {
    match value {
        Some(value) if !value.is_finite() || value <= 0.0 => {
            Err(format!("`{column}` must be a positive number, found {value}"))
        }
        other => Ok(other),
    }
}

fn describe_row_error(error: &csv::Error, headers: &csv::StringRecord) -> String {
    let csv::ErrorKind::Deserialize { err, .. } = error.kind() else {
        return describe_csv_error(error.kind());
    };
    let column = err
        .field()
        .and_then(|field| usize::try_from(field).ok())
        .and_then(|field| headers.get(field));
    match column {
        Some(column) => format!("column `{column}`: {}", err.kind()),
        None => err.kind().to_string(),
    }
}

fn csv_error(error: csv::Error, source: &Path, fallback_line: u64) -> Error {
    let line = error
        .position()
        .map_or(fallback_line, csv::Position::line);
    match error.into_kind() {
        csv::ErrorKind::Io(io_error) => Error::Io {
            path: source.to_path_buf(),
            source: io_error,
        },
        kind => malformed(source, line, describe_csv_error(&kind)),
    }
}

fn describe_csv_error(kind: &csv::ErrorKind) -> String {
    match kind {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("row has {len} field(s), expected {expected_len}"),
        csv::ErrorKind::Utf8 { .. } => "row is not valid UTF-8".to_owned(),
        other => format!("{other:?}"),
    }
}

fn malformed(source: &Path, line: u64, reason: String) -> Error {
    Error::MalformedWaveData {
        path: source.to_path_buf(),
        line,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_sandbox_core::ErrorKind;

    fn parse(contents: &str) -> Result<Vec<WaveRecord>> {
        parse_waves(contents.as_bytes(), Path::new("inline.csv"))
    }

    fn reason_of(error: Error) -> (u64, String) {
        match error {
            Error::MalformedWaveData { line, reason, .. } => (line, reason),
            other => panic!("expected malformed wave data, got {other:?}"),
        }
    }

    #[test]
    fn parses_required_columns_only() {
        let waves = parse("wave,enemy_type,count,spawn_interval\n1,goblin,5,2.0\n2,orc,3,1.5\n")
            .expect("valid file parses");

        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0].index, WaveIndex::FIRST);
        assert_eq!(waves[0].enemy.as_str(), "goblin");
        assert_eq!(waves[0].count, 5);
        assert_eq!(waves[0].spawn_interval, Duration::from_secs(2));
        assert_eq!(waves[0].health, None);
        assert_eq!(waves[1].spawn_interval, Duration::from_millis(1500));
    }

    #[test]
    fn parses_optional_columns_and_blank_cells() {
        let waves = parse(
            "wave, enemy_type, count, spawn_interval, base_health, base_speed, special\n\
             1, grunt, 6, 1.2, 40, 1.0,\n\
             2, tank, 2, 2.5, , 0.6, warlord\n",
        )
        .expect("valid file parses");

        assert_eq!(waves[0].health, Some(40.0));
        assert_eq!(waves[0].special, None);
        assert_eq!(waves[1].health, None);
        assert_eq!(waves[1].speed, Some(0.6));
        assert_eq!(waves[1].special.as_ref().map(EnemyKind::as_str), Some("warlord"));
    }

    #[test]
    fn non_numeric_count_is_malformed() {
        let error = parse("wave,enemy_type,count,spawn_interval\n1,goblin,five,2.0\n")
            .expect_err("count must be numeric");
        assert_eq!(error.kind(), ErrorKind::MalformedData);
        let (line, reason) = reason_of(error);
        assert_eq!(line, 2);
        assert!(reason.contains("count"), "{reason}");
    }

    #[test]
    fn missing_required_column_is_malformed() {
        let error = parse("wave,enemy_type,spawn_interval\n1,goblin,2.0\n")
            .expect_err("count column is required");
        let (line, reason) = reason_of(error);
        assert_eq!(line, 1);
        assert!(reason.contains("count"), "{reason}");
    }

    #[test]
    fn rejects_gaps_duplicates_and_wrong_start() {
        let header = "wave,enemy_type,count,spawn_interval\n";
        for body in [
            "2,goblin,5,2.0\n",
            "1,goblin,5,2.0\n3,orc,3,1.5\n",
            "1,goblin,5,2.0\n1,orc,3,1.5\n",
            "1,goblin,5,2.0\n2,orc,3,1.5\n1,troll,1,1.0\n",
        ] {
            let error = parse(&format!("{header}{body}")).expect_err("sequence must be rejected");
            let (_, reason) = reason_of(error);
            assert!(reason.contains("breaks the sequence"), "{reason}");
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        let header = "wave,enemy_type,count,spawn_interval,base_health,base_speed\n";
        for body in [
            "1,goblin,0,2.0,,\n",
            "1,goblin,-3,2.0,,\n",
            "1,goblin,5,-1.0,,\n",
            "1,goblin,5,2.0,0,\n",
            "1,goblin,5,2.0,,-0.5\n",
            "1,,5,2.0,,\n",
        ] {
            let error = parse(&format!("{header}{body}")).expect_err("row must be rejected");
            assert_eq!(error.kind(), ErrorKind::MalformedData, "{body}");
        }
    }

    #[test]
    fn rejects_ragged_rows_and_empty_files() {
        let ragged = parse("wave,enemy_type,count,spawn_interval\n1,goblin,5\n");
        assert!(matches!(ragged, Err(Error::MalformedWaveData { .. })));

        let empty = parse("wave,enemy_type,count,spawn_interval\n");
        let (line, reason) = reason_of(empty.expect_err("no rows"));
        assert_eq!(line, 1);
        assert_eq!(reason, "no waves defined");
    }

    #[test]
    fn written_waves_parse_back_unchanged() {
        let waves = parse(
            "wave,enemy_type,count,spawn_interval,base_health,base_speed,special\n\
             1,grunt,6,1.25,40.5,1.1,\n\
             2,runner,4,0.75,,1.6,\n\
             3,tank,2,2.5,120,0.6,warlord\n",
        )
        .expect("valid file parses");

        let mut buffer = Vec::new();
        write_waves(&waves, &mut buffer).expect("writing to memory succeeds");
        let text = String::from_utf8(buffer).expect("csv output is utf-8");
        assert!(text.starts_with(
            "wave,enemy_type,count,spawn_interval,base_health,base_speed,special\n"
        ));

        assert_eq!(parse(&text).expect("exported file parses"), waves);
    }
}
