use std::path::{Path, PathBuf};

use tower_sandbox_core::{Error, ErrorKind, MapDescriptor, MapId, MapMetadata, WaveIndex};
use tower_sandbox_system_wave_loader::load_waves;

fn descriptor_for(file: &str) -> MapDescriptor {
    let wave_file: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(file);
    MapDescriptor::new(
        MapId::new("forest-01").expect("id is not blank"),
        "Whispering Forest".to_owned(),
        wave_file,
        MapMetadata::default(),
    )
}

#[test]
fn loads_contiguous_waves_from_disk() {
    let waves = load_waves(&descriptor_for("forest-01.csv")).expect("fixture loads");

    assert_eq!(waves.len(), 2);
    let mut expected = Some(WaveIndex::FIRST);
    for wave in &waves {
        assert_eq!(Some(wave.index), expected);
        expected = wave.index.next();
    }
    assert_eq!(waves[1].enemy.as_str(), "orc");
    assert_eq!(waves[1].count, 3);
}

#[test]
fn missing_wave_file_is_not_found() {
    let error = load_waves(&descriptor_for("absent.csv")).expect_err("file is absent");

    assert_eq!(error.kind(), ErrorKind::NotFound);
    match error {
        Error::WaveFileNotFound { map, path } => {
            assert_eq!(map.as_str(), "forest-01");
            assert!(path.ends_with("absent.csv"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_numeric_count_reports_offending_line() {
    let error = load_waves(&descriptor_for("non-numeric-count.csv")).expect_err("row is invalid");

    assert_eq!(error.kind(), ErrorKind::MalformedData);
    match error {
        Error::MalformedWaveData { path, line, reason } => {
            assert!(path.ends_with("non-numeric-count.csv"));
            assert_eq!(line, 3);
            assert!(reason.contains("count"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
