use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use tower_sandbox_core::{AdjustedWaveRecord, EnemyKind, WaveIndex};
use tower_sandbox_system_wave_schedule::{Config, Spawn, WaveSchedule};

fn wave(index: u32, enemy: &str, count: u32, interval_millis: u64) -> AdjustedWaveRecord {
    AdjustedWaveRecord {
        index: WaveIndex::new(index).expect("non-zero wave"),
        enemy: EnemyKind::new(enemy).expect("non-empty enemy"),
        count,
        spawn_interval: Duration::from_millis(interval_millis),
        health: None,
        speed: None,
        special: None,
        tags: Vec::new(),
    }
}

fn forest_waves() -> Vec<AdjustedWaveRecord> {
    vec![
        wave(1, "goblin", 5, 2000),
        AdjustedWaveRecord {
            special: EnemyKind::new("warlord"),
            ..wave(2, "orc", 3, 1500)
        },
    ]
}

#[test]
fn emits_one_spawn_per_interval() {
    let mut schedule = WaveSchedule::new(forest_waves(), Config::default());
    assert!(schedule.start_next_wave());

    let mut spawns = Vec::new();
    schedule.handle(Duration::ZERO, &mut spawns);
    assert_eq!(spawns.len(), 1, "first enemy spawns immediately");

    schedule.handle(Duration::from_millis(1999), &mut spawns);
    assert_eq!(spawns.len(), 1, "no spawn before a full interval");

    schedule.handle(Duration::from_secs(10), &mut spawns);
    assert_eq!(spawns.len(), 5, "large deltas release every due enemy");

    let offsets: Vec<Duration> = spawns.iter().map(|spawn| spawn.offset).collect();
    assert_eq!(
        offsets,
        [0, 2, 4, 6, 8].map(Duration::from_secs),
        "enemies spawn on the interval grid"
    );
    assert!(!schedule.wave_in_progress(), "wave ends after its last enemy");
}

#[test]
fn special_spawns_one_interval_after_regular_enemies() {
    let mut schedule = WaveSchedule::new(forest_waves(), Config::default());
    let mut spawns = Vec::new();
    assert!(schedule.start_next_wave());
    schedule.handle(Duration::from_secs(60), &mut spawns);
    spawns.clear();

    assert!(schedule.start_next_wave());
    assert_eq!(schedule.current_wave(), WaveIndex::new(2));
    schedule.handle(Duration::from_secs(60), &mut spawns);

    assert_eq!(spawns.len(), 4);
    let special = spawns.last().expect("special spawned");
    assert!(special.special);
    assert_eq!(special.enemy.as_str(), "warlord");
    assert_eq!(special.offset, Duration::from_millis(4500));
    assert!(spawns[..3].iter().all(|spawn| spawn.enemy.as_str() == "orc"));
}

#[test]
fn spawn_delay_postpones_every_wave() {
    let mut schedule =
        WaveSchedule::new(forest_waves(), Config::new(Duration::from_secs(3), false));
    let mut spawns = Vec::new();
    assert!(schedule.start_next_wave());

    schedule.handle(Duration::from_millis(2999), &mut spawns);
    assert!(spawns.is_empty(), "delay holds back the first spawn");

    schedule.handle(Duration::from_millis(1), &mut spawns);
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].offset, Duration::from_secs(3));
}

#[test]
fn cannot_start_while_a_wave_is_spawning() {
    let mut schedule = WaveSchedule::new(forest_waves(), Config::default());
    assert!(schedule.start_next_wave());
    assert!(!schedule.start_next_wave(), "second start must be refused");
    assert_eq!(schedule.current_wave(), Some(WaveIndex::FIRST));
}

#[test]
fn finishes_after_the_last_wave() {
    let mut schedule = WaveSchedule::new(forest_waves(), Config::default());
    let mut spawns = Vec::new();
    assert_eq!(schedule.total_waves(), 2);
    assert_eq!(schedule.remaining_waves(), Some(2));

    assert!(schedule.start_next_wave());
    assert_eq!(schedule.remaining_waves(), Some(2));
    schedule.handle(Duration::from_secs(60), &mut spawns);
    assert_eq!(schedule.remaining_waves(), Some(1));
    assert!(!schedule.is_finished());

    assert!(schedule.start_next_wave());
    schedule.handle(Duration::from_secs(60), &mut spawns);
    assert!(schedule.is_finished());
    assert!(!schedule.start_next_wave(), "no wave left to start");
    assert_eq!(spawns.len(), 5 + 4);

    schedule.reset();
    assert!(!schedule.is_finished());
    assert!(schedule.start_next_wave());
    assert_eq!(schedule.current_wave(), Some(WaveIndex::FIRST));
}

#[test]
fn looping_schedule_restarts_at_first_wave() {
    let mut schedule = WaveSchedule::new(forest_waves(), Config::new(Duration::ZERO, true));
    let mut spawns = Vec::new();
    assert_eq!(schedule.remaining_waves(), None);

    for expected in [1, 2, 1, 2] {
        assert!(schedule.start_next_wave());
        assert_eq!(schedule.current_wave(), WaveIndex::new(expected));
        schedule.handle(Duration::from_secs(60), &mut spawns);
    }
    assert!(!schedule.is_finished());
}

#[test]
fn empty_schedule_never_starts() {
    let mut schedule = WaveSchedule::new(Vec::new(), Config::new(Duration::ZERO, true));
    assert!(!schedule.start_next_wave());
    assert!(!schedule.wave_in_progress());
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    let first = replay(Duration::from_millis(250));
    let second = replay(Duration::from_millis(250));
    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.len(), 9);

    let coarse = replay(Duration::from_secs(7));
    assert_eq!(
        fingerprint(&first),
        fingerprint(&coarse),
        "spawn offsets must not depend on tick size"
    );
}

fn replay(tick: Duration) -> Vec<Spawn> {
    let mut schedule = WaveSchedule::new(forest_waves(), Config::new(Duration::from_millis(500), false));
    let mut log = Vec::new();
    while schedule.start_next_wave() {
        while schedule.wave_in_progress() {
            schedule.handle(tick, &mut log);
        }
    }
    log
}

fn fingerprint(spawns: &[Spawn]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for spawn in spawns {
        spawn.wave.hash(&mut hasher);
        spawn.enemy.hash(&mut hasher);
        spawn.ordinal.hash(&mut hasher);
        spawn.offset.hash(&mut hasher);
        spawn.special.hash(&mut hasher);
    }
    hasher.finish()
}
