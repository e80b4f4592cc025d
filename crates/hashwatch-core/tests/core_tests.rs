use hashwatch_core::{
    AlertSink, Baseline, BaselineEntry, BaselineStore, ChangeKind, ContentDigest, Fingerprint,
    LoadedBaseline, MemoryBaselineStore, MonitorConfig, ParsedBaseline, ScanEvent, encode_line,
    parse_baseline,
};
use std::path::{Path, PathBuf};

fn digest(byte: u8) -> Fingerprint {
    Fingerprint::Digest(ContentDigest::new(vec![byte; 64]))
}

#[test]
fn test_fingerprint_hex_length() {
    let fingerprint = digest(0xab);
    let hex = fingerprint.to_string();

    // 512-bit digest renders as 128 hex characters
    assert_eq!(hex.len(), 128);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(hex.parse::<Fingerprint>().unwrap(), fingerprint);
}

#[test]
fn test_digest_never_confused_with_marker() {
    // A digest whose hex happens to be short is still a digest
    let fingerprint: Fingerprint = "ee".parse().unwrap();
    assert!(!fingerprint.is_unreadable());
    assert_ne!(fingerprint, Fingerprint::Unreadable);
}

#[test]
fn test_baseline_persistence_round_trip() {
    let mut baseline = Baseline::new();
    baseline.insert("./a.txt", digest(1));
    baseline.insert("./docs/b.md", digest(2));
    baseline.insert_seen("./locked.bin", Fingerprint::Unreadable);

    let contents: Vec<u8> = baseline
        .entries()
        .flat_map(|entry| encode_line(&entry.path, &entry.fingerprint))
        .collect();

    let ParsedBaseline::Entries(entries) = parse_baseline(&contents) else {
        panic!("expected entries");
    };
    let reloaded: Baseline = entries.into_iter().collect();

    assert_eq!(reloaded.len(), 3);
    for (path, record) in baseline.iter() {
        assert_eq!(reloaded.fingerprint(path), Some(&record.fingerprint));
    }
    // The seen flag is transient and always resets on load
    assert!(reloaded.iter().all(|(_, record)| !record.seen_this_round));
}

#[test]
fn test_store_through_trait_object() {
    let mut store = MemoryBaselineStore::new();
    {
        let dyn_store: &mut dyn BaselineStore = &mut store;
        dyn_store.reset().unwrap();
        dyn_store
            .append(&BaselineEntry::new("./a.txt", digest(7)))
            .unwrap();
    }

    match store.load().unwrap() {
        LoadedBaseline::Parsed(ParsedBaseline::Entries(entries)) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].path, PathBuf::from("./a.txt"));
        }
        other => panic!("unexpected load result: {other:?}"),
    }
}

#[test]
fn test_corrupt_store_is_not_partially_loaded() {
    let mut contents = encode_line(Path::new("./a.txt"), &digest(1));
    contents.extend_from_slice(b"garbage\n");
    contents.extend(encode_line(Path::new("./b.txt"), &digest(2)));
    let mut store = MemoryBaselineStore::with_contents(contents);

    assert!(matches!(
        store.load().unwrap(),
        LoadedBaseline::Parsed(ParsedBaseline::Corrupt { line: 2, .. })
    ));
}

#[test]
fn test_alert_sink_collects_events() {
    let mut events: Vec<ScanEvent> = Vec::new();
    let sink: &mut dyn AlertSink = &mut events;
    sink.emit(&ScanEvent::now("./a.txt", ChangeKind::Created))
        .unwrap();
    sink.emit(&ScanEvent::now("./a.txt", ChangeKind::Deleted))
        .unwrap();

    let kinds: Vec<ChangeKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ChangeKind::Created, ChangeKind::Deleted]);
}

#[test]
fn test_alert_line_shape() {
    let event = ScanEvent::now("./secret.txt", ChangeKind::Deleted);
    let line = event.alert_line();

    assert!(line.starts_with('['));
    assert!(line.contains("]:\t./secret.txt has been deleted."));
    assert!(line.ends_with(".\n"));
}

#[test]
fn test_config_serde_round_trip() {
    let config = MonitorConfig::builder()
        .root("/data")
        .max_rounds(Some(3u64))
        .build()
        .unwrap();

    let text = toml::to_string(&config).unwrap();
    let parsed = MonitorConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, config);
}
