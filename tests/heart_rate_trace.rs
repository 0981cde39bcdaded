use std::fs::File;
use std::path::PathBuf;

use perf_terminal::error::HrError;
use perf_terminal::heart_rate::parse_hr_csv;

fn fixture(name: &str) -> File {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    File::open(path).expect("fixture file should be readable")
}

#[test]
fn parses_monitor_export_fixture() {
    let trace = parse_hr_csv(fixture("hr_session.csv")).expect("fixture should parse");
    // The `--` reading at 10:08 is dropped.
    assert_eq!(trace.samples.len(), 10);
    assert_eq!(trace.span(), Some((0.0, 10.0)));
    assert_eq!(trace.samples[4].bpm, 180.0);
}

#[test]
fn whole_trace_summary_and_recovery() {
    let trace = parse_hr_csv(fixture("hr_session.csv")).unwrap();
    let (start, end) = trace.span().unwrap();
    let summary = trace.summarize(start, end).unwrap();
    assert_eq!(summary.max, 180.0);
    assert_eq!(summary.min, 110.0);
    assert!((summary.mean - 143.0).abs() < 1e-9);
    assert_eq!(summary.max_at, 4.0);

    let recovery: Vec<(f64, f64)> = summary
        .recovery
        .iter()
        .map(|r| (r.offset_min, r.delta))
        .collect();
    assert_eq!(
        recovery,
        vec![(1.0, 20.0), (2.0, 30.0), (3.0, 40.0), (5.0, 60.0)]
    );
}

#[test]
fn narrowed_window_changes_stats() {
    let trace = parse_hr_csv(fixture("hr_session.csv")).unwrap();
    let summary = trace.summarize(3.0, 6.0).unwrap();
    assert_eq!(summary.min, 150.0);
    assert!((summary.mean - 165.0).abs() < 1e-9);

    let err = trace.summarize(6.0, 3.0).unwrap_err();
    assert!(matches!(err, HrError::InvalidWindow { .. }));
    let err = trace.summarize(20.0, 30.0).unwrap_err();
    assert!(matches!(err, HrError::EmptyTrace));
}

#[test]
fn missing_columns_are_named() {
    let raw = "a\nb\nTimestamp,Pulse\n10:00:00,120\n";
    let err = parse_hr_csv(raw.as_bytes()).unwrap_err();
    match err {
        HrError::MissingColumns { missing } => {
            assert_eq!(missing, vec!["Time".to_string(), "HR (bpm)".to_string()]);
        }
        other => panic!("unexpected error {other}"),
    }
}
