use std::path::PathBuf;

use perf_terminal::charts::ChartKind;
use perf_terminal::heatmap::HeatmapPipeline;
use perf_terminal::ingest::load_bundle;
use perf_terminal::metrics::{AnalysisModule, MIN_MATCH_DURATION_S, MetricId};
use perf_terminal::report::{ReportPlan, ReportRequest, export_report};

fn fixture_dir(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn exports_paginated_workbook_with_heat_map() {
    let bundle = load_bundle(&fixture_dir("bundle")).unwrap();
    let row = bundle.video_for("Lina Moreau", "J1 vs Lyon").unwrap();
    let view = HeatmapPipeline::default().run(&row.x, &row.y).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("rapport.xlsx");
    let request = ReportRequest {
        bundle: &bundle,
        module: AnalysisModule::Masculine,
        player: "Lina Moreau",
        charts: vec![
            ChartKind::Metric(MetricId::Distance),
            ChartKind::StackedBands,
            ChartKind::Metric(MetricId::Distance20),
        ],
        min_duration_s: Some(MIN_MATCH_DURATION_S),
        heatmap: Some(("J1 vs Lyon", &view)),
    };
    let summary = export_report(&request, &path).expect("report should be written");

    assert_eq!(summary.charts, 3);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.data_rows, 2);
    assert!(summary.skipped.is_empty());

    let bytes = std::fs::read(&summary.path).unwrap();
    assert!(bytes.starts_with(b"PK"), "xlsx is a zip container");
}

#[test]
fn charts_without_sessions_are_skipped() {
    let bundle = load_bundle(&fixture_dir("bundle")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");
    let request = ReportRequest {
        bundle: &bundle,
        module: AnalysisModule::Feminine,
        player: "Nobody",
        charts: vec![
            ChartKind::Metric(MetricId::Distance),
            ChartKind::StackedBands,
        ],
        min_duration_s: None,
        heatmap: None,
    };
    let summary = export_report(&request, &path).unwrap();
    assert_eq!(summary.charts, 0);
    assert_eq!(summary.pages, 0);
    assert_eq!(
        summary.skipped,
        vec!["Distance".to_string(), "Diagramme empilé".to_string()]
    );
    assert!(path.is_file());
}

#[test]
fn plan_fills_left_slot_first() {
    let plan = ReportPlan::paginate(3);
    assert_eq!(plan.chart_count(), 3);
    let second = &plan.pages[1];
    assert_eq!(second.number, 2);
    assert_eq!(second.charts.len(), 1);
    assert_eq!(second.charts[0].anchor, plan.pages[0].charts[0].anchor);
    assert!(plan.pages[0].charts[1].anchor.col > plan.pages[0].charts[0].anchor.col);
}
