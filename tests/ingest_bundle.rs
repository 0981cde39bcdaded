use std::path::PathBuf;

use perf_terminal::charts::{self, ChartData, ChartKind};
use perf_terminal::error::{HeatmapError, IngestError};
use perf_terminal::heatmap::HeatmapPipeline;
use perf_terminal::ingest::{Position, load_bundle};
use perf_terminal::metrics::{AnalysisModule, MIN_MATCH_DURATION_S, MetricId};
use perf_terminal::positions::RawField;

fn fixture_dir(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn loads_every_sheet_of_the_bundle() {
    let bundle = load_bundle(&fixture_dir("bundle")).expect("fixture bundle should load");
    // The row without a player is dropped.
    assert_eq!(bundle.tracking.len(), 4);
    assert_eq!(bundle.video.len(), 3);
    assert_eq!(bundle.players(), vec!["Lina Moreau", "Emma Garnier"]);
    assert_eq!(bundle.position_of("Lina Moreau"), Some(Position::AT));
    assert_eq!(bundle.position_of("Emma Garnier"), Some(Position::DC));
    assert_eq!(bundle.position_of("Nobody"), None);
    assert_eq!(
        bundle.sessions_for("Lina Moreau"),
        vec!["J1 vs Lyon", "Amical vs Caen", "J2 vs Nantes"]
    );
    assert_eq!(
        bundle.constants.reference("Distance", Position::AT),
        Some(10500.0)
    );
    assert_eq!(
        bundle.constants.reference("Ballons touchés", Position::GB),
        Some(20.0)
    );
}

#[test]
fn missing_sheets_are_all_reported() {
    let err = load_bundle(&fixture_dir("partial_bundle")).unwrap_err();
    match err {
        IngestError::MissingSheets { missing } => {
            assert_eq!(missing, vec!["Vidéo".to_string(), "Constante".to_string()]);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn video_cells_feed_the_heat_map() {
    let bundle = load_bundle(&fixture_dir("bundle")).unwrap();
    let pipeline = HeatmapPipeline::default();

    let row = bundle.video_for("Lina Moreau", "J1 vs Lyon").unwrap();
    assert_eq!(row.x, RawField::Text("52.5;60.0;70.0".to_string()));
    assert_eq!(row.touches, Some(45.0));
    let view = pipeline.run(&row.x, &row.y).unwrap();
    assert_eq!(view.deposited, 3);
    assert!(view.warnings.is_empty());

    let broken = bundle.video_for("Lina Moreau", "J2 vs Nantes").unwrap();
    let view = pipeline.run(&broken.x, &broken.y).unwrap();
    assert_eq!(view.deposited, 0);
    assert!(matches!(
        view.warnings.as_slice(),
        [HeatmapError::CoordinateMismatch { x_len: 3, y_len: 2 }]
    ));

    let empty = bundle.video_for("Emma Garnier", "J1 vs Lyon").unwrap();
    assert_eq!(empty.x, RawField::Empty);
}

#[test]
fn charts_hide_short_matches_unless_asked() {
    let bundle = load_bundle(&fixture_dir("bundle")).unwrap();

    let full = charts::metric_chart(
        &bundle,
        "Lina Moreau",
        MetricId::Distance,
        Some(MIN_MATCH_DURATION_S),
    );
    assert_eq!(full.values(), vec![10000.0, 11000.0]);
    assert_eq!(full.reference, Some(10500.0));
    let trend = full.trend.unwrap();
    assert!((trend.slope - 1000.0).abs() < 1e-9);

    let everything = charts::metric_chart(&bundle, "Lina Moreau", MetricId::Distance, None);
    assert_eq!(everything.points.len(), 3);
    assert_eq!(everything.points[1].0, "Amical vs Caen");

    // Dist>20kmh is stored in km.
    let fast = charts::metric_chart(&bundle, "Lina Moreau", MetricId::Distance20, None);
    assert_eq!(fast.values(), vec![500.0, 200.0, 600.0]);
    assert_eq!(fast.reference, Some(600.0));
}

#[test]
fn stacked_bands_carry_the_positional_reference() {
    let bundle = load_bundle(&fixture_dir("bundle")).unwrap();
    let chart = charts::build_chart(
        &bundle,
        AnalysisModule::Masculine,
        "Lina Moreau",
        ChartKind::StackedBands,
        Some(MIN_MATCH_DURATION_S),
    );
    let Some(ChartData::Stacked(bands)) = chart else {
        panic!("expected stacked bands");
    };
    assert_eq!(bands.sessions.len(), 2);
    assert_eq!(bands.sessions[0].1, [5.0, 10.0, 85.0]);
    let (_, reference) = bands.reference.unwrap();
    assert_eq!(reference, [6.0, 10.0, 84.0]);
}

#[test]
fn touches_chart_uses_video_sheet() {
    let bundle = load_bundle(&fixture_dir("bundle")).unwrap();
    let chart = charts::touches_chart(&bundle, "Lina Moreau");
    assert_eq!(chart.values(), vec![45.0, 38.0]);
    assert_eq!(chart.reference, Some(50.0));
}
