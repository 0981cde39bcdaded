use std::collections::VecDeque;
use std::fs::File;
use std::path::PathBuf;

use perf_terminal::charts::ChartData;
use perf_terminal::config::AppConfig;
use perf_terminal::heart_rate::parse_hr_csv;
use perf_terminal::ingest::load_bundle;
use perf_terminal::metrics::AnalysisModule;
use perf_terminal::router::{NavEvent, Screen, next_screen};
use perf_terminal::state::{AppState, VideoView};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn fixture_state(config: AppConfig) -> AppState {
    let bundle = load_bundle(&fixture("bundle")).unwrap();
    let hr = parse_hr_csv(File::open(fixture("hr_session.csv")).unwrap()).unwrap();
    AppState::with_data(
        config,
        bundle,
        "fixtures".to_string(),
        hr,
        "hr_session.csv".to_string(),
        VecDeque::new(),
    )
}

#[test]
fn router_cycles_through_every_screen() {
    let mut screen = Screen::Home;
    let mut seen = Vec::new();
    for _ in 0..Screen::ALL.len() {
        screen = next_screen(screen, NavEvent::Next);
        seen.push(screen);
    }
    assert_eq!(screen, Screen::Home);
    assert_eq!(seen.len(), Screen::ALL.len());
    assert_eq!(next_screen(Screen::Home, NavEvent::Prev), Screen::Comparison);
    assert_eq!(next_screen(Screen::HeartRate, NavEvent::Back), Screen::Home);
}

#[test]
fn initial_state_shows_first_player_with_full_matches() {
    let state = fixture_state(AppConfig::default());
    assert_eq!(state.screen, Screen::Home);
    assert_eq!(state.selected_player(), Some("Lina Moreau"));
    let Some(ChartData::Line(chart)) = state.current_chart() else {
        panic!("first menu entry is a line chart");
    };
    assert_eq!(chart.points.len(), 2);

    let summary = state.hr_summary.as_ref().unwrap();
    assert_eq!(summary.max, 180.0);
}

#[test]
fn short_match_toggle_and_module_switch_rerun_views() {
    let mut state = fixture_state(AppConfig::default());
    state.toggle_short_matches();
    state.rerun();
    let Some(ChartData::Line(chart)) = state.current_chart() else {
        panic!("expected a line chart");
    };
    assert_eq!(chart.points.len(), 3);

    assert_eq!(state.module, AnalysisModule::Feminine);
    state.toggle_module();
    state.rerun();
    assert_eq!(state.module, AnalysisModule::Masculine);
    assert_eq!(state.chart_menu().len(), 12);
}

#[test]
fn video_screen_surfaces_mismatch_as_warning() {
    let mut state = fixture_state(AppConfig::default());
    state.navigate(NavEvent::Open(Screen::Video));
    assert_eq!(state.video_view, VideoView::HeatMap);
    assert_eq!(state.video_sessions(), vec!["J1 vs Lyon", "J2 vs Nantes"]);
    assert_eq!(state.heatmap.as_ref().unwrap().deposited, 3);

    state.select_next();
    state.rerun();
    let view = state.heatmap.as_ref().unwrap();
    assert_eq!(view.deposited, 0);
    assert_eq!(view.warnings.len(), 1);
}

#[test]
fn export_writes_report_into_export_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        export_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let mut state = fixture_state(config);
    state.navigate(NavEvent::Open(Screen::Gps));
    state.toggle_mark();
    state.cycle_chart(true);
    state.toggle_mark();
    state.export_report();

    let path = state.export.path.clone().expect("export path recorded");
    assert!(path.starts_with(dir.path()));
    assert!(path.is_file());
    assert!(state.export.message.contains("2 charts"));
    assert!(state.logs.iter().any(|l| l.starts_with("[INFO] Report written")));
}
