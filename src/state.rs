use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::time::Instant;

use crate::charts::{self, ChartData, ChartKind};
use crate::config::AppConfig;
use crate::demo;
use crate::error::HrError;
use crate::heart_rate::{self, HrSummary, HrTrace};
use crate::heatmap::{HeatmapPipeline, HeatmapView};
use crate::ingest::{self, SessionBundle};
use crate::metrics::AnalysisModule;
use crate::positions::RawField;
use crate::report::{self, ReportRequest};
use crate::router::{self, NavEvent, Screen};

const MAX_LOGS: usize = 200;
const HR_STEP_MIN: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoView {
    HeatMap,
    Touches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrEdge {
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct ExportState {
    pub path: Option<PathBuf>,
    pub message: String,
    pub last_updated: Option<Instant>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            path: None,
            message: String::new(),
            last_updated: None,
        }
    }

    pub fn clear_if_done_for(&mut self, now: Instant, keep_secs: u64) {
        let Some(last) = self.last_updated else {
            return;
        };
        if now.duration_since(last).as_secs() >= keep_secs {
            *self = Self::new();
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub config: AppConfig,
    pub bundle: SessionBundle,
    pub source_label: String,
    pub module: AnalysisModule,
    pub players: Vec<String>,
    pub player_selected: usize,
    pub chart_selected: usize,
    pub include_short: bool,
    pub marked: BTreeSet<usize>,
    pub video_view: VideoView,
    pub session_selected: usize,
    pub heatmap: Option<HeatmapView>,
    pub heatmap_error: Option<String>,
    pub hr: HrTrace,
    pub hr_source: String,
    pub hr_window: (f64, f64),
    pub hr_edge: HrEdge,
    pub hr_summary: Option<HrSummary>,
    pub hr_error: Option<String>,
    pub compare: [usize; 2],
    pub compare_focus: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let mut logs = VecDeque::with_capacity(MAX_LOGS);
        let (bundle, source_label) = match &config.data_dir {
            Some(dir) => match ingest::load_bundle(dir) {
                Ok(bundle) => {
                    logs.push_back(format!("[INFO] Loaded {}", dir.display()));
                    (bundle, dir.display().to_string())
                }
                Err(err) => {
                    logs.push_back(format!("[ERROR] {err}"));
                    logs.push_back("[INFO] Falling back to demo data".to_string());
                    (demo::demo_bundle(config.demo_seed), "démo".to_string())
                }
            },
            None => (demo::demo_bundle(config.demo_seed), "démo".to_string()),
        };
        let (hr, hr_source) = match &config.hr_file {
            Some(path) => match std::fs::File::open(path)
                .map_err(HrError::from)
                .and_then(heart_rate::parse_hr_csv)
            {
                Ok(trace) => (trace, path.display().to_string()),
                Err(err) => {
                    logs.push_back(format!("[WARN] Heart-rate file {}: {err}", path.display()));
                    (demo::demo_heart_rate(config.demo_seed), "démo".to_string())
                }
            },
            None => (demo::demo_heart_rate(config.demo_seed), "démo".to_string()),
        };
        Self::with_data(config, bundle, source_label, hr, hr_source, logs)
    }

    pub fn with_data(
        config: AppConfig,
        bundle: SessionBundle,
        source_label: String,
        hr: HrTrace,
        hr_source: String,
        logs: VecDeque<String>,
    ) -> Self {
        let players = bundle.players();
        let hr_window = hr.span().unwrap_or((0.0, 0.0));
        let mut state = Self {
            screen: Screen::Home,
            config,
            bundle,
            source_label,
            module: AnalysisModule::Feminine,
            compare: [0, usize::from(players.len() > 1)],
            players,
            player_selected: 0,
            chart_selected: 0,
            include_short: false,
            marked: BTreeSet::new(),
            video_view: VideoView::HeatMap,
            session_selected: 0,
            heatmap: None,
            heatmap_error: None,
            hr,
            hr_source,
            hr_window,
            hr_edge: HrEdge::Start,
            hr_summary: None,
            hr_error: None,
            compare_focus: 0,
            logs,
            help_overlay: false,
            export: ExportState::new(),
        };
        state.rerun();
        state
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn maybe_clear_export(&mut self, now: Instant) {
        self.export.clear_if_done_for(now, 8);
    }

    /// Recomputes every derived view from the current selections.
    pub fn rerun(&mut self) {
        self.clamp_selection();
        self.refresh_heatmap();
        self.refresh_hr_summary();
    }

    pub fn navigate(&mut self, event: NavEvent) {
        self.screen = router::next_screen(self.screen, event);
    }

    pub fn selected_player(&self) -> Option<&str> {
        self.players.get(self.player_selected).map(String::as_str)
    }

    pub fn min_duration(&self) -> Option<f64> {
        if self.include_short {
            None
        } else {
            Some(self.config.min_duration_s)
        }
    }

    pub fn chart_menu(&self) -> Vec<ChartKind> {
        ChartKind::menu(self.module)
    }

    pub fn selected_chart_kind(&self) -> Option<ChartKind> {
        self.chart_menu().get(self.chart_selected).copied()
    }

    pub fn current_chart(&self) -> Option<ChartData> {
        let player = self.selected_player()?;
        let kind = self.selected_chart_kind()?;
        charts::build_chart(&self.bundle, self.module, player, kind, self.min_duration())
    }

    pub fn select_next(&mut self) {
        let total = self.list_len();
        let slot = self.list_cursor();
        *slot = if total == 0 { 0 } else { (*slot + 1) % total };
    }

    pub fn select_prev(&mut self) {
        let total = self.list_len();
        let slot = self.list_cursor();
        *slot = if total == 0 {
            0
        } else if *slot == 0 {
            total - 1
        } else {
            *slot - 1
        };
    }

    fn list_len(&self) -> usize {
        match self.screen {
            Screen::Video => self.video_sessions().len(),
            _ => self.players.len(),
        }
    }

    fn list_cursor(&mut self) -> &mut usize {
        match self.screen {
            Screen::Video => &mut self.session_selected,
            Screen::Comparison => &mut self.compare[self.compare_focus],
            _ => &mut self.player_selected,
        }
    }

    /// Moves to the next player and resets per-player cursors.
    pub fn cycle_player(&mut self, forward: bool) {
        let total = self.players.len();
        if total == 0 {
            return;
        }
        self.player_selected = if forward {
            (self.player_selected + 1) % total
        } else {
            (self.player_selected + total - 1) % total
        };
        self.session_selected = 0;
    }

    pub fn cycle_chart(&mut self, forward: bool) {
        let total = self.chart_menu().len();
        if total == 0 {
            return;
        }
        self.chart_selected = if forward {
            (self.chart_selected + 1) % total
        } else {
            (self.chart_selected + total - 1) % total
        };
    }

    pub fn toggle_module(&mut self) {
        self.module = self.module.toggle();
        self.chart_selected = 0;
        self.marked.clear();
        self.push_log(format!("[INFO] Module: {}", self.module.label()));
    }

    pub fn toggle_short_matches(&mut self) {
        self.include_short = !self.include_short;
        let msg = if self.include_short {
            "[INFO] Showing matches under the duration cutoff".to_string()
        } else {
            format!(
                "[INFO] Hiding matches under {:.0} s",
                self.config.min_duration_s
            )
        };
        self.push_log(msg);
    }

    pub fn toggle_mark(&mut self) {
        let idx = self.chart_selected;
        if !self.marked.remove(&idx) {
            self.marked.insert(idx);
        }
    }

    pub fn toggle_video_view(&mut self) {
        self.video_view = match self.video_view {
            VideoView::HeatMap => VideoView::Touches,
            VideoView::Touches => VideoView::HeatMap,
        };
    }

    pub fn video_sessions(&self) -> Vec<String> {
        let Some(player) = self.selected_player() else {
            return Vec::new();
        };
        self.bundle
            .video_rows_for(player)
            .into_iter()
            .map(|r| r.session.clone())
            .collect()
    }

    pub fn selected_session(&self) -> Option<String> {
        self.video_sessions().get(self.session_selected).cloned()
    }

    pub fn clamp_selection(&mut self) {
        let players = self.players.len();
        clamp(&mut self.player_selected, players);
        for slot in &mut self.compare {
            clamp(slot, players);
        }
        let sessions = self.video_sessions().len();
        clamp(&mut self.session_selected, sessions);
        let charts = self.chart_menu().len();
        clamp(&mut self.chart_selected, charts);
    }

    pub fn refresh_heatmap(&mut self) {
        self.heatmap = None;
        self.heatmap_error = None;
        let (Some(player), Some(session)) = (self.selected_player(), self.selected_session()) else {
            return;
        };
        let (x, y) = match self.bundle.video_for(player, &session) {
            Some(row) => (row.x.clone(), row.y.clone()),
            None => (RawField::Empty, RawField::Empty),
        };
        match HeatmapPipeline::new(self.config.raster).run(&x, &y) {
            Ok(view) => self.heatmap = Some(view),
            Err(err) => self.heatmap_error = Some(err.to_string()),
        }
    }

    pub fn set_hr_edge(&mut self, edge: HrEdge) {
        self.hr_edge = edge;
    }

    /// Nudges the active window edge, kept inside the trace span.
    pub fn shift_hr_window(&mut self, steps: i32) {
        let Some((lo, hi)) = self.hr.span() else {
            return;
        };
        let delta = steps as f64 * HR_STEP_MIN;
        match self.hr_edge {
            HrEdge::Start => self.hr_window.0 = (self.hr_window.0 + delta).clamp(lo, hi),
            HrEdge::End => self.hr_window.1 = (self.hr_window.1 + delta).clamp(lo, hi),
        }
    }

    pub fn refresh_hr_summary(&mut self) {
        let (start, end) = self.hr_window;
        match self.hr.summarize(start, end) {
            Ok(summary) => {
                self.hr_summary = Some(summary);
                self.hr_error = None;
            }
            Err(err) => {
                self.hr_summary = None;
                self.hr_error = Some(err.to_string());
            }
        }
    }

    pub fn cycle_compare_focus(&mut self) {
        self.compare_focus = (self.compare_focus + 1) % 2;
    }

    pub fn comparison_players(&self) -> [Option<&str>; 2] {
        self.compare
            .map(|idx| self.players.get(idx).map(String::as_str))
    }

    pub fn comparison_charts(&self) -> [Option<ChartData>; 2] {
        let kind = self.selected_chart_kind();
        self.comparison_players().map(|player| {
            charts::build_chart(&self.bundle, self.module, player?, kind?, self.min_duration())
        })
    }

    /// Charts going into the report: the marked ones, or the current one when none are marked.
    pub fn report_charts(&self) -> Vec<ChartKind> {
        let menu = self.chart_menu();
        if self.marked.is_empty() {
            return self.selected_chart_kind().into_iter().collect();
        }
        self.marked
            .iter()
            .filter_map(|idx| menu.get(*idx).copied())
            .collect()
    }

    pub fn export_report(&mut self) {
        let Some(player) = self.selected_player().map(str::to_string) else {
            self.push_log("[WARN] No player selected for export");
            return;
        };
        let session = self.selected_session();
        let heatmap = session.as_deref().zip(self.heatmap.as_ref());
        let request = ReportRequest {
            bundle: &self.bundle,
            module: self.module,
            player: &player,
            charts: self.report_charts(),
            min_duration_s: self.min_duration(),
            heatmap,
        };
        let path = self.config.export_dir.join(report_file_name(&player));
        let result = report::export_report(&request, &path);
        self.export.last_updated = Some(Instant::now());
        match result {
            Ok(summary) => {
                self.export.message = format!(
                    "Report: {} charts on {} pages",
                    summary.charts, summary.pages
                );
                self.export.path = Some(summary.path.clone());
                self.push_log(format!("[INFO] Report written to {}", summary.path.display()));
                for title in summary.skipped {
                    self.push_log(format!("[WARN] No data for chart {title}"));
                }
            }
            Err(err) => {
                self.export.message = "Report failed".to_string();
                self.push_log(format!("[ERROR] Report export failed: {err:#}"));
            }
        }
    }
}

fn clamp(slot: &mut usize, total: usize) {
    if total == 0 {
        *slot = 0;
    } else if *slot >= total {
        *slot = total - 1;
    }
}

pub fn report_file_name(player: &str) -> String {
    let stem: String = player
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("rapport_{stem}.xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_state() -> AppState {
        let config = AppConfig::default();
        let bundle = demo::demo_bundle(config.demo_seed);
        let hr = demo::demo_heart_rate(config.demo_seed);
        AppState::with_data(
            config,
            bundle,
            "démo".to_string(),
            hr,
            "démo".to_string(),
            VecDeque::new(),
        )
    }

    #[test]
    fn logs_are_capped() {
        let mut state = demo_state();
        for i in 0..250 {
            state.push_log(format!("[INFO] {i}"));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] 249"));
    }

    #[test]
    fn rerun_builds_heatmap_for_selected_session() {
        let state = demo_state();
        let view = state.heatmap.as_ref().unwrap();
        assert!(view.deposited > 0);
        assert_eq!(view.raster.max(), 1.0);
    }

    #[test]
    fn list_navigation_follows_screen() {
        let mut state = demo_state();
        state.navigate(NavEvent::Open(Screen::Video));
        state.select_next();
        assert_eq!(state.session_selected, 1);
        assert_eq!(state.player_selected, 0);
        state.navigate(NavEvent::Open(Screen::Comparison));
        state.cycle_compare_focus();
        state.select_prev();
        assert_eq!(state.compare[1], 0);
    }

    #[test]
    fn hr_window_edges_stay_in_span() {
        let mut state = demo_state();
        state.set_hr_edge(HrEdge::Start);
        state.shift_hr_window(-10);
        assert_eq!(state.hr_window.0, 0.0);
        state.set_hr_edge(HrEdge::End);
        state.shift_hr_window(4);
        assert_eq!(state.hr_window.1, 60.0);
    }

    #[test]
    fn reversed_hr_window_reports_error() {
        let mut state = demo_state();
        state.hr_window = (30.0, 10.0);
        state.refresh_hr_summary();
        assert!(state.hr_summary.is_none());
        assert!(state.hr_error.is_some());
    }

    #[test]
    fn report_charts_default_to_current() {
        let mut state = demo_state();
        assert_eq!(state.report_charts().len(), 1);
        state.toggle_mark();
        state.cycle_chart(true);
        state.toggle_mark();
        assert_eq!(state.report_charts().len(), 2);
        state.toggle_module();
        assert!(state.marked.is_empty());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(report_file_name("Inès D."), "rapport_Inès_D_.xlsx");
    }
}
