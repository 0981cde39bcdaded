use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{self, Canvas, Circle, Points, Rectangle};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph,
};

use perf_terminal::charts::{ChartData, MetricChart};
use perf_terminal::config::AppConfig;
use perf_terminal::heatmap::HeatmapView;
use perf_terminal::metrics::StackedBands;
use perf_terminal::pitch::{PitchGeometry, ShapeKind, StrokeStyle};
use perf_terminal::render;
use perf_terminal::router::{NavEvent, Screen};
use perf_terminal::state::{AppState, HrEdge, VideoView};

const HEAT_COLORS: [Color; render::HEAT_LEVELS] = [
    Color::Blue,
    Color::Cyan,
    Color::Yellow,
    Color::LightRed,
    Color::Red,
];
const CANVAS_BLOCK_PX: usize = 9;

struct App {
    state: AppState,
    should_quit: bool,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let state = &mut self.state;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c @ '1'..='5') => {
                if let Some(screen) = Screen::from_hotkey(c) {
                    state.navigate(NavEvent::Open(screen));
                }
            }
            KeyCode::Char('b') | KeyCode::Esc => state.navigate(NavEvent::Back),
            KeyCode::Tab => state.navigate(NavEvent::Next),
            KeyCode::BackTab => state.navigate(NavEvent::Prev),
            KeyCode::Char('j') | KeyCode::Down => state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => state.select_prev(),
            KeyCode::Char('p') => state.cycle_player(true),
            KeyCode::Char('P') => state.cycle_player(false),
            KeyCode::Char('h') | KeyCode::Left => match state.screen {
                Screen::HeartRate => state.shift_hr_window(-1),
                _ => state.cycle_chart(false),
            },
            KeyCode::Char('l') | KeyCode::Right => match state.screen {
                Screen::HeartRate => state.shift_hr_window(1),
                _ => state.cycle_chart(true),
            },
            KeyCode::Char('[') => state.set_hr_edge(HrEdge::Start),
            KeyCode::Char(']') => state.set_hr_edge(HrEdge::End),
            KeyCode::Char('m') => state.toggle_module(),
            KeyCode::Char('s') => state.toggle_short_matches(),
            KeyCode::Char(' ') => state.toggle_mark(),
            KeyCode::Char('v') => state.toggle_video_view(),
            KeyCode::Char('f') => state.cycle_compare_focus(),
            KeyCode::Char('e') => state.export_report(),
            KeyCode::Char('?') => state.help_overlay = !state.help_overlay,
            _ => {}
        }
        // Every interaction recomputes the derived views from scratch.
        self.state.rerun();
    }
}

fn main() -> io::Result<()> {
    let config = AppConfig::load();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(config);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.state.maybe_clear_export(Instant::now());
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Home => render_home(frame, chunks[1], &app.state),
        Screen::Gps => render_gps(frame, chunks[1], &app.state),
        Screen::Video => render_video(frame, chunks[1], &app.state),
        Screen::HeartRate => render_heart_rate(frame, chunks[1], &app.state),
        Screen::Comparison => render_comparison(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let player = state.selected_player().unwrap_or("-");
    let cutoff = if state.include_short {
        "all matches".to_string()
    } else {
        format!(">= {:.0}s", state.config.min_duration_s)
    };
    let line1 = format!(
        "  PERF | {} | {} | {} | {}",
        state.screen.title(),
        state.module.label(),
        player,
        cutoff
    );
    let line2 = format!("  data: {}", state.source_label);
    let line3 = if state.export.message.is_empty() {
        String::new()
    } else {
        format!("  {}", state.export.message)
    };
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Home => "1-5 Screens | Tab Next | j/k Player | m Module | ? Help | q Quit".to_string(),
        Screen::Gps => {
            "j/k Player | h/l Chart | Space Mark | s Short matches | m Module | e Export | Esc Home"
                .to_string()
        }
        Screen::Video => {
            "j/k Session | p/P Player | v Heat map/Touches | e Export | Esc Home".to_string()
        }
        Screen::HeartRate => "[ Start edge | ] End edge | h/l Move edge | Esc Home".to_string(),
        Screen::Comparison => {
            "f Switch side | j/k Player | h/l Chart | s Short matches | Esc Home".to_string()
        }
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut menu = vec![
        "Analyse des performances".to_string(),
        String::new(),
    ];
    for screen in Screen::ALL.iter().skip(1) {
        menu.push(format!("  {}  {}", screen.hotkey(), screen.title()));
    }
    menu.push(String::new());
    menu.push(format!(
        "{} tracking rows, {} video rows, {} indicators",
        state.bundle.tracking.len(),
        state.bundle.video.len(),
        state.bundle.constants.len()
    ));
    let menu = Paragraph::new(menu.join("\n"))
        .block(Block::default().title("Menu").borders(Borders::ALL));
    frame.render_widget(menu, cols[0]);

    render_player_list(frame, cols[1], state, "Joueurs", state.player_selected);
}

fn render_player_list(frame: &mut Frame, area: Rect, state: &AppState, title: &str, selected: usize) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if state.players.is_empty() {
        let empty = Paragraph::new("No players in bundle").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }
    let (start, end) = visible_range(selected, state.players.len(), inner.height as usize);
    let lines: Vec<Line> = (start..end)
        .map(|idx| {
            let name = &state.players[idx];
            let position = state
                .bundle
                .position_of(name)
                .map(|p| p.code())
                .unwrap_or("?");
            let text = format!("{name} ({position})");
            if idx == selected {
                Line::styled(text, Style::default().fg(Color::White).bg(Color::DarkGray))
            } else {
                Line::raw(text)
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_gps(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(20)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(cols[0]);

    render_player_list(frame, left[0], state, "Joueurs", state.player_selected);

    let lines: Vec<Line> = state
        .chart_menu()
        .iter()
        .enumerate()
        .map(|(idx, kind)| {
            let mark = if state.marked.contains(&idx) { "[x]" } else { "[ ]" };
            let text = format!("{mark} {}", kind.title());
            if idx == state.chart_selected {
                Line::styled(text, Style::default().fg(Color::White).bg(Color::DarkGray))
            } else {
                Line::raw(text)
            }
        })
        .collect();
    let menu = Paragraph::new(lines).block(Block::default().title("Graphiques").borders(Borders::ALL));
    frame.render_widget(menu, left[1]);

    render_chart_data(frame, cols[1], state.current_chart(), state);
}

fn render_chart_data(frame: &mut Frame, area: Rect, chart: Option<ChartData>, state: &AppState) {
    match chart {
        Some(ChartData::Line(line)) => render_metric_chart(frame, area, &line, state),
        Some(ChartData::Stacked(bands)) => render_stacked(frame, area, &bands),
        None => {
            let empty = Paragraph::new("No data for this chart")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(empty, area);
        }
    }
}

fn render_metric_chart(frame: &mut Frame, area: Rect, chart: &MetricChart, state: &AppState) {
    if chart.is_empty() {
        let empty = Paragraph::new(format!("{}: no sessions", chart.title))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let points: Vec<(f64, f64)> = chart
        .points
        .iter()
        .enumerate()
        .map(|(i, (_, v))| (i as f64, *v))
        .collect();
    let x_max = (points.len().max(2) - 1) as f64;
    let trend: Vec<(f64, f64)> = chart
        .trend
        .map(|t| vec![(0.0, t.at(0.0)), (x_max, t.at(x_max))])
        .unwrap_or_default();
    let reference: Vec<(f64, f64)> = chart
        .reference
        .map(|r| vec![(0.0, r), (x_max, r)])
        .unwrap_or_default();

    let (lo, hi) = chart.value_range().unwrap_or((0.0, 1.0));
    let pad = ((hi - lo) * 0.1).max(1.0);
    let (y_lo, y_hi) = (lo - pad, hi + pad);

    let mut datasets = vec![
        Dataset::default()
            .name(state.selected_player().unwrap_or("-").to_string())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
    ];
    if !trend.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Tendance")
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Green))
                .data(&trend),
        );
    }
    if !reference.is_empty() {
        datasets.push(
            Dataset::default()
                .name(state.module.reference_label())
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(&reference),
        );
    }

    let first = chart.points.first().map(|(s, _)| s.clone()).unwrap_or_default();
    let last = chart.points.last().map(|(s, _)| s.clone()).unwrap_or_default();
    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .title(chart.title.clone())
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_lo, y_hi])
                .labels(vec![
                    Span::raw(format!("{y_lo:.0}")),
                    Span::raw(format!("{y_hi:.0}")),
                ]),
        );
    frame.render_widget(widget, area);
}

fn render_stacked(frame: &mut Frame, area: Rect, bands: &StackedBands) {
    let band_styles = [
        Style::default().fg(Color::Red),
        Style::default().fg(Color::Yellow),
        Style::default().fg(Color::Blue),
    ];
    let mut rows = bands.sessions.clone();
    rows.extend(bands.reference.clone());

    let mut widget = BarChart::default()
        .block(
            Block::default()
                .title(format!(
                    "Diagramme empilé: {} / {} / {}",
                    bands.labels[0], bands.labels[1], bands.labels[2]
                ))
                .borders(Borders::ALL),
        )
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2)
        .max(100);
    for (session, values) in &rows {
        let bars: Vec<Bar> = values
            .iter()
            .zip(band_styles)
            .map(|(v, style)| Bar::default().value(v.round().max(0.0) as u64).style(style))
            .collect();
        let label: String = session.chars().take(10).collect();
        widget = widget.data(BarGroup::default().label(Line::from(label)).bars(&bars));
    }
    frame.render_widget(widget, area);
}

fn render_video(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(20)])
        .split(area);

    let sessions = state.video_sessions();
    let lines: Vec<Line> = sessions
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            if idx == state.session_selected {
                Line::styled(s.clone(), Style::default().fg(Color::White).bg(Color::DarkGray))
            } else {
                Line::raw(s.clone())
            }
        })
        .collect();
    let title = format!("Sessions: {}", state.selected_player().unwrap_or("-"));
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        cols[0],
    );

    match state.video_view {
        VideoView::Touches => {
            let chart = state
                .selected_player()
                .map(|p| perf_terminal::charts::touches_chart(&state.bundle, p))
                .map(ChartData::Line);
            render_chart_data(frame, cols[1], chart, state);
        }
        VideoView::HeatMap => match (&state.heatmap, &state.heatmap_error) {
            (Some(view), _) => render_heatmap(frame, cols[1], view),
            (None, Some(err)) => {
                let msg = Paragraph::new(format!("Heat map unavailable: {err}"))
                    .style(Style::default().fg(Color::Red))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(msg, cols[1]);
            }
            (None, None) => {
                let msg = Paragraph::new("No video session selected")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(msg, cols[1]);
            }
        },
    }
}

fn render_heatmap(frame: &mut Frame, area: Rect, view: &HeatmapView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let buckets = render::heat_buckets(view, CANVAS_BLOCK_PX);
    let pitch = view.pitch;
    let (min_x, min_y, max_x, max_y) = pitch.bounds();
    let widget = Canvas::default()
        .block(
            Block::default()
                .title(format!("Carte de chaleur ({} positions)", view.deposited))
                .borders(Borders::ALL),
        )
        .marker(Marker::Braille)
        .x_bounds([min_x - 1.0, max_x + 1.0])
        .y_bounds([min_y - 1.0, max_y + 1.0])
        .paint(|ctx| {
            for (level, coords) in buckets.iter().enumerate() {
                if coords.is_empty() {
                    continue;
                }
                ctx.draw(&Points {
                    coords: coords.as_slice(),
                    color: HEAT_COLORS[level],
                });
            }
            ctx.layer();
            draw_pitch_canvas(ctx, pitch);
        });
    frame.render_widget(widget, rows[0]);

    let status = if view.warnings.is_empty() {
        format!("{} skipped out of bounds", view.skipped)
    } else {
        view.warnings
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    };
    let style = if view.warnings.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow)
    };
    frame.render_widget(Paragraph::new(status).style(style), rows[1]);
}

fn draw_pitch_canvas(ctx: &mut canvas::Context, pitch: &PitchGeometry) {
    let color = Color::White;
    for shape in &pitch.shapes {
        match shape.kind {
            ShapeKind::Line { x1, y1, x2, y2 } => match shape.style {
                StrokeStyle::Solid => ctx.draw(&canvas::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                }),
                StrokeStyle::Dashed => {
                    const DASHES: usize = 12;
                    for k in (0..DASHES).step_by(2) {
                        let t0 = k as f64 / DASHES as f64;
                        let t1 = (k + 1) as f64 / DASHES as f64;
                        ctx.draw(&canvas::Line {
                            x1: x1 + (x2 - x1) * t0,
                            y1: y1 + (y2 - y1) * t0,
                            x2: x1 + (x2 - x1) * t1,
                            y2: y1 + (y2 - y1) * t1,
                            color,
                        });
                    }
                }
            },
            ShapeKind::Rectangle {
                x,
                y,
                width,
                height,
            } => ctx.draw(&Rectangle {
                x,
                y,
                width,
                height,
                color,
            }),
            ShapeKind::Circle { cx, cy, radius, .. } => ctx.draw(&Circle {
                x: cx,
                y: cy,
                radius,
                color,
            }),
        }
    }
}

fn render_heart_rate(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(34)])
        .split(area);

    let trace: Vec<(f64, f64)> = state
        .hr
        .samples
        .iter()
        .map(|s| (s.elapsed_min, s.bpm))
        .collect();
    let (t_lo, t_hi) = state.hr.span().unwrap_or((0.0, 1.0));
    let bpm_hi = trace.iter().map(|(_, b)| *b).fold(0.0_f64, f64::max) + 10.0;
    let bpm_lo = trace.iter().map(|(_, b)| *b).reduce(f64::min).unwrap_or(0.0) - 10.0;
    let (w_start, w_end) = state.hr_window;
    let start_marker = [(w_start, bpm_lo), (w_start, bpm_hi)];
    let end_marker = [(w_end, bpm_lo), (w_end, bpm_hi)];

    let edge_style = |edge: HrEdge| {
        if state.hr_edge == edge {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    let datasets = vec![
        Dataset::default()
            .name("HR (bpm)")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&trace),
        Dataset::default()
            .name("Début")
            .graph_type(GraphType::Line)
            .style(edge_style(HrEdge::Start))
            .data(&start_marker),
        Dataset::default()
            .name("Fin")
            .graph_type(GraphType::Line)
            .style(edge_style(HrEdge::End))
            .data(&end_marker),
    ];
    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!("Fréquence cardiaque ({})", state.hr_source))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Temps (minutes)")
                .bounds([t_lo, t_hi.max(t_lo + 1.0)])
                .labels(vec![
                    Span::raw(format!("{t_lo:.0}")),
                    Span::raw(format!("{t_hi:.0}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([bpm_lo, bpm_hi])
                .labels(vec![
                    Span::raw(format!("{bpm_lo:.0}")),
                    Span::raw(format!("{bpm_hi:.0}")),
                ]),
        );
    frame.render_widget(widget, cols[0]);

    let mut lines = vec![format!("Plage : {w_start:.2} - {w_end:.2} min"), String::new()];
    match (&state.hr_summary, &state.hr_error) {
        (Some(summary), _) => {
            lines.push(format!("HR Maximum : {:.2}", summary.max));
            lines.push(format!("HR Moyenne : {:.2}", summary.mean));
            lines.push(format!("HR Minimum : {:.2}", summary.min));
            lines.push(format!("Pic à {:.2} min", summary.max_at));
            lines.push(String::new());
            lines.push("Δ Récupération".to_string());
            for r in &summary.recovery {
                lines.push(format!("  {:.0} min : {:.0} bpm", r.offset_min, r.delta));
            }
        }
        (None, Some(err)) => lines.push(format!("Erreur : {err}")),
        (None, None) => lines.push("Aucune donnée dans la plage sélectionnée.".to_string()),
    }
    let stats = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Statistiques").borders(Borders::ALL));
    frame.render_widget(stats, cols[1]);
}

fn render_comparison(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let players = state.comparison_players();
    let charts = state.comparison_charts();

    for (side, chart) in charts.into_iter().enumerate() {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(cols[side]);
        let focus = if state.compare_focus == side { "> " } else { "  " };
        let label = format!("{focus}{}", players[side].unwrap_or("-"));
        let style = if state.compare_focus == side {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        frame.render_widget(Paragraph::new(label).style(style), rows[0]);

        match chart {
            Some(ChartData::Line(line)) => render_line_for(frame, rows[1], &line, state, players[side]),
            other => render_chart_data(frame, rows[1], other, state),
        }
    }
}

fn render_line_for(
    frame: &mut Frame,
    area: Rect,
    chart: &MetricChart,
    state: &AppState,
    player: Option<&str>,
) {
    let mut titled = chart.clone();
    if let Some(player) = player {
        titled.title = format!("{} : {player}", chart.title);
    }
    render_metric_chart(frame, area, &titled, state);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Performance Terminal - Help",
        "",
        "Global:",
        "  1-5          Home / GPS / Video / Heart rate / Comparison",
        "  Tab          Next screen",
        "  b / Esc      Back home",
        "  m            Toggle feminine/masculine module",
        "  s            Show/hide matches under the duration cutoff",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "GPS:",
        "  j/k or ↑/↓   Player",
        "  h/l or ←/→   Chart",
        "  Space        Mark chart for the report",
        "  e            Export report",
        "",
        "Video:",
        "  j/k          Session",
        "  p / P        Next/previous player",
        "  v            Heat map / ball touches",
        "",
        "Heart rate:",
        "  [ / ]        Select start/end edge",
        "  h/l          Move the selected edge",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
