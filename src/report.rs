use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Chart, ChartFormat, ChartLine, ChartLineDashType, ChartTrendline, ChartTrendlineType,
    ChartType, Format, Image, Workbook, Worksheet,
};

use crate::charts::{self, ChartData, ChartKind, MetricChart};
use crate::heatmap::HeatmapView;
use crate::ingest::SessionBundle;
use crate::metrics::{AnalysisModule, MetricId, StackedBands};
use crate::render;

pub const REPORT_TITLE: &str = "Rapport de Performance en match";
pub const CHARTS_PER_PAGE: usize = 2;

// Landscape A4 layout, in millimetres.
const SLOT_X_MM: [f64; CHARTS_PER_PAGE] = [10.0, 155.0];
const SLOT_Y_MM: f64 = 60.0;
const SLOT_WIDTH_MM: f64 = 135.0;

const PX_PER_MM: f64 = 96.0 / 25.4;
const DEFAULT_COL_PX: u32 = 64;
const DEFAULT_ROW_PX: u32 = 20;

const SERIES_SHEET: &str = "Séries";
const DATA_SHEET: &str = "Données";
const SERIES_COLS_PER_CHART: u16 = 4;
const REFERENCE_COLOR: &str = "#D62728";

/// Cell anchor plus pixel offsets for an object placed at a millimetre position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAnchor {
    pub row: u32,
    pub col: u16,
    pub x_offset: u32,
    pub y_offset: u32,
}

impl CellAnchor {
    pub fn from_mm(x_mm: f64, y_mm: f64) -> Self {
        let x_px = (x_mm * PX_PER_MM).round() as u32;
        let y_px = (y_mm * PX_PER_MM).round() as u32;
        Self {
            row: y_px / DEFAULT_ROW_PX,
            col: (x_px / DEFAULT_COL_PX) as u16,
            x_offset: x_px % DEFAULT_COL_PX,
            y_offset: y_px % DEFAULT_ROW_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedChart {
    /// Index into the chart list handed to `paginate`.
    pub chart: usize,
    pub anchor: CellAnchor,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPage {
    pub number: usize,
    pub charts: Vec<PlacedChart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPlan {
    pub pages: Vec<ReportPage>,
}

impl ReportPlan {
    /// Lays `chart_count` charts out two per page, left slot first.
    pub fn paginate(chart_count: usize) -> Self {
        let width_px = (SLOT_WIDTH_MM * PX_PER_MM).round() as u32;
        let height_px = width_px / 2;
        let pages = (0..chart_count)
            .collect::<Vec<_>>()
            .chunks(CHARTS_PER_PAGE)
            .enumerate()
            .map(|(p, chunk)| ReportPage {
                number: p + 1,
                charts: chunk
                    .iter()
                    .enumerate()
                    .map(|(slot, chart)| PlacedChart {
                        chart: *chart,
                        anchor: CellAnchor::from_mm(SLOT_X_MM[slot], SLOT_Y_MM),
                        width_px,
                        height_px,
                    })
                    .collect(),
            })
            .collect();
        Self { pages }
    }

    pub fn chart_count(&self) -> usize {
        self.pages.iter().map(|p| p.charts.len()).sum()
    }
}

pub struct ReportRequest<'a> {
    pub bundle: &'a SessionBundle,
    pub module: AnalysisModule,
    pub player: &'a str,
    pub charts: Vec<ChartKind>,
    pub min_duration_s: Option<f64>,
    /// Session label and its rendered heat map.
    pub heatmap: Option<(&'a str, &'a HeatmapView)>,
}

#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub path: PathBuf,
    pub pages: usize,
    pub charts: usize,
    pub data_rows: usize,
    pub skipped: Vec<String>,
}

/// Player line of the cover page.
pub fn player_line(bundle: &SessionBundle, player: &str) -> String {
    let position = bundle
        .position_of(player)
        .map(|p| p.label())
        .unwrap_or("Non spécifié");
    format!("Joueur : {player} ({position})")
}

pub fn export_report(request: &ReportRequest<'_>, path: &Path) -> Result<ReportSummary> {
    let mut built = Vec::new();
    let mut skipped = Vec::new();
    for kind in &request.charts {
        match charts::build_chart(
            request.bundle,
            request.module,
            request.player,
            *kind,
            request.min_duration_s,
        ) {
            Some(ChartData::Line(chart)) if chart.is_empty() => {
                skipped.push(kind.title().to_string())
            }
            Some(chart) => built.push(chart),
            None => skipped.push(kind.title().to_string()),
        }
    }
    let plan = ReportPlan::paginate(built.len());

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Rapport")?;
        write_cover(sheet, request, &built)?;
    }

    for page in &plan.pages {
        let mut rendered = Vec::with_capacity(page.charts.len());
        for placed in &page.charts {
            rendered.push((placed, chart_object(&built[placed.chart], placed, request)));
        }
        let sheet = workbook.add_worksheet();
        sheet.set_name(format!("Page {}", page.number))?;
        sheet.set_landscape().set_paper_size(9);
        sheet.write_string_with_format(0, 0, REPORT_TITLE, &Format::new().set_bold())?;
        for (placed, chart) in &rendered {
            let a = placed.anchor;
            sheet
                .insert_chart_with_offset(a.row, a.col, chart, a.x_offset, a.y_offset)
                .with_context(|| format!("place chart {} on page {}", placed.chart, page.number))?;
        }
    }

    if let Some((session, view)) = request.heatmap {
        let png = render::encode_png(view)?;
        let image = Image::new_from_buffer(&png).context("load heat map image")?;
        let sheet = workbook.add_worksheet();
        sheet.set_name("Carte de chaleur")?;
        sheet.set_landscape().set_paper_size(9);
        sheet.write_string_with_format(
            0,
            0,
            &format!("Carte de chaleur : {} / {session}", request.player),
            &Format::new().set_bold(),
        )?;
        sheet.insert_image(2, 0, &image)?;
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SERIES_SHEET)?;
        for (idx, chart) in built.iter().enumerate() {
            write_series(sheet, idx, chart, request.module)?;
        }
    }

    let data_rows = {
        let sheet = workbook.add_worksheet();
        sheet.set_name(DATA_SHEET)?;
        write_data_sheet(sheet, request)?
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report dir {}", parent.display()))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing report to {}", path.display()))?;

    log::info!(
        "report for {} written to {} ({} charts, {} pages)",
        request.player,
        path.display(),
        plan.chart_count(),
        plan.pages.len()
    );
    Ok(ReportSummary {
        path: path.to_path_buf(),
        pages: plan.pages.len(),
        charts: plan.chart_count(),
        data_rows,
        skipped,
    })
}

fn write_cover(sheet: &mut Worksheet, request: &ReportRequest<'_>, built: &[ChartData]) -> Result<()> {
    sheet.set_landscape().set_paper_size(9);
    sheet.set_column_width(0, 60)?;
    sheet.write_string_with_format(
        0,
        0,
        REPORT_TITLE,
        &Format::new().set_bold().set_font_size(20),
    )?;
    sheet.write_string(2, 0, &player_line(request.bundle, request.player))?;
    sheet.write_string(3, 0, request.module.label())?;
    sheet.write_string(
        4,
        0,
        &format!("Généré le {}", chrono::Local::now().format("%d/%m/%Y %H:%M")),
    )?;
    sheet.write_string_with_format(6, 0, "Sommaire", &Format::new().set_bold().set_font_size(14))?;
    for (idx, chart) in built.iter().enumerate() {
        sheet.write_string(7 + idx as u32, 0, &format!("{}. {}", idx + 1, chart.title()))?;
    }
    Ok(())
}

fn series_origin(idx: usize) -> u16 {
    idx as u16 * SERIES_COLS_PER_CHART
}

fn write_series(
    sheet: &mut Worksheet,
    idx: usize,
    chart: &ChartData,
    module: AnalysisModule,
) -> Result<()> {
    let c0 = series_origin(idx);
    sheet.write_string(0, c0, chart.title())?;
    match chart {
        ChartData::Line(line) => {
            sheet.write_string(1, c0, "Session")?;
            sheet.write_string(1, c0 + 1, "Valeur")?;
            sheet.write_string(1, c0 + 2, module.reference_label())?;
            for (r, (session, value)) in line.points.iter().enumerate() {
                let row = 2 + r as u32;
                sheet.write_string(row, c0, session)?;
                sheet.write_number(row, c0 + 1, *value)?;
                if let Some(reference) = line.reference {
                    sheet.write_number(row, c0 + 2, reference)?;
                }
            }
        }
        ChartData::Stacked(bands) => {
            sheet.write_string(1, c0, "Session")?;
            for (b, label) in bands.labels.iter().enumerate() {
                sheet.write_string(1, c0 + 1 + b as u16, *label)?;
            }
            for (r, (session, values)) in stacked_rows(bands).into_iter().enumerate() {
                let row = 2 + r as u32;
                sheet.write_string(row, c0, &session)?;
                for (b, value) in values.iter().enumerate() {
                    sheet.write_number(row, c0 + 1 + b as u16, *value)?;
                }
            }
        }
    }
    Ok(())
}

fn stacked_rows(bands: &StackedBands) -> Vec<(String, [f64; 3])> {
    let mut rows = bands.sessions.clone();
    rows.extend(bands.reference.clone());
    rows
}

fn chart_object(data: &ChartData, placed: &PlacedChart, request: &ReportRequest<'_>) -> Chart {
    let c0 = series_origin(placed.chart);
    let mut chart = match data {
        ChartData::Line(line) => line_chart(line, c0, request.player, request.module),
        ChartData::Stacked(bands) => stacked_chart(bands, c0),
    };
    chart.title().set_name(data.title());
    chart.set_width(placed.width_px).set_height(placed.height_px);
    chart
}

fn line_chart(line: &MetricChart, c0: u16, player: &str, module: AnalysisModule) -> Chart {
    let last = 1 + line.points.len() as u32;
    let mut chart = Chart::new(ChartType::Line);
    let mut trend = ChartTrendline::new();
    trend.set_type(ChartTrendlineType::Linear);

    chart
        .add_series()
        .set_name(player)
        .set_categories((SERIES_SHEET, 2, c0, last, c0))
        .set_values((SERIES_SHEET, 2, c0 + 1, last, c0 + 1))
        .set_trendline(&trend);

    if line.reference.is_some() {
        chart
            .add_series()
            .set_name(module.reference_label())
            .set_categories((SERIES_SHEET, 2, c0, last, c0))
            .set_values((SERIES_SHEET, 2, c0 + 2, last, c0 + 2))
            .set_format(
                ChartFormat::new().set_line(
                    ChartLine::new()
                        .set_color(REFERENCE_COLOR)
                        .set_dash_type(ChartLineDashType::Dash),
                ),
            );
    }
    chart.x_axis().set_name("Session");
    chart
}

fn stacked_chart(bands: &StackedBands, c0: u16) -> Chart {
    let last = 1 + stacked_rows(bands).len() as u32;
    let mut chart = Chart::new(ChartType::ColumnStacked);
    for b in 0..bands.labels.len() as u16 {
        chart
            .add_series()
            .set_name((SERIES_SHEET, 1, c0 + 1 + b))
            .set_categories((SERIES_SHEET, 2, c0, last, c0))
            .set_values((SERIES_SHEET, 2, c0 + 1 + b, last, c0 + 1 + b));
    }
    chart.y_axis().set_name("%");
    chart
}

/// Writes the rows behind the charts; returns how many were written.
fn write_data_sheet(sheet: &mut Worksheet, request: &ReportRequest<'_>) -> Result<usize> {
    let metrics: Vec<MetricId> = request
        .charts
        .iter()
        .filter_map(|k| match k {
            ChartKind::Metric(m) => Some(*m),
            _ => None,
        })
        .collect();

    let header = Format::new().set_bold();
    sheet.write_string_with_format(0, 0, "Session", &header)?;
    sheet.write_string_with_format(0, 1, "Durée (s)", &header)?;
    for (c, metric) in metrics.iter().enumerate() {
        sheet.write_string_with_format(0, 2 + c as u16, metric.label(), &header)?;
    }

    let rows = charts::player_rows(request.bundle, request.player, request.min_duration_s);
    for (r, row) in rows.iter().enumerate() {
        let excel_row = 1 + r as u32;
        sheet.write_string(excel_row, 0, &row.session)?;
        if let Some(duration) = row.duration_s {
            sheet.write_number(excel_row, 1, duration)?;
        }
        for (c, metric) in metrics.iter().enumerate() {
            if let Some(value) = metric.derive(row) {
                sheet.write_number(excel_row, 2 + c as u16, value)?;
            }
        }
    }
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_places_two_charts_per_page() {
        let plan = ReportPlan::paginate(5);
        assert_eq!(plan.pages.len(), 3);
        assert_eq!(plan.chart_count(), 5);
        assert_eq!(plan.pages[2].charts.len(), 1);
        assert_eq!(plan.pages[1].charts[0].chart, 2);
        let left = plan.pages[0].charts[0].anchor;
        let right = plan.pages[0].charts[1].anchor;
        assert_eq!(left.row, right.row);
        assert!(right.col > left.col);
        assert!(ReportPlan::paginate(0).pages.is_empty());
    }

    #[test]
    fn anchors_convert_millimetres() {
        // 10 mm is 38 px, inside the first column.
        assert_eq!(
            CellAnchor::from_mm(10.0, 0.0),
            CellAnchor {
                row: 0,
                col: 0,
                x_offset: 38,
                y_offset: 0
            }
        );
        // 155 mm is 586 px: column 9 plus 10 px. 60 mm is 227 px: row 11 plus 7 px.
        let a = CellAnchor::from_mm(155.0, 60.0);
        assert_eq!((a.col, a.x_offset, a.row, a.y_offset), (9, 10, 11, 7));
    }

    #[test]
    fn player_line_falls_back_without_position() {
        let bundle = SessionBundle::default();
        assert_eq!(player_line(&bundle, "A"), "Joueur : A (Non spécifié)");
    }
}
