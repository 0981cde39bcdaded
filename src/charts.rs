use serde::Serialize;

use crate::ingest::{COL_TOUCHES, SessionBundle, TrackingRow};
use crate::metrics::{self, AnalysisModule, MetricId, StackedBands};

/// Least-squares line over the session index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn fit(values: &[f64]) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let n_f = n as f64;
        let mean_x = (n_f - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / n_f;
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for (i, y) in values.iter().enumerate() {
            let dx = i as f64 - mean_x;
            sxy += dx * (y - mean_y);
            sxx += dx * dx;
        }
        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricChart {
    pub title: String,
    pub points: Vec<(String, f64)>,
    pub trend: Option<Trend>,
    pub reference: Option<f64>,
}

impl MetricChart {
    fn new(title: String, points: Vec<(String, f64)>, reference: Option<f64>) -> Self {
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
        Self {
            title,
            trend: Trend::fit(&values),
            points,
            reference,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(min, max)` over points and reference, for axis bounds.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.values();
        values.extend(self.reference);
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;
        Some((min, max))
    }
}

/// Rows of one player, optionally restricted to full-length matches.
pub fn player_rows<'a>(
    bundle: &'a SessionBundle,
    player: &str,
    min_duration_s: Option<f64>,
) -> Vec<&'a TrackingRow> {
    let rows = bundle.tracking_for(player);
    match min_duration_s {
        Some(min) => metrics::filter_min_duration(&rows, min),
        None => rows,
    }
}

/// Session series for one metric. Missing values are plotted as zero.
pub fn metric_chart(
    bundle: &SessionBundle,
    player: &str,
    metric: MetricId,
    min_duration_s: Option<f64>,
) -> MetricChart {
    let points = player_rows(bundle, player, min_duration_s)
        .into_iter()
        .map(|r| (r.session.clone(), metric.derive(r).unwrap_or(0.0)))
        .collect();
    let reference = bundle
        .position_of(player)
        .and_then(|pos| bundle.constants.reference(metric.label(), pos));
    MetricChart::new(metric.label().to_string(), points, reference)
}

pub fn touches_chart(bundle: &SessionBundle, player: &str) -> MetricChart {
    let points = bundle
        .video_rows_for(player)
        .into_iter()
        .map(|r| (r.session.clone(), r.touches.unwrap_or(0.0)))
        .collect();
    let reference = bundle
        .position_of(player)
        .and_then(|pos| bundle.constants.reference(COL_TOUCHES, pos));
    MetricChart::new(COL_TOUCHES.to_string(), points, reference)
}

/// A chart the user can pick for the dashboard or the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartKind {
    Metric(MetricId),
    StackedBands,
    Touches,
}

impl ChartKind {
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Metric(m) => m.label(),
            ChartKind::StackedBands => "Diagramme empilé",
            ChartKind::Touches => COL_TOUCHES,
        }
    }

    /// Charts offered for a module, in menu order.
    pub fn menu(module: AnalysisModule) -> Vec<ChartKind> {
        let mut out: Vec<ChartKind> = module
            .general_metrics()
            .iter()
            .map(|m| ChartKind::Metric(*m))
            .collect();
        out.push(ChartKind::StackedBands);
        out.extend(module.per_minute_metrics().iter().map(|m| ChartKind::Metric(*m)));
        out
    }
}

/// A built chart, ready for any surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartData {
    Line(MetricChart),
    Stacked(StackedBands),
}

impl ChartData {
    pub fn title(&self) -> &str {
        match self {
            ChartData::Line(c) => &c.title,
            ChartData::Stacked(_) => ChartKind::StackedBands.title(),
        }
    }
}

pub fn build_chart(
    bundle: &SessionBundle,
    module: AnalysisModule,
    player: &str,
    kind: ChartKind,
    min_duration_s: Option<f64>,
) -> Option<ChartData> {
    match kind {
        ChartKind::Metric(metric) => Some(ChartData::Line(metric_chart(
            bundle,
            player,
            metric,
            min_duration_s,
        ))),
        ChartKind::Touches => Some(ChartData::Line(touches_chart(bundle, player))),
        ChartKind::StackedBands => {
            let rows = player_rows(bundle, player, min_duration_s);
            StackedBands::build(module, &rows, &bundle.constants, bundle.position_of(player))
                .map(ChartData::Stacked)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ingest::{Position, VideoRow};
    use crate::positions::RawField;

    fn bundle() -> SessionBundle {
        let mut b = SessionBundle::default();
        for (session, duration, distance) in [("M1", 5400.0, 10000.0), ("M2", 1800.0, 4000.0), ("M3", 5400.0, 11000.0)] {
            b.tracking.push(TrackingRow {
                player: "A".to_string(),
                session: session.to_string(),
                duration_s: Some(duration),
                columns: BTreeMap::from([("Distance".to_string(), distance)]),
            });
        }
        b.video.push(VideoRow {
            player: "A".to_string(),
            session: "M1".to_string(),
            x: RawField::Empty,
            y: RawField::Empty,
            touches: None,
        });
        b.positions.insert("A".to_string(), Position::MIL);
        b.constants.insert("Distance", Position::MIL, 10500.0);
        b.constants.insert(COL_TOUCHES, Position::MIL, 55.0);
        b
    }

    #[test]
    fn trend_fits_exact_line() {
        let t = Trend::fit(&[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert!((t.slope - 2.0).abs() < 1e-12);
        assert!((t.intercept - 1.0).abs() < 1e-12);
        assert!(Trend::fit(&[4.0]).is_none());
        let flat = Trend::fit(&[2.0, 2.0]).unwrap();
        assert_eq!(flat.at(10.0), 2.0);
    }

    #[test]
    fn short_matches_are_dropped_when_filtered() {
        let b = bundle();
        let all = metric_chart(&b, "A", MetricId::Distance, None);
        assert_eq!(all.points.len(), 3);
        let full = metric_chart(&b, "A", MetricId::Distance, Some(metrics::MIN_MATCH_DURATION_S));
        assert_eq!(full.values(), vec![10000.0, 11000.0]);
        assert_eq!(full.reference, Some(10500.0));
        assert_eq!(full.value_range(), Some((10000.0, 11000.0)));
    }

    #[test]
    fn missing_values_plot_as_zero() {
        let b = bundle();
        let chart = metric_chart(&b, "A", MetricId::TopSpeed, None);
        assert_eq!(chart.values(), vec![0.0, 0.0, 0.0]);
        assert_eq!(chart.reference, None);
    }

    #[test]
    fn touches_use_positional_constant() {
        let chart = touches_chart(&bundle(), "A");
        assert_eq!(chart.points, vec![("M1".to_string(), 0.0)]);
        assert_eq!(chart.reference, Some(55.0));
        assert!(chart.trend.is_none());
    }

    #[test]
    fn menu_places_stacked_chart_after_general_metrics() {
        let menu = ChartKind::menu(AnalysisModule::Masculine);
        assert_eq!(menu[6], ChartKind::StackedBands);
        assert_eq!(menu.len(), 12);
        assert!(build_chart(&bundle(), AnalysisModule::Masculine, "A", ChartKind::StackedBands, None).is_none());
    }
}
