use serde::{Deserialize, Serialize};

use crate::ingest::{ConstantTable, Position, TrackingRow};

pub const MIN_MATCH_DURATION_S: f64 = 3900.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisModule {
    Feminine,
    Masculine,
}

impl AnalysisModule {
    pub fn label(self) -> &'static str {
        match self {
            AnalysisModule::Feminine => "Pôle Féminin",
            AnalysisModule::Masculine => "Pôle Masculin",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            AnalysisModule::Feminine => AnalysisModule::Masculine,
            AnalysisModule::Masculine => AnalysisModule::Feminine,
        }
    }

    /// Age-group label of the reference constants.
    pub fn reference_label(self) -> &'static str {
        match self {
            AnalysisModule::Feminine => "Constante U17",
            AnalysisModule::Masculine => "Constante U15",
        }
    }

    pub fn general_metrics(self) -> &'static [MetricId] {
        use MetricId::*;
        match self {
            AnalysisModule::Feminine => &[
                Distance,
                Distance19,
                Distance23,
                TopSpeed,
                Accelerations2,
                Decelerations2,
            ],
            AnalysisModule::Masculine => &[Distance, Distance16, Distance20, TopSpeed, AccDec2, AccDec4],
        }
    }

    pub fn per_minute_metrics(self) -> &'static [MetricId] {
        use MetricId::*;
        match self {
            AnalysisModule::Feminine => &[
                DistancePerMin,
                Distance23PerMin,
                Distance19PerMin,
                Accelerations2PerMin,
                Decelerations2PerMin,
            ],
            AnalysisModule::Masculine => &[
                DistancePerMin,
                Distance20PerMin,
                Distance16PerMin,
                AccDec2PerMin,
                AccDec4PerMin,
            ],
        }
    }

    pub fn all_metrics(self) -> Vec<MetricId> {
        let mut out = self.general_metrics().to_vec();
        out.extend_from_slice(self.per_minute_metrics());
        out
    }

    /// Share-of-distance columns, fastest band first.
    pub fn band_columns(self) -> BandColumns {
        match self {
            AnalysisModule::Feminine => BandColumns {
                columns: ["Distance23%", "Distance19%", "Distance%"],
                labels: ["Distance23%", "Distance19%", "Distance%"],
            },
            AnalysisModule::Masculine => BandColumns {
                columns: ["Distance20%", "Distance16%", "Distance%"],
                labels: ["Distance>20", "Distance>16", "Distance<16"],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandColumns {
    pub columns: [&'static str; 3],
    pub labels: [&'static str; 3],
}

const ACC_BANDS: [&str; 3] = ["Nb Acc2>3m/s²", "Nb Acc3>4m/s²", "Nb Acc>4m/s²"];
const DEC_BANDS: [&str; 3] = ["Nb Dec2>3m/s²", "Nb Dec3>4m/s²", "Nb Dec>4m/s²"];
const ACC_DEC_HIGH: [&str; 2] = ["Nb Acc>4m/s²", "Nb Dec>4m/s²"];

/// Every chartable metric. Labels double as indicator names in the constant sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricId {
    Distance,
    TopSpeed,
    DistancePerMin,
    Distance16,
    Distance20,
    AccDec2,
    AccDec4,
    Distance20PerMin,
    Distance16PerMin,
    AccDec2PerMin,
    AccDec4PerMin,
    Distance19,
    Distance23,
    Accelerations2,
    Decelerations2,
    Distance23PerMin,
    Distance19PerMin,
    Accelerations2PerMin,
    Decelerations2PerMin,
}

impl MetricId {
    pub const ALL: [MetricId; 19] = [
        MetricId::Distance,
        MetricId::TopSpeed,
        MetricId::DistancePerMin,
        MetricId::Distance16,
        MetricId::Distance20,
        MetricId::AccDec2,
        MetricId::AccDec4,
        MetricId::Distance20PerMin,
        MetricId::Distance16PerMin,
        MetricId::AccDec2PerMin,
        MetricId::AccDec4PerMin,
        MetricId::Distance19,
        MetricId::Distance23,
        MetricId::Accelerations2,
        MetricId::Decelerations2,
        MetricId::Distance23PerMin,
        MetricId::Distance19PerMin,
        MetricId::Accelerations2PerMin,
        MetricId::Decelerations2PerMin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricId::Distance => "Distance",
            MetricId::TopSpeed => "TopSpeed",
            MetricId::DistancePerMin => "Dist/min",
            MetricId::Distance16 => "Distance > 16km/h",
            MetricId::Distance20 => "Distance > 20km/h",
            MetricId::AccDec2 => "Nb Acc/Dec > 2m/s²",
            MetricId::AccDec4 => "Nb Acc/Dec > 4m/s²",
            MetricId::Distance20PerMin => "Distance>20kmh/min",
            MetricId::Distance16PerMin => "Distance>16kmh/min",
            MetricId::AccDec2PerMin => "Nb Acc/Dec > 2m/s²/min",
            MetricId::AccDec4PerMin => "Nb Acc/Dec > 4m/s²/min",
            MetricId::Distance19 => "Distance>19km/h",
            MetricId::Distance23 => "Distance > 23km/h",
            MetricId::Accelerations2 => "Accélérations > 2m/s²",
            MetricId::Decelerations2 => "Décélérations > 2m/s²",
            MetricId::Distance23PerMin => "Distance>23kmh/min",
            MetricId::Distance19PerMin => "Distance > 19kmh/min",
            MetricId::Accelerations2PerMin => "Nb Accélération > 2m/s²/min",
            MetricId::Decelerations2PerMin => "Nb Décélération > 2m/s²/min",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let key = raw.trim();
        MetricId::ALL.into_iter().find(|m| m.label() == key)
    }

    pub fn is_per_minute(self) -> bool {
        matches!(
            self,
            MetricId::DistancePerMin
                | MetricId::Distance20PerMin
                | MetricId::Distance16PerMin
                | MetricId::AccDec2PerMin
                | MetricId::AccDec4PerMin
                | MetricId::Distance23PerMin
                | MetricId::Distance19PerMin
                | MetricId::Accelerations2PerMin
                | MetricId::Decelerations2PerMin
        )
    }

    pub fn derive(self, row: &TrackingRow) -> Option<f64> {
        match self {
            MetricId::Distance => row.value("Distance"),
            MetricId::TopSpeed => row.value("TopSpeed"),
            MetricId::DistancePerMin => row.value("Dist/min"),

            MetricId::Distance16 => row.value("Dist>16kmh"),
            MetricId::Distance20 => row.value("Dist>20kmh").map(km_to_m),
            MetricId::AccDec2 => acc_dec_2(row),
            MetricId::AccDec4 => sum_present(row, &ACC_DEC_HIGH),
            MetricId::Distance20PerMin => {
                let metres = row.value("Dist>20kmh").map(km_to_m).unwrap_or(0.0);
                Some(metres / minutes_or_one_second(row)?)
            }
            MetricId::Distance16PerMin => {
                Some(row.value("Distance16")? / minutes_or_one_second(row)?)
            }
            MetricId::AccDec2PerMin => {
                Some(acc_dec_2(row).unwrap_or(0.0) / minutes_or_one_second(row)?)
            }
            MetricId::AccDec4PerMin => Some(
                sum_present(row, &ACC_DEC_HIGH).unwrap_or(0.0) / minutes_or_one_second(row)?,
            ),

            MetricId::Distance19 => row
                .value("Distance > 19km/h")
                .or_else(|| row.value("Distance>19km/h")),
            MetricId::Distance23 => row.value("Dist>23kmh").map(km_to_m),
            MetricId::Accelerations2 => sum_present(row, &ACC_BANDS),
            MetricId::Decelerations2 => sum_present(row, &DEC_BANDS),
            MetricId::Distance23PerMin => {
                Some(km_to_m(row.value("Dist>23kmh")?) / strict_minutes(row)?)
            }
            MetricId::Distance19PerMin => Some(row.value("Distance19")? / strict_minutes(row)?),
            MetricId::Accelerations2PerMin => {
                Some(sum_present(row, &ACC_BANDS)? / strict_minutes(row)?)
            }
            MetricId::Decelerations2PerMin => {
                Some(sum_present(row, &DEC_BANDS)? / strict_minutes(row)?)
            }
        }
    }
}

fn km_to_m(km: f64) -> f64 {
    km * 1000.0
}

fn acc_dec_2(row: &TrackingRow) -> Option<f64> {
    let acc = sum_present(row, &ACC_BANDS);
    let dec = sum_present(row, &DEC_BANDS);
    match (acc, dec) {
        (None, None) => None,
        (a, d) => Some(a.unwrap_or(0.0) + d.unwrap_or(0.0)),
    }
}

/// Sum of the columns that are present; `None` when none are.
fn sum_present(row: &TrackingRow, columns: &[&str]) -> Option<f64> {
    let mut any = false;
    let mut total = 0.0;
    for column in columns {
        if let Some(v) = row.value(column) {
            total += v;
            any = true;
        }
    }
    any.then_some(total)
}

/// Duration in minutes, with a zero duration counted as one second.
fn minutes_or_one_second(row: &TrackingRow) -> Option<f64> {
    let duration = row.duration_s?;
    let duration = if duration == 0.0 { 1.0 } else { duration };
    Some(duration / 60.0)
}

fn strict_minutes(row: &TrackingRow) -> Option<f64> {
    row.duration_s.filter(|d| *d > 0.0).map(|d| d / 60.0)
}

/// Rows whose match lasted at least `min_duration_s`; rows without a duration are dropped.
pub fn filter_min_duration<'a>(rows: &[&'a TrackingRow], min_duration_s: f64) -> Vec<&'a TrackingRow> {
    rows.iter()
        .copied()
        .filter(|r| r.duration_s.is_some_and(|d| d >= min_duration_s))
        .collect()
}

/// Per-session share of distance by speed band, plus the positional reference bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBands {
    pub labels: [&'static str; 3],
    pub sessions: Vec<(String, [f64; 3])>,
    pub reference: Option<(String, [f64; 3])>,
}

impl StackedBands {
    /// `None` when no row carries any of the band columns.
    pub fn build(
        module: AnalysisModule,
        rows: &[&TrackingRow],
        constants: &ConstantTable,
        position: Option<Position>,
    ) -> Option<Self> {
        let bands = module.band_columns();
        let carries_bands = rows
            .iter()
            .any(|r| bands.columns.iter().any(|c| r.value(c).is_some()));
        if !carries_bands {
            return None;
        }

        let sessions = rows
            .iter()
            .map(|r| {
                let values = bands.columns.map(|c| r.value(c).unwrap_or(0.0));
                (r.session.clone(), values)
            })
            .collect();

        let reference = position.and_then(|pos| {
            let refs = bands.columns.map(|c| constants.reference(c, pos));
            refs.iter().any(Option::is_some).then(|| {
                (
                    module.reference_label().to_string(),
                    refs.map(|v| v.unwrap_or(0.0)),
                )
            })
        });

        Some(Self {
            labels: bands.labels,
            sessions,
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn row(duration: Option<f64>, cols: &[(&str, f64)]) -> TrackingRow {
        TrackingRow {
            player: "P".to_string(),
            session: "S".to_string(),
            duration_s: duration,
            columns: cols
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn labels_round_trip_through_registry() {
        for metric in MetricId::ALL {
            assert_eq!(MetricId::from_label(metric.label()), Some(metric));
        }
        assert_eq!(MetricId::from_label("Distance > 99km/h"), None);
    }

    #[test]
    fn high_speed_distance_is_converted_to_metres() {
        let r = row(Some(5400.0), &[("Dist>20kmh", 0.45)]);
        assert_eq!(MetricId::Distance20.derive(&r), Some(450.0));
        let per_min = MetricId::Distance20PerMin.derive(&r).unwrap();
        assert!((per_min - 5.0).abs() < 1e-9);
    }

    #[test]
    fn masculine_rates_treat_zero_duration_as_one_second() {
        let r = row(Some(0.0), &[("Distance16", 10.0)]);
        let rate = MetricId::Distance16PerMin.derive(&r).unwrap();
        assert!((rate - 600.0).abs() < 1e-9);
    }

    #[test]
    fn feminine_rates_skip_zero_duration() {
        let r = row(Some(0.0), &[("Distance19", 10.0)]);
        assert_eq!(MetricId::Distance19PerMin.derive(&r), None);
    }

    #[test]
    fn acc_dec_bands_sum_present_columns() {
        let r = row(
            Some(3600.0),
            &[
                ("Nb Acc2>3m/s²", 10.0),
                ("Nb Acc>4m/s²", 2.0),
                ("Nb Dec2>3m/s²", 8.0),
                ("Nb Dec>4m/s²", 3.0),
            ],
        );
        assert_eq!(MetricId::AccDec2.derive(&r), Some(23.0));
        assert_eq!(MetricId::AccDec4.derive(&r), Some(5.0));
        assert_eq!(MetricId::Accelerations2.derive(&r), Some(12.0));
        assert_eq!(MetricId::Decelerations2PerMin.derive(&r), Some(11.0 / 60.0));
        assert_eq!(MetricId::TopSpeed.derive(&r), None);
    }

    #[test]
    fn short_matches_are_filtered() {
        let long = row(Some(5400.0), &[]);
        let short = row(Some(1200.0), &[]);
        let unknown = row(None, &[]);
        let rows = vec![&long, &short, &unknown];
        let kept = filter_min_duration(&rows, MIN_MATCH_DURATION_S);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].duration_s, Some(5400.0));
    }

    #[test]
    fn stacked_bands_fill_missing_with_zero_and_add_reference() {
        let a = row(Some(5400.0), &[("Distance20%", 8.0), ("Distance16%", 15.0), ("Distance%", 77.0)]);
        let mut b = row(Some(5400.0), &[("Distance20%", 6.0)]);
        b.session = "T".to_string();
        let mut constants = ConstantTable::default();
        constants.insert("Distance20%", Position::AT, 9.0);
        constants.insert("Distance%", Position::AT, 75.0);

        let bands =
            StackedBands::build(AnalysisModule::Masculine, &[&a, &b], &constants, Some(Position::AT))
                .unwrap();
        assert_eq!(bands.labels[0], "Distance>20");
        assert_eq!(bands.sessions[1], ("T".to_string(), [6.0, 0.0, 0.0]));
        assert_eq!(
            bands.reference,
            Some(("Constante U15".to_string(), [9.0, 0.0, 75.0]))
        );

        let none = StackedBands::build(AnalysisModule::Feminine, &[&a], &constants, None);
        assert!(none.is_some_and(|b| b.sessions[0].1 == [0.0, 0.0, 77.0] && b.reference.is_none()));
        assert!(StackedBands::build(AnalysisModule::Masculine, &[], &constants, None).is_none());
    }

    #[test]
    fn module_lists_are_disjoint_by_speed_band() {
        let fem = AnalysisModule::Feminine.all_metrics();
        let masc = AnalysisModule::Masculine.all_metrics();
        assert!(fem.contains(&MetricId::Distance23));
        assert!(!masc.contains(&MetricId::Distance23));
        assert!(masc.contains(&MetricId::AccDec4PerMin));
        assert_eq!(AnalysisModule::Masculine.toggle(), AnalysisModule::Feminine);
    }
}
