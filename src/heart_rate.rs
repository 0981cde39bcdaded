use std::io::{BufRead, BufReader, Read};

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::error::HrError;

pub const COL_TIME: &str = "Time";
pub const COL_HR: &str = "HR (bpm)";
pub const RECOVERY_OFFSETS_MIN: [f64; 4] = [1.0, 2.0, 3.0, 5.0];

const PREAMBLE_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HrSample {
    pub elapsed_min: f64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HrTrace {
    pub samples: Vec<HrSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecoveryDelta {
    pub offset_min: f64,
    pub bpm: f64,
    /// Drop from the window maximum.
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrSummary {
    pub start_min: f64,
    pub end_min: f64,
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    pub max_at: f64,
    pub recovery: Vec<RecoveryDelta>,
}

fn parse_clock(raw: &str) -> Option<f64> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S%.f",
        "%d.%m.%Y %H:%M:%S%.f",
    ];
    const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

    let raw = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            let utc = dt.and_utc();
            return Some(utc.timestamp() as f64 + utc.timestamp_subsec_millis() as f64 / 1000.0);
        }
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(raw, fmt) {
            return Some(t.num_seconds_from_midnight() as f64 + t.nanosecond() as f64 / 1e9);
        }
    }
    None
}

/// Reads a monitor export: two preamble lines, then a header row with `Time` and `HR (bpm)`.
pub fn parse_hr_csv<R: Read>(reader: R) -> Result<HrTrace, HrError> {
    let mut reader = BufReader::new(reader);
    let mut skipped = String::new();
    for _ in 0..PREAMBLE_LINES {
        skipped.clear();
        if reader.read_line(&mut skipped)? == 0 {
            break;
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let time_idx = headers.iter().position(|h| h == COL_TIME);
    let hr_idx = headers.iter().position(|h| h == COL_HR);
    let (Some(time_idx), Some(hr_idx)) = (time_idx, hr_idx) else {
        let missing = [(COL_TIME, time_idx), (COL_HR, hr_idx)]
            .into_iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(HrError::MissingColumns { missing });
    };

    let mut raw: Vec<(f64, f64)> = Vec::new();
    let mut dropped = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        let clock = record.get(time_idx).and_then(parse_clock);
        let bpm = record
            .get(hr_idx)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite());
        match (clock, bpm) {
            (Some(clock), Some(bpm)) => raw.push((clock, bpm)),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        log::debug!("heart rate: dropped {dropped} unparseable rows");
    }

    let origin = raw.iter().map(|(t, _)| *t).reduce(f64::min).unwrap_or(0.0);
    Ok(HrTrace {
        samples: raw
            .into_iter()
            .map(|(t, bpm)| HrSample {
                elapsed_min: (t - origin) / 60.0,
                bpm,
            })
            .collect(),
    })
}

impl HrTrace {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn elapsed_minutes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.elapsed_min).collect()
    }

    /// `(first, last)` elapsed minute, the default window.
    pub fn span(&self) -> Option<(f64, f64)> {
        let min = self.samples.iter().map(|s| s.elapsed_min).reduce(f64::min)?;
        let max = self.samples.iter().map(|s| s.elapsed_min).reduce(f64::max)?;
        Some((min, max))
    }

    /// Samples with `start <= elapsed <= end`.
    pub fn window(&self, start: f64, end: f64) -> Result<Vec<HrSample>, HrError> {
        if end < start {
            return Err(HrError::InvalidWindow { start, end });
        }
        Ok(self
            .samples
            .iter()
            .filter(|s| s.elapsed_min >= start && s.elapsed_min <= end)
            .copied()
            .collect())
    }

    /// Sample closest in time to `minute`; the earliest wins on ties.
    pub fn nearest(&self, minute: f64) -> Option<HrSample> {
        let mut best: Option<(f64, HrSample)> = None;
        for sample in &self.samples {
            let distance = (sample.elapsed_min - minute).abs();
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, *sample));
            }
        }
        best.map(|(_, s)| s)
    }

    /// Stats for a window, with recovery read from the whole trace after the window peak.
    pub fn summarize(&self, start: f64, end: f64) -> Result<HrSummary, HrError> {
        let window = self.window(start, end)?;
        let mut peak: Option<HrSample> = None;
        let mut min = f64::INFINITY;
        let mut sum = 0.0;
        for sample in &window {
            if peak.is_none_or(|p| sample.bpm > p.bpm) {
                peak = Some(*sample);
            }
            min = min.min(sample.bpm);
            sum += sample.bpm;
        }
        let peak = peak.ok_or(HrError::EmptyTrace)?;

        let recovery = RECOVERY_OFFSETS_MIN
            .iter()
            .filter_map(|offset| {
                self.nearest(peak.elapsed_min + offset).map(|s| RecoveryDelta {
                    offset_min: *offset,
                    bpm: s.bpm,
                    delta: peak.bpm - s.bpm,
                })
            })
            .collect();

        Ok(HrSummary {
            start_min: start,
            end_min: end,
            max: peak.bpm,
            mean: sum / window.len() as f64,
            min,
            max_at: peak.elapsed_min,
            recovery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "Name,Runner\nDate,2024-03-02\nTime,HR (bpm),Speed\n\
        10:00:00,120,0\n10:01:00,150,1\n10:02:00,180,2\n10:03:00,160,1\n10:04:00,140,0\n\
        bad,100,0\n10:05:00,,0\n10:07:00,110,0\n";

    #[test]
    fn preamble_is_skipped_and_minutes_are_relative() {
        let trace = parse_hr_csv(EXPORT.as_bytes()).unwrap();
        assert_eq!(trace.samples.len(), 6);
        assert_eq!(trace.elapsed_minutes(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 7.0]);
        assert_eq!(trace.span(), Some((0.0, 7.0)));
    }

    #[test]
    fn summary_reports_peak_and_recovery() {
        let trace = parse_hr_csv(EXPORT.as_bytes()).unwrap();
        let s = trace.summarize(0.0, 4.0).unwrap();
        assert_eq!(s.max, 180.0);
        assert_eq!(s.min, 120.0);
        assert_eq!(s.mean, 150.0);
        assert_eq!(s.max_at, 2.0);
        let deltas: Vec<f64> = s.recovery.iter().map(|r| r.delta).collect();
        // +5 min lands at minute 7, outside the window but still in the trace.
        assert_eq!(deltas, vec![20.0, 40.0, 40.0, 70.0]);
    }

    #[test]
    fn reversed_window_is_rejected() {
        let trace = parse_hr_csv(EXPORT.as_bytes()).unwrap();
        assert!(matches!(
            trace.window(3.0, 1.0),
            Err(HrError::InvalidWindow { .. })
        ));
        assert!(matches!(trace.summarize(5.0, 6.0), Err(HrError::EmptyTrace)));
    }

    #[test]
    fn missing_columns_are_listed() {
        let err = parse_hr_csv("a\nb\nClock,Pulse\n1,2\n".as_bytes()).unwrap_err();
        match err {
            HrError::MissingColumns { missing } => assert_eq!(missing, vec!["Time", "HR (bpm)"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn full_timestamps_are_accepted() {
        assert_eq!(parse_clock("2024-03-02 10:00:30"), Some(1709373630.0));
        assert_eq!(parse_clock("00:01:30"), Some(90.0));
        assert_eq!(parse_clock("later"), None);
    }
}
