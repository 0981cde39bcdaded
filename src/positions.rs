use serde::{Deserialize, Serialize};

use crate::error::HeatmapError;

const TOKEN_SEPARATOR: char = ';';

/// One on-field position in metres, relative to the pitch origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub x: f64,
    pub y: f64,
}

impl PositionSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A raw X or Y cell as it arrives from a tracking sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawField {
    /// `;`-joined decimal tokens, e.g. `"12.5;13.1;14.0"`.
    Text(String),
    Numbers(Vec<f64>),
    Scalar(f64),
    Empty,
}

impl RawField {
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return RawField::Empty;
        }
        if !trimmed.contains(TOKEN_SEPARATOR)
            && let Ok(value) = trimmed.parse::<f64>()
        {
            return RawField::Scalar(value);
        }
        RawField::Text(trimmed.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawField::Empty => true,
            RawField::Text(raw) => raw.trim().is_empty(),
            RawField::Numbers(values) => values.is_empty(),
            RawField::Scalar(_) => false,
        }
    }
}

impl From<&str> for RawField {
    fn from(cell: &str) -> Self {
        RawField::from_cell(cell)
    }
}

impl From<Vec<f64>> for RawField {
    fn from(values: Vec<f64>) -> Self {
        RawField::Numbers(values)
    }
}

impl From<f64> for RawField {
    fn from(value: f64) -> Self {
        RawField::Scalar(value)
    }
}

pub fn parse_coordinates(field: &RawField) -> Result<Vec<f64>, HeatmapError> {
    match field {
        RawField::Empty => Ok(Vec::new()),
        RawField::Scalar(value) => Ok(vec![*value]),
        RawField::Numbers(values) => Ok(values.clone()),
        RawField::Text(raw) => raw
            .split(TOKEN_SEPARATOR)
            .map(str::trim)
            // A trailing separator leaves an empty token behind.
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f64>().map_err(|_| HeatmapError::InvalidToken {
                    token: token.to_string(),
                })
            })
            .collect(),
    }
}

pub fn extract_samples(x: &RawField, y: &RawField) -> Result<Vec<PositionSample>, HeatmapError> {
    let xs = parse_coordinates(x)?;
    let ys = parse_coordinates(y)?;
    if xs.len() != ys.len() {
        return Err(HeatmapError::CoordinateMismatch {
            x_len: xs.len(),
            y_len: ys.len(),
        });
    }
    Ok(xs
        .into_iter()
        .zip(ys)
        .map(|(x, y)| PositionSample::new(x, y))
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub samples: Vec<PositionSample>,
    pub warning: Option<HeatmapError>,
}

/// Parses both fields, substituting an empty sample set when they cannot be paired.
pub fn extract_or_empty(x: &RawField, y: &RawField) -> Extraction {
    match extract_samples(x, y) {
        Ok(samples) => Extraction {
            samples,
            warning: None,
        },
        Err(err) => {
            log::warn!("position extraction failed, using empty sample set: {err}");
            Extraction {
                samples: Vec::new(),
                warning: Some(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_keep_token_order() {
        let x = RawField::from_cell("10.5;20;30.25");
        let y = RawField::from_cell("1;2;3");
        let samples = extract_samples(&x, &y).unwrap();
        assert_eq!(
            samples,
            vec![
                PositionSample::new(10.5, 1.0),
                PositionSample::new(20.0, 2.0),
                PositionSample::new(30.25, 3.0),
            ]
        );
    }

    #[test]
    fn scalar_cell_becomes_single_sample() {
        let x = RawField::from_cell(" 52.5 ");
        assert_eq!(x, RawField::Scalar(52.5));
        let samples = extract_samples(&x, &RawField::from(34.0)).unwrap();
        assert_eq!(samples, vec![PositionSample::new(52.5, 34.0)]);
    }

    #[test]
    fn trailing_separator_is_ignored() {
        let values = parse_coordinates(&RawField::from_cell("1;2;")).unwrap();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn mismatch_reports_lengths() {
        let err = extract_samples(&RawField::from_cell("1;2;3"), &RawField::from_cell("1;2"))
            .unwrap_err();
        assert_eq!(err, HeatmapError::CoordinateMismatch { x_len: 3, y_len: 2 });
    }

    #[test]
    fn mismatch_recovers_to_empty_set() {
        let out = extract_or_empty(&RawField::from_cell("1;2;3"), &RawField::from_cell("1;2"));
        assert!(out.samples.is_empty());
        assert!(matches!(
            out.warning,
            Some(HeatmapError::CoordinateMismatch { x_len: 3, y_len: 2 })
        ));
    }

    #[test]
    fn bad_token_is_reported() {
        let err = parse_coordinates(&RawField::from_cell("1;abc;3")).unwrap_err();
        assert_eq!(
            err,
            HeatmapError::InvalidToken {
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn native_sequences_pass_through() {
        let x = RawField::from(vec![1.0, 2.0]);
        let y = RawField::from(vec![3.0, 4.0]);
        assert_eq!(extract_samples(&x, &y).unwrap().len(), 2);
        assert!(RawField::Empty.is_empty());
        assert!(!RawField::Scalar(0.0).is_empty());
    }
}
