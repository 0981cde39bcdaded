//! Gaussian density rasterization of on-field positions.
//!
//! Samples are mapped from metres onto a fixed pixel grid, each one deposits an
//! isotropic Gaussian, and the accumulated grid is rescaled into `[0, 1]` for
//! display. Rasters are allocated per call and never shared.

use serde::Serialize;

use crate::error::HeatmapError;
use crate::pitch::{self, PitchGeometry};
use crate::positions::{self, PositionSample, RawField};

pub const DEFAULT_WIDTH_PX: usize = 945;
pub const DEFAULT_HEIGHT_PX: usize = 612;
pub const DEFAULT_INFLUENCE_RADIUS_M: f64 = 1.0;
pub const DEFAULT_WINDOW_SIGMAS: f64 = 4.0;
pub const VISIBILITY_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterConfig {
    pub width_px: usize,
    pub height_px: usize,
    pub pitch_length_m: f64,
    pub pitch_width_m: f64,
    pub influence_radius_m: f64,
    /// Kernel support in sigmas; `None` evaluates every sample over the whole grid.
    pub window_sigmas: Option<f64>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_WIDTH_PX,
            height_px: DEFAULT_HEIGHT_PX,
            pitch_length_m: pitch::PITCH_LENGTH_M,
            pitch_width_m: pitch::PITCH_WIDTH_M,
            influence_radius_m: DEFAULT_INFLUENCE_RADIUS_M,
            window_sigmas: Some(DEFAULT_WINDOW_SIGMAS),
        }
    }
}

impl RasterConfig {
    pub fn validate(&self) -> Result<(), HeatmapError> {
        positive("grid width", self.width_px as f64)?;
        positive("grid height", self.height_px as f64)?;
        positive("pitch length", self.pitch_length_m)?;
        positive("pitch width", self.pitch_width_m)?;
        positive("influence radius", self.influence_radius_m)?;
        if let Some(window) = self.window_sigmas {
            positive("kernel window", window)?;
        }
        Ok(())
    }

    /// Influence radius in pixels. The horizontal metres-per-pixel scale is used for both axes.
    pub fn sigma_px(&self) -> f64 {
        self.influence_radius_m / (self.pitch_length_m / self.width_px as f64)
    }

    /// Pixel cell for a sample, or `None` when it lies off the pitch.
    ///
    /// Samples on the far touchline or goal line round to one past the last
    /// cell and are pulled back onto the edge row or column.
    pub fn to_pixel(&self, sample: PositionSample) -> Option<(usize, usize)> {
        let on_pitch = |v: f64, extent: f64| v.is_finite() && (0.0..=extent).contains(&v);
        if !on_pitch(sample.x, self.pitch_length_m) || !on_pitch(sample.y, self.pitch_width_m) {
            return None;
        }
        let x_px = (sample.x / self.pitch_length_m * self.width_px as f64).round() as usize;
        let y_px = (sample.y / self.pitch_width_m * self.height_px as f64).round() as usize;
        Some((x_px.min(self.width_px - 1), y_px.min(self.height_px - 1)))
    }
}

fn positive(what: &'static str, value: f64) -> Result<(), HeatmapError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HeatmapError::DegenerateScale { what, value })
    }
}

/// Accumulated Gaussian influence, indexed `[i, j]` with `i` along the pitch length.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    pub deposited: usize,
    pub skipped: usize,
}

impl Raster {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
            deposited: 0,
            skipped: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, i: usize, j: usize) -> usize {
        j * self.width + i
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.width || j >= self.height {
            return None;
        }
        Some(self.cells[self.index(i, j)])
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(0.0_f64, f64::max)
    }

    /// Cell holding the largest value; the first one wins on ties.
    pub fn peak(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, value) in self.cells.iter().copied().enumerate() {
            if best.is_none_or(|(_, b)| value > b) {
                best = Some((idx, value));
            }
        }
        best.map(|(idx, _)| (idx % self.width, idx / self.width))
    }

    fn deposit(&mut self, center: (usize, usize), sigma_px: f64, window_sigmas: Option<f64>) {
        let (cx, cy) = center;
        let two_sigma_sq = 2.0 * sigma_px * sigma_px;
        let (i0, i1, j0, j1) = match window_sigmas {
            Some(k) => {
                // Past the grid extent the window already covers every cell.
                let reach = (k * sigma_px).ceil().min(self.width.max(self.height) as f64) as usize;
                (
                    cx.saturating_sub(reach),
                    (cx + reach).min(self.width - 1),
                    cy.saturating_sub(reach),
                    (cy + reach).min(self.height - 1),
                )
            }
            None => (0, self.width - 1, 0, self.height - 1),
        };

        for j in j0..=j1 {
            let dy = j as f64 - cy as f64;
            let row = j * self.width;
            for i in i0..=i1 {
                let dx = i as f64 - cx as f64;
                self.cells[row + i] += (-(dx * dx + dy * dy) / two_sigma_sq).exp();
            }
        }
    }
}

pub fn rasterize(samples: &[PositionSample], config: &RasterConfig) -> Result<Raster, HeatmapError> {
    config.validate()?;
    let mut raster = Raster::zeros(config.width_px, config.height_px);
    let sigma_px = config.sigma_px();

    for sample in samples {
        match config.to_pixel(*sample) {
            Some(center) => {
                raster.deposit(center, sigma_px, config.window_sigmas);
                raster.deposited += 1;
            }
            None => raster.skipped += 1,
        }
    }

    if raster.skipped > 0 {
        log::debug!(
            "rasterize: skipped {} out-of-bounds samples of {}",
            raster.skipped,
            samples.len()
        );
    }
    Ok(raster)
}

/// Raster rescaled into `[0, 1]`, with a visibility cutoff for transparent rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRaster {
    raster: Raster,
    pub threshold: f64,
    pub source_max: f64,
}

impl NormalizedRaster {
    pub fn width(&self) -> usize {
        self.raster.width
    }

    pub fn height(&self) -> usize {
        self.raster.height
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.raster.get(i, j)
    }

    pub fn max(&self) -> f64 {
        self.raster.max()
    }

    pub fn peak(&self) -> Option<(usize, usize)> {
        self.raster.peak()
    }

    pub fn cells(&self) -> &[f64] {
        self.raster.cells()
    }

    pub fn is_empty(&self) -> bool {
        self.source_max <= 0.0
    }

    pub fn is_visible(&self, i: usize, j: usize) -> bool {
        self.get(i, j).is_some_and(|v| v >= self.threshold)
    }

    /// Mean value over `block × block` cells, used to downsample for coarse surfaces.
    pub fn block_mean(&self, i: usize, j: usize, block_w: usize, block_h: usize) -> f64 {
        let i1 = (i + block_w.max(1)).min(self.width());
        let j1 = (j + block_h.max(1)).min(self.height());
        let mut sum = 0.0;
        let mut n = 0usize;
        for jj in j..j1 {
            for ii in i..i1 {
                sum += self.raster.cells[self.raster.index(ii, jj)];
                n += 1;
            }
        }
        if n == 0 { 0.0 } else { sum / n as f64 }
    }
}

pub fn normalize(mut raster: Raster, threshold: f64) -> NormalizedRaster {
    let max = raster.max();
    if max > 0.0 {
        for cell in &mut raster.cells {
            *cell /= max;
        }
    }
    NormalizedRaster {
        raster,
        threshold,
        source_max: max,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapSummary {
    pub width_px: usize,
    pub height_px: usize,
    pub sigma_px: f64,
    pub deposited: usize,
    pub skipped: usize,
    pub peak_px: Option<(usize, usize)>,
    pub visible_fraction: f64,
    pub warnings: Vec<String>,
}

/// Everything a rendering surface needs for one player-session heat map.
#[derive(Debug, Clone)]
pub struct HeatmapView {
    pub raster: NormalizedRaster,
    pub pitch: &'static PitchGeometry,
    pub config: RasterConfig,
    pub deposited: usize,
    pub skipped: usize,
    pub warnings: Vec<HeatmapError>,
}

impl HeatmapView {
    pub fn summary(&self) -> HeatmapSummary {
        let visible = self
            .raster
            .cells()
            .iter()
            .filter(|v| **v >= self.raster.threshold)
            .count();
        let total = self.raster.cells().len().max(1);
        HeatmapSummary {
            width_px: self.raster.width(),
            height_px: self.raster.height(),
            sigma_px: self.config.sigma_px(),
            deposited: self.deposited,
            skipped: self.skipped,
            peak_px: if self.raster.is_empty() {
                None
            } else {
                self.raster.peak()
            },
            visible_fraction: visible as f64 / total as f64,
            warnings: self.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeatmapPipeline {
    pub config: RasterConfig,
    pub threshold: f64,
}

impl Default for HeatmapPipeline {
    fn default() -> Self {
        Self {
            config: RasterConfig::default(),
            threshold: VISIBILITY_THRESHOLD,
        }
    }
}

impl HeatmapPipeline {
    pub fn new(config: RasterConfig) -> Self {
        Self {
            config,
            threshold: VISIBILITY_THRESHOLD,
        }
    }

    /// Extract → rasterize → normalize → attach overlay. Only a bad scale is an error.
    pub fn run(&self, x: &RawField, y: &RawField) -> Result<HeatmapView, HeatmapError> {
        self.config.validate()?;
        let extraction = positions::extract_or_empty(x, y);
        let mut warnings: Vec<HeatmapError> = extraction.warning.into_iter().collect();

        let raster = rasterize(&extraction.samples, &self.config)?;
        if raster.deposited == 0 && warnings.is_empty() {
            warnings.push(HeatmapError::EmptySampleSet);
        }
        let (deposited, skipped) = (raster.deposited, raster.skipped);

        Ok(HeatmapView {
            raster: normalize(raster, self.threshold),
            pitch: pitch::regulation_pitch(),
            config: self.config,
            deposited,
            skipped,
            warnings,
        })
    }
}
