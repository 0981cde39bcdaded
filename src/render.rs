use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

use crate::heatmap::{HeatmapView, NormalizedRaster};
use crate::pitch::{PitchGeometry, PixelTransform, Shape, ShapeKind, StrokeStyle};

pub const MARGIN_PX: u32 = 45;
pub const HEAT_ALPHA: f64 = 0.8;
pub const HEAT_LEVELS: usize = 5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const DASH_PX: f32 = 12.0;

// Diverging blue -> light grey -> red, sampled from the coolwarm scale.
const COOL: [f64; 3] = [59.0, 76.0, 192.0];
const MID: [f64; 3] = [221.0, 221.0, 221.0];
const WARM: [f64; 3] = [180.0, 4.0, 38.0];

/// Colour for a normalized cell, or `None` when it should stay transparent.
pub fn heat_color(value: f64, threshold: f64) -> Option<Rgb<u8>> {
    if !(value >= threshold) {
        return None;
    }
    let t = value.clamp(0.0, 1.0);
    let (from, to, local) = if t < 0.5 {
        (COOL, MID, t / 0.5)
    } else {
        (MID, WARM, (t - 0.5) / 0.5)
    };
    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let heat = from[c] + (to[c] - from[c]) * local;
        let blended = HEAT_ALPHA * heat + (1.0 - HEAT_ALPHA) * BACKGROUND.0[c] as f64;
        *slot = blended.round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgb(out))
}

/// Discrete intensity level in `0..HEAT_LEVELS` for coarse surfaces such as a terminal canvas.
pub fn heat_level(value: f64, threshold: f64) -> Option<usize> {
    if !(value >= threshold) {
        return None;
    }
    let level = (value.clamp(0.0, 1.0) * HEAT_LEVELS as f64).floor() as usize;
    Some(level.min(HEAT_LEVELS - 1))
}

/// Downsamples a raster into metre-space points grouped by heat level, for coarse surfaces.
pub fn heat_buckets(view: &HeatmapView, block_px: usize) -> Vec<Vec<(f64, f64)>> {
    let raster = &view.raster;
    let block = block_px.max(1);
    let m_per_px_x = view.config.pitch_length_m / raster.width() as f64;
    let m_per_px_y = view.config.pitch_width_m / raster.height() as f64;
    let mut buckets = vec![Vec::new(); HEAT_LEVELS];
    for j in (0..raster.height()).step_by(block) {
        for i in (0..raster.width()).step_by(block) {
            let mean = raster.block_mean(i, j, block, block);
            if let Some(level) = heat_level(mean, raster.threshold) {
                let x = (i as f64 + block as f64 / 2.0) * m_per_px_x;
                let y = (j as f64 + block as f64 / 2.0) * m_per_px_y;
                buckets[level].push((x, y));
            }
        }
    }
    buckets
}

pub fn render_image(view: &HeatmapView) -> RgbImage {
    let raster = &view.raster;
    let w = raster.width() as u32;
    let h = raster.height() as u32;
    let mut img = RgbImage::from_pixel(w + 2 * MARGIN_PX, h + 2 * MARGIN_PX, BACKGROUND);

    paint_raster(&mut img, raster);
    let transform = PixelTransform::new(w, h, view.pitch, MARGIN_PX);
    draw_pitch(&mut img, view.pitch, &transform);
    img
}

fn paint_raster(img: &mut RgbImage, raster: &NormalizedRaster) {
    let h = raster.height();
    for j in 0..h {
        let py = MARGIN_PX + (h - 1 - j) as u32;
        for i in 0..raster.width() {
            let Some(value) = raster.get(i, j) else {
                continue;
            };
            if let Some(color) = heat_color(value, raster.threshold) {
                img.put_pixel(MARGIN_PX + i as u32, py, color);
            }
        }
    }
}

pub fn draw_pitch(img: &mut RgbImage, pitch: &PitchGeometry, transform: &PixelTransform) {
    for shape in &pitch.shapes {
        draw_shape(img, shape, transform);
    }
}

fn draw_shape(img: &mut RgbImage, shape: &Shape, t: &PixelTransform) {
    let thickness = shape.stroke_width.round().max(1.0) as i32;
    match shape.kind {
        ShapeKind::Line { x1, y1, x2, y2 } => {
            let a = t.point(x1, y1);
            let b = t.point(x2, y2);
            for offset in stroke_offsets(thickness) {
                let (a, b) = offset_segment(a, b, offset);
                match shape.style {
                    StrokeStyle::Solid => draw_line_segment_mut(img, a, b, LINE_COLOR),
                    StrokeStyle::Dashed => draw_dashed(img, a, b),
                }
            }
        }
        ShapeKind::Rectangle {
            x,
            y,
            width,
            height,
        } => {
            // Top-left in pixel space is the metre-space top edge after the y flip.
            let (px, py) = t.point(x, y + height);
            let pw = t.length(width).round().max(1.0) as u32;
            let ph = (height * t.scale_y).round().max(1.0) as u32;
            for k in 0..thickness {
                if pw <= 2 * k as u32 || ph <= 2 * k as u32 {
                    break;
                }
                let rect = Rect::at(px.round() as i32 + k, py.round() as i32 + k)
                    .of_size(pw - 2 * k as u32, ph - 2 * k as u32);
                draw_hollow_rect_mut(img, rect, LINE_COLOR);
            }
        }
        ShapeKind::Circle {
            cx,
            cy,
            radius,
            filled,
        } => {
            let (px, py) = t.point(cx, cy);
            let center = (px.round() as i32, py.round() as i32);
            let r = t.length(radius).round().max(1.0) as i32;
            if filled {
                draw_filled_circle_mut(img, center, r, LINE_COLOR);
            } else {
                for k in 0..thickness {
                    if r - k <= 0 {
                        break;
                    }
                    draw_hollow_circle_mut(img, center, r - k, LINE_COLOR);
                }
            }
        }
    }
}

fn stroke_offsets(thickness: i32) -> impl Iterator<Item = f32> {
    let half = (thickness - 1) as f32 / 2.0;
    (0..thickness).map(move |k| k as f32 - half)
}

fn offset_segment(a: (f32, f32), b: (f32, f32), offset: f32) -> ((f32, f32), (f32, f32)) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return (a, b);
    }
    let (nx, ny) = (-dy / len * offset, dx / len * offset);
    ((a.0 + nx, a.1 + ny), (b.0 + nx, b.1 + ny))
}

fn draw_dashed(img: &mut RgbImage, a: (f32, f32), b: (f32, f32)) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return;
    }
    let (ux, uy) = (dx / len, dy / len);
    let mut s = 0.0;
    while s < len {
        let e = (s + DASH_PX).min(len);
        draw_line_segment_mut(
            img,
            (a.0 + ux * s, a.1 + uy * s),
            (a.0 + ux * e, a.1 + uy * e),
            LINE_COLOR,
        );
        s += 2.0 * DASH_PX;
    }
}

pub fn encode_png(view: &HeatmapView) -> Result<Vec<u8>> {
    let img = render_image(view);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .context("encode heat map png")?;
    Ok(buf.into_inner())
}

pub fn save_png(view: &HeatmapView, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    render_image(view)
        .save(path)
        .with_context(|| format!("write heat map {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::{HeatmapPipeline, RasterConfig};
    use crate::positions::RawField;

    #[test]
    fn below_threshold_is_transparent() {
        assert!(heat_color(0.005, 0.01).is_none());
        assert!(heat_color(f64::NAN, 0.01).is_none());
        assert!(heat_level(0.0, 0.01).is_none());
    }

    #[test]
    fn scale_runs_cool_to_warm() {
        let low = heat_color(0.02, 0.01).unwrap();
        let high = heat_color(1.0, 0.01).unwrap();
        assert!(low.0[2] > low.0[0]);
        assert!(high.0[0] > high.0[2]);
        assert_eq!(heat_level(1.0, 0.01), Some(HEAT_LEVELS - 1));
    }

    #[test]
    fn rendered_image_has_margins_and_hot_centre() {
        let view = HeatmapPipeline::new(RasterConfig {
            width_px: 210,
            height_px: 136,
            ..RasterConfig::default()
        })
        .run(&RawField::from_cell("30"), &RawField::from_cell("20"))
        .unwrap();
        let img = render_image(&view);
        assert_eq!(img.dimensions(), (210 + 2 * MARGIN_PX, 136 + 2 * MARGIN_PX));
        // (30 m, 20 m) lands on raster cell (60, 40).
        let hot = img.get_pixel(MARGIN_PX + 60, MARGIN_PX + (136 - 1 - 40));
        assert_eq!(*hot, heat_color(1.0, 0.01).unwrap());
        assert_eq!(*img.get_pixel(1, 1), BACKGROUND);
    }

    #[test]
    fn buckets_put_hottest_block_near_sample() {
        let view = HeatmapPipeline::new(RasterConfig {
            width_px: 210,
            height_px: 136,
            ..RasterConfig::default()
        })
        .run(&RawField::from_cell("30"), &RawField::from_cell("20"))
        .unwrap();
        let buckets = heat_buckets(&view, 4);
        assert_eq!(buckets.len(), HEAT_LEVELS);
        let hottest = buckets.iter().rev().find(|b| !b.is_empty()).unwrap();
        for (x, y) in hottest {
            assert!((x - 30.0).abs() < 3.0 && (y - 20.0).abs() < 3.0);
        }
    }

    #[test]
    fn png_encoding_produces_signature() {
        let view = HeatmapPipeline::new(RasterConfig {
            width_px: 105,
            height_px: 68,
            ..RasterConfig::default()
        })
        .run(&RawField::Empty, &RawField::Empty)
        .unwrap();
        let bytes = encode_png(&view).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }
}
