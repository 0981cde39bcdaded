use once_cell::sync::OnceCell;
use serde::Serialize;

pub const PITCH_LENGTH_M: f64 = 105.0;
pub const PITCH_WIDTH_M: f64 = 68.0;
pub const GOAL_WIDTH_M: f64 = 7.32;
pub const GOAL_DEPTH_M: f64 = 4.0;
pub const CENTRE_CIRCLE_RADIUS_M: f64 = 9.15;
pub const PENALTY_AREA_DEPTH_M: f64 = 16.5;
pub const PENALTY_AREA_WIDTH_M: f64 = 40.32;
pub const GOAL_AREA_DEPTH_M: f64 = 5.5;
pub const GOAL_AREA_WIDTH_M: f64 = 18.32;
pub const PENALTY_SPOT_DISTANCE_M: f64 = 11.0;
pub const SPOT_RADIUS_M: f64 = 0.4;

const LINE_WIDTH: f32 = 2.0;
const GOAL_LINE_WIDTH: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrokeStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ShapeKind {
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Rectangle { x: f64, y: f64, width: f64, height: f64 },
    Circle { cx: f64, cy: f64, radius: f64, filled: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub stroke_width: f32,
    pub style: StrokeStyle,
}

impl Shape {
    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            kind: ShapeKind::Line { x1, y1, x2, y2 },
            stroke_width: LINE_WIDTH,
            style: StrokeStyle::Solid,
        }
    }

    fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            kind: ShapeKind::Rectangle {
                x,
                y,
                width,
                height,
            },
            stroke_width: LINE_WIDTH,
            style: StrokeStyle::Solid,
        }
    }

    fn circle(cx: f64, cy: f64, radius: f64, filled: bool) -> Self {
        Self {
            kind: ShapeKind::Circle {
                cx,
                cy,
                radius,
                filled,
            },
            stroke_width: LINE_WIDTH,
            style: StrokeStyle::Solid,
        }
    }

    fn dashed(mut self) -> Self {
        self.style = StrokeStyle::Dashed;
        self
    }

    fn width(mut self, stroke_width: f32) -> Self {
        self.stroke_width = stroke_width;
        self
    }
}

/// Metre-space line drawing of a regulation pitch.
#[derive(Debug, Clone, Serialize)]
pub struct PitchGeometry {
    pub length_m: f64,
    pub width_m: f64,
    pub shapes: Vec<Shape>,
}

impl PitchGeometry {
    /// Extent of the drawing including the goals behind each line: (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            -GOAL_DEPTH_M,
            0.0,
            self.length_m + GOAL_DEPTH_M,
            self.width_m,
        )
    }
}

static REGULATION: OnceCell<PitchGeometry> = OnceCell::new();

pub fn regulation_pitch() -> &'static PitchGeometry {
    REGULATION.get_or_init(build_regulation_pitch)
}

fn build_regulation_pitch() -> PitchGeometry {
    let l = PITCH_LENGTH_M;
    let w = PITCH_WIDTH_M;
    let mid_y = w / 2.0;

    let mut shapes = vec![
        Shape::rect(0.0, 0.0, l, w),
        Shape::line(l / 2.0, 0.0, l / 2.0, w).dashed(),
        Shape::circle(l / 2.0, mid_y, CENTRE_CIRCLE_RADIUS_M, false),
        Shape::circle(l / 2.0, mid_y, SPOT_RADIUS_M, true),
    ];

    for (goal_line, inward) in [(0.0, 1.0), (l, -1.0)] {
        let box_x = |depth: f64| if inward > 0.0 { goal_line } else { goal_line - depth };
        shapes.push(Shape::rect(
            box_x(PENALTY_AREA_DEPTH_M),
            mid_y - PENALTY_AREA_WIDTH_M / 2.0,
            PENALTY_AREA_DEPTH_M,
            PENALTY_AREA_WIDTH_M,
        ));
        shapes.push(Shape::rect(
            box_x(GOAL_AREA_DEPTH_M),
            mid_y - GOAL_AREA_WIDTH_M / 2.0,
            GOAL_AREA_DEPTH_M,
            GOAL_AREA_WIDTH_M,
        ));
        shapes.push(Shape::circle(
            goal_line + inward * PENALTY_SPOT_DISTANCE_M,
            mid_y,
            SPOT_RADIUS_M,
            false,
        ));

        let back = goal_line - inward * GOAL_DEPTH_M;
        let post_low = mid_y - GOAL_WIDTH_M / 2.0;
        let post_high = mid_y + GOAL_WIDTH_M / 2.0;
        shapes.push(Shape::line(back, post_low, back, post_high).width(GOAL_LINE_WIDTH));
        shapes.push(Shape::line(goal_line, post_low, back, post_low).width(GOAL_LINE_WIDTH));
        shapes.push(Shape::line(goal_line, post_high, back, post_high).width(GOAL_LINE_WIDTH));
    }

    PitchGeometry {
        length_m: l,
        width_m: w,
        shapes,
    }
}

/// Maps metre-space to pixel-space at the rendering boundary.
///
/// Pixel y grows downwards, so metre y is flipped to keep the origin bottom-left.
#[derive(Debug, Clone, Copy)]
pub struct PixelTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub margin_px: f64,
    pub height_px: f64,
}

impl PixelTransform {
    pub fn new(width_px: u32, height_px: u32, pitch: &PitchGeometry, margin_px: u32) -> Self {
        Self {
            scale_x: width_px as f64 / pitch.length_m,
            scale_y: height_px as f64 / pitch.width_m,
            margin_px: margin_px as f64,
            height_px: height_px as f64,
        }
    }

    pub fn point(&self, x_m: f64, y_m: f64) -> (f32, f32) {
        let px = self.margin_px + x_m * self.scale_x;
        let py = self.margin_px + self.height_px - y_m * self.scale_y;
        (px as f32, py as f32)
    }

    pub fn length(&self, metres: f64) -> f32 {
        (metres * self.scale_x) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circles(pitch: &PitchGeometry) -> Vec<(f64, f64, f64)> {
        pitch
            .shapes
            .iter()
            .filter_map(|s| match s.kind {
                ShapeKind::Circle { cx, cy, radius, .. } => Some((cx, cy, radius)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn regulation_pitch_has_spots_and_centre_circle() {
        let pitch = regulation_pitch();
        let circles = circles(pitch);
        assert!(circles.contains(&(52.5, 34.0, 9.15)));
        assert!(circles.contains(&(11.0, 34.0, 0.4)));
        assert!(circles.contains(&(94.0, 34.0, 0.4)));
    }

    #[test]
    fn regulation_pitch_is_built_once() {
        assert!(std::ptr::eq(regulation_pitch(), regulation_pitch()));
    }

    #[test]
    fn penalty_areas_are_centred_on_goal_lines() {
        let pitch = regulation_pitch();
        let boxes: Vec<_> = pitch
            .shapes
            .iter()
            .filter_map(|s| match s.kind {
                ShapeKind::Rectangle {
                    x,
                    y,
                    width,
                    height,
                } if (width - PENALTY_AREA_DEPTH_M).abs() < 1e-9 => Some((x, y, height)),
                _ => None,
            })
            .collect();
        assert_eq!(boxes.len(), 2);
        for (x, y, height) in boxes {
            assert!((y - 13.84).abs() < 1e-9);
            assert!((height - 40.32).abs() < 1e-9);
            assert!(x == 0.0 || (x - 88.5).abs() < 1e-9);
        }
    }

    #[test]
    fn goals_sit_behind_the_lines() {
        let pitch = regulation_pitch();
        let backs: Vec<f64> = pitch
            .shapes
            .iter()
            .filter_map(|s| match s.kind {
                ShapeKind::Line { x1, x2, .. } if x1 == x2 && (x1 < 0.0 || x1 > 105.0) => Some(x1),
                _ => None,
            })
            .collect();
        assert_eq!(backs, vec![-4.0, 109.0]);
        assert_eq!(pitch.bounds(), (-4.0, 0.0, 109.0, 68.0));
    }

    #[test]
    fn transform_flips_y_and_applies_margin() {
        let pitch = regulation_pitch();
        let t = PixelTransform::new(945, 612, pitch, 10);
        assert_eq!(t.point(0.0, 0.0), (10.0, 622.0));
        assert_eq!(t.point(105.0, 68.0), (955.0, 10.0));
    }
}
