//! Elliptical arc math: center parameterization and cubic approximation.

use std::f64::consts::{FRAC_PI_2, TAU};

use tracing::trace;

use crate::error::DegenerateArc;
use crate::path::{Arc, Command, Cursor, Path, Segment};

/// Bezier control offset for a quarter circle, k = 0.551784777779014.
/// See https://pomax.github.io/bezierinfo/#circles_cubic
const QUARTER_CIRCLE_K: f64 = 0.551785;

/// Largest number of cubic segments per quarter turn `arc_to_cubics` emits.
pub const MAX_ARC_ACCURACY: u32 = 64;

/// Center parameterization of an elliptical arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCenterForm {
    pub cx: f64,
    pub cy: f64,
    /// Radii, enlarged if the endpoint radii were too small.
    pub rx: f64,
    pub ry: f64,
    /// Angle of the start point in the ellipse's frame, radians.
    pub start_angle: f64,
    /// Signed sweep, radians. Positive when the sweep flag is set.
    pub delta_angle: f64,
    /// Rotation of the ellipse frame in degrees. Zero for circles.
    pub rotation: f64,
}

/// Convert an arc from `from` to `arc.x, arc.y` into center form.
///
/// See section [B.2.4. Conversion from endpoint to center
/// parameterization](https://www.w3.org/TR/SVG2/implnote.html#ArcConversionEndpointToCenter)
pub fn to_center_form(from: (f64, f64), arc: &Arc) -> Result<ArcCenterForm, DegenerateArc> {
    let (x1, y1) = from;
    let (x2, y2) = (arc.x, arc.y);

    if arc.rx == 0.0 || arc.ry == 0.0 {
        return Err(DegenerateArc::ZeroRadius);
    }
    if x1 == x2 && y1 == y2 {
        return Err(DegenerateArc::CoincidentEndpoints);
    }

    let mut rx = arc.rx.abs();
    let mut ry = arc.ry.abs();

    // If rx == ry the rotation has no effect.
    let rotation = if rx == ry { 0.0 } else { arc.x_axis_rotation };
    let (sin_phi, cos_phi) = rotation.to_radians().sin_cos();

    // Translate to the midpoint of the chord and rotate into the ellipse frame.
    let mid_x = (x1 - x2) / 2.0;
    let mid_y = (y1 - y2) / 2.0;
    let x1_ = cos_phi * mid_x + sin_phi * mid_y;
    let y1_ = -sin_phi * mid_x + cos_phi * mid_y;

    // Ensure radii are large enough.
    let lambda = (x1_ / rx).powi(2) + (y1_ / ry).powi(2);
    if lambda > 1.0 {
        rx *= lambda.sqrt();
        ry *= lambda.sqrt();
    }

    // Transformed center (cx', cy').
    let d = (rx * y1_).powi(2) + (ry * x1_).powi(2);
    if d == 0.0 {
        return Err(DegenerateArc::CoincidentEndpoints);
    }
    let mut k = ((rx * ry).powi(2) / d - 1.0).abs().sqrt();
    if arc.large_arc == arc.sweep {
        k = -k;
    }
    let cx_ = k * rx * y1_ / ry;
    let cy_ = -k * ry * x1_ / rx;

    let cx = cos_phi * cx_ - sin_phi * cy_ + (x1 + x2) / 2.0;
    let cy = sin_phi * cx_ + cos_phi * cy_ + (y1 + y2) / 2.0;

    let u = ((x1_ - cx_) / rx, (y1_ - cy_) / ry);
    let v = ((-x1_ - cx_) / rx, (-y1_ - cy_) / ry);

    let start_angle = vector_angle((1.0, 0.0), u);
    let mut delta_angle = vector_angle(u, v);
    if arc.sweep && delta_angle < 0.0 {
        delta_angle += TAU;
    } else if !arc.sweep && delta_angle > 0.0 {
        delta_angle -= TAU;
    }

    Ok(ArcCenterForm {
        cx,
        cy,
        rx,
        ry,
        start_angle,
        delta_angle,
        rotation,
    })
}

/// Signed angle from `u` to `v`.
fn vector_angle(u: (f64, f64), v: (f64, f64)) -> f64 {
    let dot = u.0 * v.0 + u.1 * v.1;
    let len = ((u.0 * u.0 + u.1 * u.1) * (v.0 * v.0 + v.1 * v.1)).sqrt();
    let angle = (dot / len).clamp(-1.0, 1.0).acos();
    if u.0 * v.1 - u.1 * v.0 < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Approximate an arc with absolute cubic curves.
///
/// The sweep is split into one segment per started quarter turn, times
/// `accuracy` clamped to `1..=MAX_ARC_ACCURACY`. Returns an empty list for
/// arcs that have nothing to draw (zero radius, coincident endpoints, zero
/// sweep); the caller decides whether that means a line or nothing.
pub fn arc_to_cubics(from: (f64, f64), arc: &Arc, accuracy: u32) -> Vec<Segment> {
    let Ok(center) = to_center_form(from, arc) else {
        return Vec::new();
    };
    if center.delta_angle.abs() < 1e-12 {
        return Vec::new();
    }

    let accuracy = accuracy.clamp(1, MAX_ARC_ACCURACY);
    let quarters = ((center.delta_angle.abs() / FRAC_PI_2) - 1e-9).ceil().clamp(1.0, 4.0) as u32;
    let segments = quarters.saturating_mul(accuracy);
    let step = center.delta_angle / segments as f64;

    let k = if (step.abs() - FRAC_PI_2).abs() < 1e-12 {
        QUARTER_CIRCLE_K.copysign(step)
    } else {
        4.0 / 3.0 * (step / 4.0).tan()
    };

    let (sin_phi, cos_phi) = center.rotation.to_radians().sin_cos();
    let map = |(x, y): (f64, f64)| {
        let x = x * center.rx;
        let y = y * center.ry;
        (
            cos_phi * x - sin_phi * y + center.cx,
            sin_phi * x + cos_phi * y + center.cy,
        )
    };

    let mut curves = Vec::with_capacity(segments as usize);
    for i in 0..segments {
        let theta1 = center.start_angle + step * i as f64;
        let theta2 = theta1 + step;
        let (s1, c1) = theta1.sin_cos();
        let (s2, c2) = theta2.sin_cos();

        let (x1, y1) = map((c1 - s1 * k, s1 + c1 * k));
        let (x2, y2) = map((c2 + s2 * k, s2 - c2 * k));
        let (x, y) = if i + 1 == segments {
            // land exactly on the arc's endpoint
            (arc.x, arc.y)
        } else {
            map((c2, s2))
        };

        curves.push(Segment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    curves
}

/// Replace every arc in the path with cubic curves.
///
/// Arcs with zero radius become lines; arcs that draw nothing are dropped.
/// Consumes the path; the result is absolute longhand.
pub fn arcs_to_cubics(path: Path, accuracy: u32) -> Path {
    let path = if path.is_absolute_longhand() {
        path
    } else {
        path.into_absolute_longhand()
    };

    let mut commands = Vec::with_capacity(path.commands.len());
    let mut cursor = Cursor::default();

    for cmd in path.commands {
        if let Segment::Arc(arc) = cmd.segment {
            let curves = arc_to_cubics(cursor.current, &arc, accuracy);
            if curves.is_empty() {
                if cursor.current != (arc.x, arc.y) {
                    trace!(?arc, "degenerate arc replaced by line");
                    commands.push(Command::absolute(Segment::LineTo { x: arc.x, y: arc.y }));
                }
            } else {
                commands.extend(curves.into_iter().map(Command::absolute));
            }
        } else {
            commands.push(cmd);
        }
        cursor.advance(&cmd.segment);
    }

    Path { commands }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn arc(rx: f64, ry: f64, rotation: f64, large_arc: bool, sweep: bool, x: f64, y: f64) -> Arc {
        Arc {
            rx,
            ry,
            x_axis_rotation: rotation,
            large_arc,
            sweep,
            x,
            y,
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_center_form_semicircle() {
        let c = to_center_form((0.0, 0.0), &arc(10.0, 10.0, 0.0, false, true, 20.0, 0.0)).unwrap();
        assert_close(c.cx, 10.0);
        assert_close(c.cy, 0.0);
        assert_close(c.rx, 10.0);
        assert_close(c.start_angle.abs(), PI);
        assert_close(c.delta_angle, PI);
    }

    #[test]
    fn test_center_form_sweep_direction() {
        let a = to_center_form((10.0, 0.0), &arc(10.0, 10.0, 0.0, false, true, 0.0, 10.0)).unwrap();
        assert_close(a.cx, 0.0);
        assert_close(a.cy, 0.0);
        assert_close(a.delta_angle, FRAC_PI_2);

        let b = to_center_form((10.0, 0.0), &arc(10.0, 10.0, 0.0, false, false, 0.0, 10.0)).unwrap();
        assert_close(b.cx, 10.0);
        assert_close(b.cy, 10.0);
        assert_close(b.delta_angle, -FRAC_PI_2);

        let c = to_center_form((10.0, 0.0), &arc(10.0, 10.0, 0.0, true, true, 0.0, 10.0)).unwrap();
        assert_close(c.delta_angle, 3.0 * FRAC_PI_2);
    }

    #[test]
    fn test_center_form_corrects_small_radii() {
        let c = to_center_form((0.0, 0.0), &arc(5.0, 5.0, 0.0, false, true, 20.0, 0.0)).unwrap();
        assert_close(c.rx, 10.0);
        assert_close(c.ry, 10.0);
        assert_close(c.cx, 10.0);
    }

    #[test]
    fn test_center_form_degenerate() {
        assert_eq!(
            to_center_form((0.0, 0.0), &arc(0.0, 5.0, 0.0, false, true, 10.0, 0.0)),
            Err(DegenerateArc::ZeroRadius)
        );
        assert_eq!(
            to_center_form((3.0, 4.0), &arc(5.0, 5.0, 0.0, false, true, 3.0, 4.0)),
            Err(DegenerateArc::CoincidentEndpoints)
        );
    }

    #[test]
    fn test_center_form_circle_ignores_rotation() {
        let c = to_center_form((0.0, 0.0), &arc(10.0, 10.0, 45.0, false, true, 20.0, 0.0)).unwrap();
        assert_eq!(c.rotation, 0.0);

        let e = to_center_form((0.0, 0.0), &arc(20.0, 10.0, 45.0, false, true, 20.0, 0.0)).unwrap();
        assert_eq!(e.rotation, 45.0);
    }

    #[test]
    fn test_quarter_circle_uses_constant() {
        let curves = arc_to_cubics((10.0, 0.0), &arc(10.0, 10.0, 0.0, false, true, 0.0, 10.0), 1);
        assert_eq!(curves.len(), 1);
        let Segment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } = curves[0]
        else {
            panic!("Expected CurveTo");
        };
        assert_close(x1, 10.0);
        assert_close(y1, 5.51785);
        assert_close(x2, 5.51785);
        assert_close(y2, 10.0);
        assert_eq!((x, y), (0.0, 10.0));
    }

    #[test]
    fn test_segment_count() {
        let half = arc(10.0, 10.0, 0.0, false, true, 20.0, 0.0);
        assert_eq!(arc_to_cubics((0.0, 0.0), &half, 1).len(), 2);
        assert_eq!(arc_to_cubics((0.0, 0.0), &half, 3).len(), 6);

        let three_quarters = arc(10.0, 10.0, 0.0, true, true, 0.0, 10.0);
        assert_eq!(arc_to_cubics((10.0, 0.0), &three_quarters, 1).len(), 3);
    }

    #[test]
    fn test_huge_accuracy_is_capped() {
        let half = arc(10.0, 10.0, 0.0, false, true, 20.0, 0.0);
        let curves = arc_to_cubics((0.0, 0.0), &half, u32::MAX);
        assert_eq!(curves.len(), 2 * MAX_ARC_ACCURACY as usize);
        assert!(matches!(
            curves.last(),
            Some(Segment::CurveTo { x, y, .. }) if (*x, *y) == (20.0, 0.0)
        ));
    }

    #[test]
    fn test_curve_points_lie_on_ellipse() {
        let a = arc(20.0, 10.0, 30.0, false, true, 15.0, 12.0);
        let center = to_center_form((0.0, 0.0), &a).unwrap();
        let (sin_phi, cos_phi) = center.rotation.to_radians().sin_cos();

        for curve in arc_to_cubics((0.0, 0.0), &a, 2) {
            let Segment::CurveTo { x, y, .. } = curve else {
                panic!("Expected CurveTo");
            };
            let dx = x - center.cx;
            let dy = y - center.cy;
            let u = (cos_phi * dx + sin_phi * dy) / center.rx;
            let v = (-sin_phi * dx + cos_phi * dy) / center.ry;
            assert_close(u * u + v * v, 1.0);
        }
    }

    #[test]
    fn test_degenerate_arc_gives_no_curves() {
        assert!(arc_to_cubics((0.0, 0.0), &arc(0.0, 0.0, 0.0, false, true, 10.0, 0.0), 1).is_empty());
        assert!(arc_to_cubics((1.0, 1.0), &arc(5.0, 5.0, 0.0, false, true, 1.0, 1.0), 1).is_empty());
    }

    #[test]
    fn test_arcs_to_cubics_path() {
        let path = Path::new(vec![
            Command::absolute(Segment::MoveTo { x: 0.0, y: 0.0 }),
            Command::absolute(Segment::Arc(arc(10.0, 10.0, 0.0, false, true, 20.0, 0.0))),
            Command::absolute(Segment::Arc(arc(10.0, 10.0, 0.0, false, true, 20.0, 0.0))),
            Command::absolute(Segment::ClosePath),
        ]);
        let out = arcs_to_cubics(path, 1);
        let kinds: Vec<_> = out.iter().map(|c| c.kind().letter()).collect();
        // the second arc starts and ends at the same point and is dropped
        assert_eq!(kinds, vec!['M', 'C', 'C', 'Z']);
    }
}
