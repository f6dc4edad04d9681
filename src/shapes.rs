//! Lowering of basic shapes to path data.
//!
//! See https://www.w3.org/TR/SVG2/shapes.html for the equivalent path of
//! each shape.

use std::str::FromStr;

use crate::error::FlattenError;
use crate::parse::{parse_numbers, parse_points};
use crate::path::{Arc, Command, Path, Segment};

/// A basic shape with already-resolved attribute values.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        /// A missing radius copies the other one.
        rx: Option<f64>,
        ry: Option<f64>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Polyline(Vec<(f64, f64)>),
    Polygon(Vec<(f64, f64)>),
}

impl Shape {
    /// The element name of this shape.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Rect { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Line { .. } => "line",
            Shape::Polyline(_) => "polyline",
            Shape::Polygon(_) => "polygon",
        }
    }

    /// Build the equivalent path.
    ///
    /// A zero size or radius, or an empty point list, disables rendering and
    /// gives an empty path. Negative sizes and radii are errors.
    pub fn to_path(&self) -> Result<Path, FlattenError> {
        let commands = match *self {
            Shape::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                let width = non_negative("width", width)?;
                let height = non_negative("height", height)?;
                let rx = rx.map(|r| non_negative("rx", r)).transpose()?;
                let ry = ry.map(|r| non_negative("ry", r)).transpose()?;
                if width == 0.0 || height == 0.0 {
                    return Ok(Path::default());
                }
                let (rx, ry) = match (rx, ry) {
                    (None, None) => (0.0, 0.0),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (Some(rx), Some(ry)) => (rx, ry),
                };
                rect(x, y, width, height, rx.min(width / 2.0), ry.min(height / 2.0))
            }
            Shape::Circle { cx, cy, r } => {
                let r = non_negative("r", r)?;
                if r == 0.0 {
                    return Ok(Path::default());
                }
                ellipse(cx, cy, r, r)
            }
            Shape::Ellipse { cx, cy, rx, ry } => {
                let rx = non_negative("rx", rx)?;
                let ry = non_negative("ry", ry)?;
                if rx == 0.0 || ry == 0.0 {
                    return Ok(Path::default());
                }
                ellipse(cx, cy, rx, ry)
            }
            Shape::Line { x1, y1, x2, y2 } => vec![
                Segment::MoveTo { x: x1, y: y1 },
                Segment::LineTo { x: x2, y: y2 },
            ],
            Shape::Polyline(ref points) => poly(points, false),
            Shape::Polygon(ref points) => poly(points, true),
        };

        Ok(Path::new(commands.into_iter().map(Command::absolute).collect()))
    }
}

fn non_negative(attr: &str, value: f64) -> Result<f64, FlattenError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FlattenError::InvalidShape(format!(
            "{attr} must be a non-negative number, got {value}"
        )))
    }
}

fn corner(rx: f64, ry: f64, x: f64, y: f64) -> Segment {
    Segment::Arc(Arc {
        rx,
        ry,
        x_axis_rotation: 0.0,
        large_arc: false,
        sweep: true,
        x,
        y,
    })
}

fn rect(x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> Vec<Segment> {
    if rx == 0.0 || ry == 0.0 {
        return vec![
            Segment::MoveTo { x, y },
            Segment::HorizontalTo { x: x + w },
            Segment::VerticalTo { y: y + h },
            Segment::HorizontalTo { x },
            Segment::ClosePath,
        ];
    }

    vec![
        Segment::MoveTo { x: x + rx, y },
        Segment::HorizontalTo { x: x + w - rx },
        corner(rx, ry, x + w, y + ry),
        Segment::VerticalTo { y: y + h - ry },
        corner(rx, ry, x + w - rx, y + h),
        Segment::HorizontalTo { x: x + rx },
        corner(rx, ry, x, y + h - ry),
        Segment::VerticalTo { y: y + ry },
        corner(rx, ry, x + rx, y),
        Segment::ClosePath,
    ]
}

/// Two half-ellipse arcs, starting and ending at the rightmost point.
fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Segment> {
    let half = |x: f64| {
        Segment::Arc(Arc {
            rx,
            ry,
            x_axis_rotation: 0.0,
            large_arc: true,
            sweep: true,
            x,
            y: cy,
        })
    };
    vec![
        Segment::MoveTo { x: cx + rx, y: cy },
        half(cx - rx),
        half(cx + rx),
    ]
}

fn poly(points: &[(f64, f64)], close: bool) -> Vec<Segment> {
    let Some((&(x, y), rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut segments = vec![Segment::MoveTo { x, y }];
    segments.extend(rest.iter().map(|&(x, y)| Segment::LineTo { x, y }));
    if close {
        segments.push(Segment::ClosePath);
    }
    segments
}

impl FromStr for Shape {
    type Err = FlattenError;

    /// Parse a one-line descriptor: the shape name followed by its values,
    /// e.g. `circle 50 50 40`, `rect 0 0 10 10 2`, `polygon 0,0 10,0 10,10`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));

        let shape = match name {
            "polyline" => Shape::Polyline(parse_points(rest)?),
            "polygon" => Shape::Polygon(parse_points(rest)?),
            "rect" => match parse_numbers(rest)?[..] {
                [x, y, width, height] => Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                    rx: None,
                    ry: None,
                },
                [x, y, width, height, r] => Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                    rx: Some(r),
                    ry: None,
                },
                [x, y, width, height, rx, ry] => Shape::Rect {
                    x,
                    y,
                    width,
                    height,
                    rx: Some(rx),
                    ry: Some(ry),
                },
                ref values => return Err(wrong_count(name, "4 to 6", values.len())),
            },
            "circle" => match parse_numbers(rest)?[..] {
                [cx, cy, r] => Shape::Circle { cx, cy, r },
                ref values => return Err(wrong_count(name, "3", values.len())),
            },
            "ellipse" => match parse_numbers(rest)?[..] {
                [cx, cy, rx, ry] => Shape::Ellipse { cx, cy, rx, ry },
                ref values => return Err(wrong_count(name, "4", values.len())),
            },
            "line" => match parse_numbers(rest)?[..] {
                [x1, y1, x2, y2] => Shape::Line { x1, y1, x2, y2 },
                ref values => return Err(wrong_count(name, "4", values.len())),
            },
            other => {
                return Err(FlattenError::InvalidShape(format!("unknown shape: {other:?}")));
            }
        };

        Ok(shape)
    }
}

fn wrong_count(name: &str, expected: &str, found: usize) -> FlattenError {
    FlattenError::InvalidShape(format!("{name} takes {expected} numbers, got {found}"))
}
