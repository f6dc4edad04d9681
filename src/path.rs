//! SVG path data model.
//!
//! SVG path syntax: https://www.w3.org/TR/SVG/paths.html

use std::ops::Deref;

use serde::Serialize;

/// A parsed SVG path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path {
    pub commands: Vec<Command>,
}

/// Whether a command's coordinates are absolute or relative to the current point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Absolute,
    Relative,
}

/// A path command: a segment plus the coordinate mode it is written in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Command {
    pub mode: Mode,
    #[serde(flatten)]
    pub segment: Segment,
}

/// The geometry of a path command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// M/m - Move to
    MoveTo { x: f64, y: f64 },
    /// L/l - Line to
    LineTo { x: f64, y: f64 },
    /// H/h - Horizontal line to
    HorizontalTo { x: f64 },
    /// V/v - Vertical line to
    VerticalTo { y: f64 },
    /// C/c - Cubic bezier
    CurveTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    /// S/s - Smooth cubic bezier
    SmoothCurveTo { x2: f64, y2: f64, x: f64, y: f64 },
    /// Q/q - Quadratic bezier
    QuadTo { x1: f64, y1: f64, x: f64, y: f64 },
    /// T/t - Smooth quadratic bezier
    SmoothQuadTo { x: f64, y: f64 },
    /// A/a - Arc
    Arc(Arc),
    /// Z/z - Close path
    ClosePath,
}

/// Operands of an elliptical arc in endpoint form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arc {
    pub rx: f64,
    pub ry: f64,
    /// Rotation of the ellipse's x-axis, in degrees.
    pub x_axis_rotation: f64,
    pub large_arc: bool,
    pub sweep: bool,
    pub x: f64,
    pub y: f64,
}

/// The kind of a command, without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    MoveTo,
    LineTo,
    HorizontalTo,
    VerticalTo,
    CurveTo,
    SmoothCurveTo,
    QuadTo,
    SmoothQuadTo,
    Arc,
    ClosePath,
}

impl Kind {
    /// Map a path-data letter (either case) to a kind.
    pub fn from_letter(c: char) -> Option<Kind> {
        Some(match c.to_ascii_uppercase() {
            'M' => Kind::MoveTo,
            'L' => Kind::LineTo,
            'H' => Kind::HorizontalTo,
            'V' => Kind::VerticalTo,
            'C' => Kind::CurveTo,
            'S' => Kind::SmoothCurveTo,
            'Q' => Kind::QuadTo,
            'T' => Kind::SmoothQuadTo,
            'A' => Kind::Arc,
            'Z' => Kind::ClosePath,
            _ => return None,
        })
    }

    /// The uppercase letter of this kind.
    pub fn letter(self) -> char {
        match self {
            Kind::MoveTo => 'M',
            Kind::LineTo => 'L',
            Kind::HorizontalTo => 'H',
            Kind::VerticalTo => 'V',
            Kind::CurveTo => 'C',
            Kind::SmoothCurveTo => 'S',
            Kind::QuadTo => 'Q',
            Kind::SmoothQuadTo => 'T',
            Kind::Arc => 'A',
            Kind::ClosePath => 'Z',
        }
    }

    /// Number of operands a command of this kind takes.
    pub fn arity(self) -> usize {
        match self {
            Kind::MoveTo | Kind::LineTo | Kind::SmoothQuadTo => 2,
            Kind::HorizontalTo | Kind::VerticalTo => 1,
            Kind::CurveTo => 6,
            Kind::SmoothCurveTo | Kind::QuadTo => 4,
            Kind::Arc => 7,
            Kind::ClosePath => 0,
        }
    }
}

/// Fixed-capacity operand list, at most seven numbers (arcs).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operands {
    buf: [f64; 7],
    len: usize,
}

impl Operands {
    fn new(values: &[f64]) -> Self {
        let mut buf = [0.0; 7];
        buf[..values.len()].copy_from_slice(values);
        Self {
            buf,
            len: values.len(),
        }
    }
}

impl Deref for Operands {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.buf[..self.len]
    }
}

impl Segment {
    pub fn kind(&self) -> Kind {
        match self {
            Segment::MoveTo { .. } => Kind::MoveTo,
            Segment::LineTo { .. } => Kind::LineTo,
            Segment::HorizontalTo { .. } => Kind::HorizontalTo,
            Segment::VerticalTo { .. } => Kind::VerticalTo,
            Segment::CurveTo { .. } => Kind::CurveTo,
            Segment::SmoothCurveTo { .. } => Kind::SmoothCurveTo,
            Segment::QuadTo { .. } => Kind::QuadTo,
            Segment::SmoothQuadTo { .. } => Kind::SmoothQuadTo,
            Segment::Arc(_) => Kind::Arc,
            Segment::ClosePath => Kind::ClosePath,
        }
    }

    /// The operands in path-data order. Arc flags are `0.0` or `1.0`.
    pub fn operands(&self) -> Operands {
        match *self {
            Segment::MoveTo { x, y } | Segment::LineTo { x, y } | Segment::SmoothQuadTo { x, y } => {
                Operands::new(&[x, y])
            }
            Segment::HorizontalTo { x } => Operands::new(&[x]),
            Segment::VerticalTo { y } => Operands::new(&[y]),
            Segment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => Operands::new(&[x1, y1, x2, y2, x, y]),
            Segment::SmoothCurveTo { x2, y2, x, y } => Operands::new(&[x2, y2, x, y]),
            Segment::QuadTo { x1, y1, x, y } => Operands::new(&[x1, y1, x, y]),
            Segment::Arc(arc) => Operands::new(&[
                arc.rx,
                arc.ry,
                arc.x_axis_rotation,
                flag(arc.large_arc),
                flag(arc.sweep),
                arc.x,
                arc.y,
            ]),
            Segment::ClosePath => Operands::new(&[]),
        }
    }

    /// Shift every coordinate by `(dx, dy)`. Arc radii and flags are not
    /// coordinates and stay as they are.
    pub fn translate(self, dx: f64, dy: f64) -> Segment {
        match self {
            Segment::MoveTo { x, y } => Segment::MoveTo {
                x: x + dx,
                y: y + dy,
            },
            Segment::LineTo { x, y } => Segment::LineTo {
                x: x + dx,
                y: y + dy,
            },
            Segment::HorizontalTo { x } => Segment::HorizontalTo { x: x + dx },
            Segment::VerticalTo { y } => Segment::VerticalTo { y: y + dy },
            Segment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => Segment::CurveTo {
                x1: x1 + dx,
                y1: y1 + dy,
                x2: x2 + dx,
                y2: y2 + dy,
                x: x + dx,
                y: y + dy,
            },
            Segment::SmoothCurveTo { x2, y2, x, y } => Segment::SmoothCurveTo {
                x2: x2 + dx,
                y2: y2 + dy,
                x: x + dx,
                y: y + dy,
            },
            Segment::QuadTo { x1, y1, x, y } => Segment::QuadTo {
                x1: x1 + dx,
                y1: y1 + dy,
                x: x + dx,
                y: y + dy,
            },
            Segment::SmoothQuadTo { x, y } => Segment::SmoothQuadTo {
                x: x + dx,
                y: y + dy,
            },
            Segment::Arc(arc) => Segment::Arc(Arc {
                x: arc.x + dx,
                y: arc.y + dy,
                ..arc
            }),
            Segment::ClosePath => Segment::ClosePath,
        }
    }

    /// Round every operand to `decimals` places. Arc radii and rotation keep
    /// one extra decimal since their error compounds under transforms.
    pub fn round(self, decimals: u8) -> Segment {
        let r = |v: f64| round_to(v, decimals);
        match self {
            Segment::MoveTo { x, y } => Segment::MoveTo { x: r(x), y: r(y) },
            Segment::LineTo { x, y } => Segment::LineTo { x: r(x), y: r(y) },
            Segment::HorizontalTo { x } => Segment::HorizontalTo { x: r(x) },
            Segment::VerticalTo { y } => Segment::VerticalTo { y: r(y) },
            Segment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => Segment::CurveTo {
                x1: r(x1),
                y1: r(y1),
                x2: r(x2),
                y2: r(y2),
                x: r(x),
                y: r(y),
            },
            Segment::SmoothCurveTo { x2, y2, x, y } => Segment::SmoothCurveTo {
                x2: r(x2),
                y2: r(y2),
                x: r(x),
                y: r(y),
            },
            Segment::QuadTo { x1, y1, x, y } => Segment::QuadTo {
                x1: r(x1),
                y1: r(y1),
                x: r(x),
                y: r(y),
            },
            Segment::SmoothQuadTo { x, y } => Segment::SmoothQuadTo { x: r(x), y: r(y) },
            Segment::Arc(arc) => {
                let fine = decimals.saturating_add(1);
                Segment::Arc(Arc {
                    rx: round_to(arc.rx, fine),
                    ry: round_to(arc.ry, fine),
                    x_axis_rotation: round_to(arc.x_axis_rotation, fine),
                    x: r(arc.x),
                    y: r(arc.y),
                    ..arc
                })
            }
            Segment::ClosePath => Segment::ClosePath,
        }
    }

    /// Whether this segment only appears in longhand form (not H, V, S or T).
    pub fn is_longhand(&self) -> bool {
        !matches!(
            self,
            Segment::HorizontalTo { .. }
                | Segment::VerticalTo { .. }
                | Segment::SmoothCurveTo { .. }
                | Segment::SmoothQuadTo { .. }
        )
    }
}

impl Command {
    pub fn absolute(segment: Segment) -> Self {
        Self {
            mode: Mode::Absolute,
            segment,
        }
    }

    pub fn relative(segment: Segment) -> Self {
        Self {
            mode: Mode::Relative,
            segment,
        }
    }

    pub fn kind(&self) -> Kind {
        self.segment.kind()
    }

    pub fn is_relative(&self) -> bool {
        self.mode == Mode::Relative
    }

    /// The path-data letter: uppercase for absolute, lowercase for relative.
    pub fn letter(&self) -> char {
        let c = self.kind().letter();
        match self.mode {
            Mode::Absolute => c,
            Mode::Relative => c.to_ascii_lowercase(),
        }
    }
}

/// Tracks the current point and the start of the current subpath while
/// walking absolute segments.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Cursor {
    pub current: (f64, f64),
    pub start: (f64, f64),
}

impl Cursor {
    /// Move past an absolute segment.
    pub fn advance(&mut self, segment: &Segment) {
        match *segment {
            Segment::MoveTo { x, y } => {
                self.current = (x, y);
                self.start = (x, y);
            }
            Segment::LineTo { x, y }
            | Segment::CurveTo { x, y, .. }
            | Segment::SmoothCurveTo { x, y, .. }
            | Segment::QuadTo { x, y, .. }
            | Segment::SmoothQuadTo { x, y }
            | Segment::Arc(Arc { x, y, .. }) => self.current = (x, y),
            Segment::HorizontalTo { x } => self.current.0 = x,
            Segment::VerticalTo { y } => self.current.1 = y,
            Segment::ClosePath => self.current = self.start,
        }
    }
}

impl Path {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Whether every command is absolute and in longhand form, the shape the
    /// parser produces and the transform engine expects.
    pub fn is_absolute_longhand(&self) -> bool {
        self.commands
            .iter()
            .all(|c| c.mode == Mode::Absolute && c.segment.is_longhand())
    }

    /// Rewrite into absolute longhand commands.
    ///
    /// Relative coordinates are resolved against the current point, H/V become
    /// L, and S/T become C/Q with the reflected control point. Arc radii are
    /// made non-negative and zero-radius arcs become straight lines.
    ///
    /// Consumes the path; the result shares nothing with the input.
    pub fn into_absolute_longhand(self) -> Path {
        let mut commands = Vec::with_capacity(self.commands.len());
        let mut cursor = Cursor::default();
        let mut prev: Option<Segment> = None;

        for cmd in self.commands {
            let segment = match cmd.mode {
                // A leading relative moveto resolves against (0, 0).
                Mode::Relative => cmd.segment.translate(cursor.current.0, cursor.current.1),
                Mode::Absolute => cmd.segment,
            };
            let (cx, cy) = cursor.current;

            let segment = match segment {
                Segment::HorizontalTo { x } => Segment::LineTo { x, y: cy },
                Segment::VerticalTo { y } => Segment::LineTo { x: cx, y },
                Segment::SmoothCurveTo { x2, y2, x, y } => {
                    let (x1, y1) = match prev {
                        Some(Segment::CurveTo { x2: px, y2: py, .. }) => reflect((px, py), (cx, cy)),
                        _ => (cx, cy),
                    };
                    Segment::CurveTo {
                        x1,
                        y1,
                        x2,
                        y2,
                        x,
                        y,
                    }
                }
                Segment::SmoothQuadTo { x, y } => {
                    let (x1, y1) = match prev {
                        Some(Segment::QuadTo { x1: px, y1: py, .. }) => reflect((px, py), (cx, cy)),
                        _ => (cx, cy),
                    };
                    Segment::QuadTo { x1, y1, x, y }
                }
                Segment::Arc(arc) if arc.rx == 0.0 || arc.ry == 0.0 => Segment::LineTo {
                    x: arc.x,
                    y: arc.y,
                },
                Segment::Arc(arc) => Segment::Arc(Arc {
                    rx: arc.rx.abs(),
                    ry: arc.ry.abs(),
                    ..arc
                }),
                other => other,
            };

            cursor.advance(&segment);
            prev = Some(segment);
            commands.push(Command::absolute(segment));
        }

        Path { commands }
    }
}

/// Reflect `point` through `center`.
pub(crate) fn reflect(point: (f64, f64), center: (f64, f64)) -> (f64, f64) {
    (2.0 * center.0 - point.0, 2.0 * center.1 - point.1)
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(n: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (n * factor).round() / factor;
    // normalize -0
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(segment: Segment) -> Command {
        Command::absolute(segment)
    }

    fn rel(segment: Segment) -> Command {
        Command::relative(segment)
    }

    #[test]
    fn test_letters() {
        assert_eq!(abs(Segment::MoveTo { x: 0.0, y: 0.0 }).letter(), 'M');
        assert_eq!(rel(Segment::HorizontalTo { x: 1.0 }).letter(), 'h');
        assert_eq!(rel(Segment::ClosePath).letter(), 'z');
        assert_eq!(Kind::from_letter('a'), Some(Kind::Arc));
        assert_eq!(Kind::from_letter('x'), None);
    }

    #[test]
    fn test_operands_match_arity() {
        let segments = [
            Segment::MoveTo { x: 1.0, y: 2.0 },
            Segment::HorizontalTo { x: 1.0 },
            Segment::SmoothCurveTo {
                x2: 1.0,
                y2: 2.0,
                x: 3.0,
                y: 4.0,
            },
            Segment::Arc(Arc {
                rx: 5.0,
                ry: 5.0,
                x_axis_rotation: 0.0,
                large_arc: true,
                sweep: false,
                x: 10.0,
                y: 10.0,
            }),
            Segment::ClosePath,
        ];
        for s in segments {
            assert_eq!(s.operands().len(), s.kind().arity());
        }
        let arc = segments[3].operands();
        assert_eq!(&arc[3..5], &[1.0, 0.0]);
    }

    #[test]
    fn test_absolute_longhand_resolves_relative() {
        let path = Path::new(vec![
            rel(Segment::MoveTo { x: 10.0, y: 10.0 }),
            rel(Segment::HorizontalTo { x: 5.0 }),
            rel(Segment::VerticalTo { y: -5.0 }),
            rel(Segment::ClosePath),
            rel(Segment::LineTo { x: 1.0, y: 1.0 }),
        ])
        .into_absolute_longhand();

        assert_eq!(
            path.commands,
            vec![
                abs(Segment::MoveTo { x: 10.0, y: 10.0 }),
                abs(Segment::LineTo { x: 15.0, y: 10.0 }),
                abs(Segment::LineTo { x: 15.0, y: 5.0 }),
                abs(Segment::ClosePath),
                abs(Segment::LineTo { x: 11.0, y: 11.0 }),
            ]
        );
        assert!(path.is_absolute_longhand());
    }

    #[test]
    fn test_smooth_curve_reflects_previous_control() {
        let path = Path::new(vec![
            abs(Segment::MoveTo { x: 0.0, y: 0.0 }),
            abs(Segment::CurveTo {
                x1: 0.0,
                y1: 10.0,
                x2: 10.0,
                y2: 10.0,
                x: 20.0,
                y: 0.0,
            }),
            abs(Segment::SmoothCurveTo {
                x2: 30.0,
                y2: -10.0,
                x: 40.0,
                y: 0.0,
            }),
        ])
        .into_absolute_longhand();

        assert_eq!(
            path.commands[2].segment,
            Segment::CurveTo {
                x1: 30.0,
                y1: -10.0,
                x2: 30.0,
                y2: -10.0,
                x: 40.0,
                y: 0.0,
            }
        );
    }

    #[test]
    fn test_smooth_quad_without_previous_quad_uses_current_point() {
        let path = Path::new(vec![
            abs(Segment::MoveTo { x: 5.0, y: 5.0 }),
            abs(Segment::SmoothQuadTo { x: 10.0, y: 0.0 }),
            abs(Segment::SmoothQuadTo { x: 15.0, y: 5.0 }),
        ])
        .into_absolute_longhand();

        assert_eq!(
            path.commands[1].segment,
            Segment::QuadTo {
                x1: 5.0,
                y1: 5.0,
                x: 10.0,
                y: 0.0,
            }
        );
        // second T reflects the first one's control point through (10, 0)
        assert_eq!(
            path.commands[2].segment,
            Segment::QuadTo {
                x1: 15.0,
                y1: -5.0,
                x: 15.0,
                y: 5.0,
            }
        );
    }

    #[test]
    fn test_zero_radius_arc_becomes_line() {
        let path = Path::new(vec![
            abs(Segment::MoveTo { x: 0.0, y: 0.0 }),
            abs(Segment::Arc(Arc {
                rx: 0.0,
                ry: 5.0,
                x_axis_rotation: 0.0,
                large_arc: false,
                sweep: true,
                x: 10.0,
                y: 0.0,
            })),
            abs(Segment::Arc(Arc {
                rx: -5.0,
                ry: -5.0,
                x_axis_rotation: 0.0,
                large_arc: false,
                sweep: true,
                x: 20.0,
                y: 0.0,
            })),
        ])
        .into_absolute_longhand();

        assert_eq!(path.commands[1].segment, Segment::LineTo { x: 10.0, y: 0.0 });
        assert!(matches!(
            path.commands[2].segment,
            Segment::Arc(Arc { rx, ry, .. }) if rx == 5.0 && ry == 5.0
        ));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-0.0001, 2), 0.0);
        assert!(round_to(-0.0001, 2).is_sign_positive());
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_round_arc_keeps_extra_decimal() {
        let arc = Segment::Arc(Arc {
            rx: 1.23456,
            ry: 2.34567,
            x_axis_rotation: 30.12345,
            large_arc: true,
            sweep: true,
            x: 1.23456,
            y: 2.34567,
        })
        .round(2);
        assert_eq!(
            arc,
            Segment::Arc(Arc {
                rx: 1.235,
                ry: 2.346,
                x_axis_rotation: 30.123,
                large_arc: true,
                sweep: true,
                x: 1.23,
                y: 2.35,
            })
        );
    }
}
