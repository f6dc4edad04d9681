//! Affine transforms of path data.
//!
//! Points map through the matrix directly. Arcs cannot: the image of an
//! ellipse under an affine map is another ellipse whose radii and rotation
//! have to be recomputed, and mirroring reverses the sweep direction.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::arc::to_center_form;
use crate::error::{FlattenError, InvalidMatrix, ParseError, ParseErrorKind};
use crate::parse::parse_numbers;
use crate::path::{Arc, Command, Cursor, Path, Segment};
use crate::serialize::format_number;

/// A 2D affine matrix `[a c e; b d f; 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Build a matrix from `[a, b, c, d, e, f]`, rejecting non-finite cells.
    pub fn from_array(cells: [f64; 6]) -> Result<Self, InvalidMatrix> {
        let [a, b, c, d, e, f] = cells;
        let m = Self::new(a, b, c, d, e, f);
        m.validate()?;
        Ok(m)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Check that every cell is finite.
    pub fn validate(&self) -> Result<(), InvalidMatrix> {
        match self
            .to_array()
            .into_iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            Some((index, value)) => Err(InvalidMatrix { index, value }),
            None => Ok(()),
        }
    }

    /// Whether the matrix is the identity once rounded to one decimal.
    pub fn is_near_identity(&self) -> bool {
        self.to_array()
            .into_iter()
            .map(|v| (v * 10.0).round() / 10.0)
            .eq(Self::IDENTITY.to_array())
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Map a point through the matrix.
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// `self × other`: `other` is applied to points first.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translate(self, tx: f64, ty: f64) -> Matrix {
        self.multiply(&Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty))
    }

    pub fn scale(self, sx: f64, sy: f64) -> Matrix {
        self.multiply(&Matrix::new(sx, 0.0, 0.0, sy, 0.0, 0.0))
    }

    /// Rotate by `degrees`, clockwise in the y-down SVG coordinate system.
    pub fn rotate(self, degrees: f64) -> Matrix {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.multiply(&Matrix::new(cos, sin, -sin, cos, 0.0, 0.0))
    }

    pub fn skew_x(self, degrees: f64) -> Matrix {
        self.multiply(&Matrix::new(1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0))
    }

    pub fn skew_y(self, degrees: f64) -> Matrix {
        self.multiply(&Matrix::new(1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0))
    }

    /// Apply this matrix with `(cx, cy)` as the transform origin.
    pub fn around(self, cx: f64, cy: f64) -> Matrix {
        Matrix::IDENTITY
            .translate(cx, cy)
            .multiply(&self)
            .translate(-cx, -cy)
    }

    /// Mirror horizontally and/or vertically about `(cx, cy)`.
    pub fn flip(flip_x: bool, flip_y: bool, cx: f64, cy: f64) -> Matrix {
        let sx = if flip_x { -1.0 } else { 1.0 };
        let sy = if flip_y { -1.0 } else { 1.0 };
        Matrix::IDENTITY.scale(sx, sy).around(cx, cy)
    }

    /// QR-decompose into translate · rotate · scale · skewX.
    pub fn decompose(&self) -> Decomposition {
        let Matrix { a, b, c, d, e, f } = *self;
        let denom = a * a + b * b;
        let scale_x = denom.sqrt();
        let (scale_y, skew_x) = if scale_x == 0.0 {
            (0.0, 0.0)
        } else {
            (
                self.determinant() / scale_x,
                (a * c + b * d).atan2(denom).to_degrees(),
            )
        };

        Decomposition {
            translate_x: e,
            translate_y: f,
            rotate: b.atan2(a).to_degrees(),
            scale_x,
            scale_y,
            skew_x,
        }
    }
}

impl TryFrom<[f64; 6]> for Matrix {
    type Error = InvalidMatrix;

    fn try_from(cells: [f64; 6]) -> Result<Self, Self::Error> {
        Matrix::from_array(cells)
    }
}

impl FromStr for Matrix {
    type Err = ParseError;

    /// Accepts `matrix(a, b, c, d, e, f)` or six bare numbers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix("matrix(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);

        let values = parse_numbers(inner)?;
        let cells: [f64; 6] = values.as_slice().try_into().map_err(|_| ParseError {
            offset: 0,
            kind: ParseErrorKind::WrongValueCount {
                expected: 6,
                found: values.len(),
            },
        })?;
        let [a, b, c, d, e, f] = cells;
        Ok(Matrix::new(a, b, c, d, e, f))
    }
}

/// A matrix split into readable transform functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposition {
    pub translate_x: f64,
    pub translate_y: f64,
    /// Degrees.
    pub rotate: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees.
    pub skew_x: f64,
}

impl Decomposition {
    /// Whether the transform mirrors the plane, which reverses arc sweeps.
    pub fn flips_orientation(&self) -> bool {
        self.scale_x < 0.0 || self.scale_y < 0.0
    }

    /// Average scale factor, for compensating stroke widths.
    pub fn stroke_scale(&self) -> f64 {
        (self.scale_x.abs() + self.scale_y.abs()) / 2.0
    }

    /// Equivalent SVG `transform` attribute value. Identity parts are left out.
    pub fn to_svg_transform(&self, precision: u8) -> String {
        let n = |v: f64| format_number(v, Some(precision), false);
        let is_zero = |v: f64| n(v) == "0";
        let mut parts = Vec::new();

        if !is_zero(self.translate_x) || !is_zero(self.translate_y) {
            parts.push(format!("translate({} {})", n(self.translate_x), n(self.translate_y)));
        }
        if !is_zero(self.rotate) {
            parts.push(format!("rotate({})", n(self.rotate)));
        }
        if n(self.scale_x) != "1" || n(self.scale_y) != "1" {
            parts.push(format!("scale({} {})", n(self.scale_x), n(self.scale_y)));
        }
        if !is_zero(self.skew_x) {
            parts.push(format!("skewX({})", n(self.skew_x)));
        }

        parts.join(" ")
    }
}

/// Apply `matrix` to every command of `path`.
///
/// A matrix that rounds to the identity at one decimal returns the input
/// untouched. Otherwise the result is absolute longhand. Consumes the path.
pub fn transform_path(path: Path, matrix: &Matrix) -> Result<Path, FlattenError> {
    matrix.validate()?;

    if matrix.is_near_identity() {
        trace!("identity matrix, path unchanged");
        return Ok(path);
    }

    let path = if path.is_absolute_longhand() {
        path
    } else {
        path.into_absolute_longhand()
    };

    let flip = matrix.decompose().flips_orientation();
    debug!(?matrix, flip, commands = path.len(), "transforming path");

    let mut commands = Vec::with_capacity(path.commands.len());
    let mut cursor = Cursor::default();

    for cmd in path.commands {
        let segment = transform_segment(cmd.segment, cursor.current, matrix, flip);
        cursor.advance(&cmd.segment);
        commands.push(Command::absolute(segment));
    }

    Ok(Path { commands })
}

fn transform_segment(segment: Segment, from: (f64, f64), m: &Matrix, flip: bool) -> Segment {
    match segment {
        Segment::MoveTo { x, y } => {
            let (x, y) = m.apply((x, y));
            Segment::MoveTo { x, y }
        }
        Segment::LineTo { x, y } => {
            let (x, y) = m.apply((x, y));
            Segment::LineTo { x, y }
        }
        Segment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => {
            let (x1, y1) = m.apply((x1, y1));
            let (x2, y2) = m.apply((x2, y2));
            let (x, y) = m.apply((x, y));
            Segment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            }
        }
        Segment::QuadTo { x1, y1, x, y } => {
            let (x1, y1) = m.apply((x1, y1));
            let (x, y) = m.apply((x, y));
            Segment::QuadTo { x1, y1, x, y }
        }
        Segment::Arc(arc) => transform_arc(from, arc, m, flip),
        Segment::ClosePath => Segment::ClosePath,
        // into_absolute_longhand leaves none of these
        Segment::HorizontalTo { .. }
        | Segment::VerticalTo { .. }
        | Segment::SmoothCurveTo { .. }
        | Segment::SmoothQuadTo { .. } => segment,
    }
}

fn transform_arc(from: (f64, f64), arc: Arc, m: &Matrix, flip: bool) -> Segment {
    let (x, y) = m.apply((arc.x, arc.y));

    let center = match to_center_form(from, &arc) {
        Ok(center) => center,
        Err(reason) => {
            trace!(%reason, "degenerate arc replaced by line");
            return Segment::LineTo { x, y };
        }
    };

    let (rx, ry, x_axis_rotation) = transform_ellipse(center.rx, center.ry, arc.x_axis_rotation, m);

    // a singular matrix flattens the ellipse onto a line
    if rx.min(ry) <= 1e-7 * rx.max(ry).max(1.0) {
        trace!(rx, ry, "collapsed arc replaced by line");
        return Segment::LineTo { x, y };
    }

    Segment::Arc(Arc {
        rx,
        ry,
        x_axis_rotation,
        large_arc: arc.large_arc,
        sweep: arc.sweep != flip,
        x,
        y,
    })
}

/// Radii and rotation (degrees) of the image of an ellipse under `m`.
///
/// The ellipse is the unit circle mapped by `rotate(angle) · scale(rx, ry)`,
/// so its image is the unit circle under `ma = m · rotate · scale`. The axes
/// come from the eigen-decomposition of `ma · maᵀ`.
pub fn transform_ellipse(rx: f64, ry: f64, angle: f64, m: &Matrix) -> (f64, f64, f64) {
    let (s, c) = angle.to_radians().sin_cos();
    let ma = [
        rx * (m.a * c + m.c * s),
        rx * (m.b * c + m.d * s),
        ry * (-m.a * s + m.c * c),
        ry * (-m.b * s + m.d * c),
    ];

    // ma · maᵀ = [J L; L K]
    let j = ma[0] * ma[0] + ma[2] * ma[2];
    let k = ma[1] * ma[1] + ma[3] * ma[3];

    // Square root of the discriminant of the characteristic polynomial,
    // i.e. the difference of the eigenvalues.
    let d = (((ma[0] - ma[3]).powi(2) + (ma[2] + ma[1]).powi(2))
        * ((ma[0] + ma[3]).powi(2) + (ma[2] - ma[1]).powi(2)))
    .sqrt();

    // Arithmetic mean of the eigenvalues.
    let jk = (j + k) / 2.0;
    let epsilon = 1e-7 * jk.max(1.0);

    // (almost) a circle
    if d <= epsilon {
        let r = jk.sqrt();
        return (r, r, 0.0);
    }

    // (almost) axis aligned
    if (d - (j - k).abs()).abs() <= epsilon {
        return (j.sqrt(), k.sqrt(), 0.0);
    }

    let l = ma[0] * ma[1] + ma[2] * ma[3];
    let l1 = jk + d / 2.0;
    let l2 = jk - d / 2.0;

    // The rotation is the argument of the l1 eigenvector.
    if l.abs() <= epsilon && (l1 - k).abs() <= epsilon {
        return (l2.max(0.0).sqrt(), l1.sqrt(), 0.0);
    }

    let ratio = if l.abs() > (l1 - k).abs() {
        (l1 - j) / l
    } else {
        l / (l1 - k)
    };
    let rotation = ratio.atan().to_degrees();

    // Keep the rotation in [0, 90) by exchanging the axes.
    if rotation >= 0.0 {
        (l1.sqrt(), l2.max(0.0).sqrt(), rotation)
    } else {
        (l2.max(0.0).sqrt(), l1.sqrt(), rotation + 90.0)
    }
}
