//! Path optimization passes.
//!
//! Every pass consumes its input and returns a new path. The full pipeline
//! (`optimize`) is idempotent for a fixed set of options.

use tracing::debug;

use crate::FormatOptions;
use crate::path::{Command, Cursor, Mode, Path, Segment, reflect, round_to};

/// Apply all enabled optimizations to the path.
pub fn optimize(path: Path, options: &FormatOptions) -> Path {
    let before = path.len();

    let mut path = if path.is_absolute_longhand() {
        path
    } else {
        path.into_absolute_longhand()
    };

    if let Some(decimals) = options.decimal_places {
        path = round_absolute(path, decimals);
    }

    if options.use_shorthands {
        path = to_shorthands(path, options.decimal_places);
    }

    if options.prefer_relative {
        path = to_relative(path, options.decimal_places);
    }

    debug!(before, after = path.len(), "optimized path");
    path
}

/// Round absolute coordinates. Arcs whose radius rounds to zero become lines
/// so that a second pass sees the same commands.
fn round_absolute(path: Path, decimals: u8) -> Path {
    let commands = path
        .commands
        .into_iter()
        .map(|cmd| {
            let segment = match cmd.segment.round(decimals) {
                Segment::Arc(arc) if arc.rx == 0.0 || arc.ry == 0.0 => Segment::LineTo {
                    x: arc.x,
                    y: arc.y,
                },
                other => other,
            };
            Command { segment, ..cmd }
        })
        .collect();
    Path { commands }
}

/// Replace longhand commands with H, V, S and T where they draw the same thing.
///
/// Coordinates are compared at a coarse rounding: two decimals for
/// horizontal/vertical lines, one decimal for reflected control points.
/// The result is absolute.
pub fn to_shorthands(path: Path, decimals: Option<u8>) -> Path {
    let path = if path.is_absolute_longhand() {
        path
    } else {
        path.into_absolute_longhand()
    };

    let line = coarse(decimals, 2);
    let curve = coarse(decimals, 1);
    let same = |a: f64, b: f64, d: u8| round_to(a, d) == round_to(b, d);

    let mut commands = Vec::with_capacity(path.commands.len());
    let mut cursor = Cursor::default();
    // Control points as a reader of the output will reconstruct them.
    let mut prev_cubic: Option<(f64, f64)> = None;
    let mut prev_quad: Option<(f64, f64)> = None;

    for cmd in path.commands {
        let (cx, cy) = cursor.current;

        let (segment, cubic, quad) = match cmd.segment {
            Segment::LineTo { x, y } if same(y, cy, line) && !same(x, cx, line) => {
                (Segment::HorizontalTo { x }, None, None)
            }
            Segment::LineTo { x, y } if same(x, cx, line) && !same(y, cy, line) => {
                (Segment::VerticalTo { y }, None, None)
            }
            Segment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let (ex, ey) = prev_cubic.map_or((cx, cy), |p| reflect(p, (cx, cy)));
                let segment = if same(x1, ex, curve) && same(y1, ey, curve) {
                    Segment::SmoothCurveTo { x2, y2, x, y }
                } else {
                    cmd.segment
                };
                (segment, Some((x2, y2)), None)
            }
            Segment::QuadTo { x1, y1, x, y } => {
                let (ex, ey) = prev_quad.map_or((cx, cy), |p| reflect(p, (cx, cy)));
                if same(x1, ex, curve) && same(y1, ey, curve) {
                    (Segment::SmoothQuadTo { x, y }, None, Some((ex, ey)))
                } else {
                    (cmd.segment, None, Some((x1, y1)))
                }
            }
            other => (other, None, None),
        };

        cursor.advance(&segment);
        prev_cubic = cubic;
        prev_quad = quad;
        commands.push(Command::absolute(segment));
    }

    Path { commands }
}

/// Rewrite every command after the first relative to the current point.
///
/// Relative values are rounded again when `decimals` is given. The cursor
/// follows the absolute input, so rounding never accumulates.
pub fn to_relative(path: Path, decimals: Option<u8>) -> Path {
    let mut commands = Vec::with_capacity(path.commands.len());
    let mut cursor = Cursor::default();

    for (i, cmd) in path.commands.into_iter().enumerate() {
        let (cx, cy) = cursor.current;
        let absolute = match cmd.mode {
            Mode::Relative => cmd.segment.translate(cx, cy),
            Mode::Absolute => cmd.segment,
        };
        cursor.advance(&absolute);

        if i == 0 {
            commands.push(Command::absolute(absolute));
            continue;
        }

        let relative = absolute.translate(-cx, -cy);
        let relative = match decimals {
            Some(d) => relative.round(d),
            None => relative,
        };
        commands.push(Command::relative(relative));
    }

    Path { commands }
}

fn coarse(decimals: Option<u8>, cap: u8) -> u8 {
    decimals.map_or(cap, |d| d.min(cap))
}
