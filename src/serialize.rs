//! Path data serialization.

use crate::path::{Kind, Mode, Path, Segment, round_to};

/// Serialize a path to path-data text.
///
/// With `minify` off, every command carries its letter and commands are
/// separated by a space (`M0 0 L20 0`). With `minify` on, separators are
/// only written where two numbers would otherwise merge, and command letters
/// are left out wherever the implicit-repeat rules make them redundant.
///
/// `decimals = None` writes every number at full precision.
pub fn serialize_path(path: &Path, decimals: Option<u8>, minify: bool) -> String {
    if minify {
        serialize_minified(path, decimals)
    } else {
        serialize_plain(path, decimals)
    }
}

fn serialize_plain(path: &Path, decimals: Option<u8>) -> String {
    let mut out = String::new();

    for (i, cmd) in path.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(cmd.letter());
        for (j, arg) in format_operands(&cmd.segment, decimals, false).iter().enumerate() {
            if j > 0 {
                out.push(' ');
            }
            out.push_str(arg);
        }
    }

    out
}

fn serialize_minified(path: &Path, decimals: Option<u8>) -> String {
    let mut out = String::new();
    let mut prev: Option<(Kind, Mode)> = None;

    for (i, cmd) in path.iter().enumerate() {
        let kind = cmd.kind();
        let mut mode = cmd.mode;

        // A leading moveto resolves against the origin either way, so an
        // absolute one may be written as `m` to let a following `l` go.
        if i == 0
            && kind == Kind::MoveTo
            && path
                .commands
                .get(1)
                .is_some_and(|next| next.kind() == Kind::LineTo && next.is_relative())
        {
            mode = Mode::Relative;
        }

        let needs_cmd = match (kind, prev) {
            (Kind::MoveTo | Kind::ClosePath, _) | (_, None) => true,
            // After M, coordinates are treated as L; after m, as l
            (Kind::LineTo, Some((Kind::MoveTo, prev_mode))) => prev_mode != mode,
            (_, Some(p)) => p != (kind, mode),
        };

        if kind == Kind::ClosePath {
            out.push('z');
        } else if needs_cmd {
            out.push(match mode {
                Mode::Absolute => kind.letter(),
                Mode::Relative => kind.letter().to_ascii_lowercase(),
            });
        }

        for arg in format_operands(&cmd.segment, decimals, true) {
            push_separated(&mut out, &arg);
        }

        prev = Some((kind, mode));
    }

    out
}

/// Append `token`, adding a space only if it would merge with the previous number.
fn push_separated(out: &mut String, token: &str) {
    let needs_sep = match (out.chars().last(), token.chars().next()) {
        // Need space if both are digits or if previous is digit and current starts with .
        (Some(last), Some(first)) => {
            (last.is_ascii_digit() || last == '.') && (first.is_ascii_digit() || first == '.')
        }
        _ => false,
    };
    if needs_sep {
        out.push(' ');
    }
    out.push_str(token);
}

fn format_operands(segment: &Segment, decimals: Option<u8>, minify: bool) -> Vec<String> {
    match segment {
        Segment::Arc(arc) => {
            let fine = decimals.map(|d| d.saturating_add(1));
            vec![
                format_number(arc.rx, fine, minify),
                format_number(arc.ry, fine, minify),
                format_number(arc.x_axis_rotation, fine, minify),
                if arc.large_arc { "1".into() } else { "0".into() },
                if arc.sweep { "1".into() } else { "0".into() },
                format_number(arc.x, decimals, minify),
                format_number(arc.y, decimals, minify),
            ]
        }
        other => other
            .operands()
            .iter()
            .map(|&n| format_number(n, decimals, minify))
            .collect(),
    }
}

/// Format a number for path data.
///
/// Rounds to `decimals` places when given, trims trailing zeros, writes
/// `-0` as `0` and never uses exponent notation. With `minify`, the leading
/// zero of a fraction is dropped (`0.5` -> `.5`).
pub fn format_number(n: f64, decimals: Option<u8>, minify: bool) -> String {
    let rounded = match decimals {
        Some(d) => round_to(n, d),
        None => n,
    };

    if rounded == 0.0 {
        return "0".into();
    }

    // Check if it's an integer
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        return format!("{}", rounded as i64);
    }

    let mut buf = ryu::Buffer::new();
    let shortest = buf.format(rounded);
    let mut s = if shortest.contains(['e', 'E']) {
        // Display never switches to exponent notation.
        format!("{rounded}")
    } else {
        shortest.to_string()
    };

    if s.contains('.') {
        s = s.trim_end_matches('0').trim_end_matches('.').to_string();
    }

    if minify {
        // Remove leading zero before decimal: 0.5 -> .5
        if let Some(rest) = s.strip_prefix("0.") {
            s = format!(".{rest}");
        } else if let Some(rest) = s.strip_prefix("-0.") {
            s = format!("-.{rest}");
        }
    }

    s
}
