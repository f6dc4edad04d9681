//! Path data parsing.

use tracing::trace;

use crate::error::{ParseError, ParseErrorKind};
use crate::path::{Arc, Command, Kind, Mode, Path, Segment};

/// Parse SVG path data into absolute longhand commands.
///
/// Relative commands are resolved, shorthands (H, V, S, T) are expanded, and
/// the first command is always an absolute moveto. Blank input gives an empty
/// path.
pub fn parse_path(d: &str) -> Result<Path, ParseError> {
    let path = parse_path_raw(d)?.into_absolute_longhand();
    trace!(commands = path.len(), "parsed path data");
    Ok(path)
}

/// Parse SVG path data, keeping commands as written (modes and shorthands
/// preserved). Implicit repeats are still split into separate commands.
pub fn parse_path_raw(d: &str) -> Result<Path, ParseError> {
    let mut parser = PathParser::new(d);
    parser.parse()
}

/// Parse a `points` list as used by `<polygon>` and `<polyline>`.
pub fn parse_points(points: &str) -> Result<Vec<(f64, f64)>, ParseError> {
    let coords = parse_numbers(points)?;

    if coords.len() % 2 != 0 {
        return Err(ParseError {
            offset: points.len(),
            kind: ParseErrorKind::OddCoordinateCount,
        });
    }

    Ok(coords.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

/// Parse a whitespace/comma separated list of numbers.
pub(crate) fn parse_numbers(s: &str) -> Result<Vec<f64>, ParseError> {
    let mut parser = PathParser::new(s);
    let mut values = Vec::new();

    parser.skip_whitespace_and_comma();
    while !parser.is_eof() {
        values.push(parser.parse_number()?);
        parser.skip_whitespace_and_comma();
    }

    Ok(values)
}

struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(&mut self) -> Result<Path, ParseError> {
        let mut commands = Vec::new();
        let mut last: Option<(Kind, Mode)> = None;

        self.skip_whitespace();

        while !self.is_eof() {
            let offset = self.pos;
            let (kind, mode) = match self.peek() {
                Some(c) if c.is_ascii_alphabetic() => {
                    self.next();
                    let kind = Kind::from_letter(c)
                        .ok_or_else(|| self.error_at(offset, ParseErrorKind::UnknownCommand(c)))?;
                    let mode = if c.is_ascii_lowercase() {
                        Mode::Relative
                    } else {
                        Mode::Absolute
                    };
                    last = Some((kind, mode));
                    (kind, mode)
                }
                // Implicit command - repeat last command.
                // After M, implicit command is L; after m, it's l
                _ => match last {
                    Some((Kind::MoveTo, mode)) => (Kind::LineTo, mode),
                    Some((Kind::ClosePath, _)) | None => {
                        return Err(self.error(ParseErrorKind::ExpectedCommand));
                    }
                    Some(repeat) => repeat,
                },
            };

            if commands.is_empty() && kind != Kind::MoveTo {
                return Err(self.error_at(offset, ParseErrorKind::MissingMoveTo));
            }

            let segment = self.parse_segment(kind)?;
            commands.push(Command { mode, segment });
            self.skip_whitespace_and_comma();
        }

        Ok(Path { commands })
    }

    fn parse_segment(&mut self, kind: Kind) -> Result<Segment, ParseError> {
        Ok(match kind {
            Kind::MoveTo => {
                let (x, y) = self.parse_pair()?;
                Segment::MoveTo { x, y }
            }
            Kind::LineTo => {
                let (x, y) = self.parse_pair()?;
                Segment::LineTo { x, y }
            }
            Kind::HorizontalTo => Segment::HorizontalTo {
                x: self.parse_number()?,
            },
            Kind::VerticalTo => Segment::VerticalTo {
                y: self.parse_number()?,
            },
            Kind::CurveTo => {
                let (x1, y1) = self.parse_pair()?;
                let (x2, y2) = self.parse_pair()?;
                let (x, y) = self.parse_pair()?;
                Segment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                }
            }
            Kind::SmoothCurveTo => {
                let (x2, y2) = self.parse_pair()?;
                let (x, y) = self.parse_pair()?;
                Segment::SmoothCurveTo { x2, y2, x, y }
            }
            Kind::QuadTo => {
                let (x1, y1) = self.parse_pair()?;
                let (x, y) = self.parse_pair()?;
                Segment::QuadTo { x1, y1, x, y }
            }
            Kind::SmoothQuadTo => {
                let (x, y) = self.parse_pair()?;
                Segment::SmoothQuadTo { x, y }
            }
            Kind::Arc => {
                let rx = self.parse_number()?;
                let ry = self.parse_number()?;
                let x_axis_rotation = self.parse_number()?;
                // Flags are single digits and may run into each other and
                // into the next coordinate: "1110 10" is 1 1 10 10.
                let large_arc = self.parse_flag()?;
                let sweep = self.parse_flag()?;
                let (x, y) = self.parse_pair()?;
                Segment::Arc(Arc {
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                })
            }
            Kind::ClosePath => Segment::ClosePath,
        })
    }

    fn parse_pair(&mut self) -> Result<(f64, f64), ParseError> {
        let x = self.parse_number()?;
        let y = self.parse_number()?;
        Ok((x, y))
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace_and_comma();

        let start = self.pos;

        // Optional sign
        if self.peek() == Some('-') || self.peek() == Some('+') {
            self.next();
        }

        // Integer part
        let mut digits = self.skip_digits();

        // Decimal part. A second '.' starts the next number: "0.5.5" is 0.5 .5
        if self.peek() == Some('.') {
            self.next();
            digits += self.skip_digits();
        }

        if digits == 0 {
            return Err(self.error_at(start, ParseErrorKind::ExpectedNumber));
        }

        // Exponent
        if self.peek() == Some('e') || self.peek() == Some('E') {
            self.next();
            if self.peek() == Some('-') || self.peek() == Some('+') {
                self.next();
            }
            self.skip_digits();
        }

        let s = &self.input[start..self.pos];
        let n: f64 = s
            .parse()
            .map_err(|_| self.error_at(start, ParseErrorKind::InvalidNumber(s.to_string())))?;
        if !n.is_finite() {
            return Err(self.error_at(start, ParseErrorKind::InvalidNumber(s.to_string())));
        }
        Ok(n)
    }

    fn parse_flag(&mut self) -> Result<bool, ParseError> {
        self.skip_whitespace_and_comma();
        let offset = self.pos;
        match self.next() {
            Some('0') => Ok(false),
            Some('1') => Ok(true),
            _ => Err(self.error_at(offset, ParseErrorKind::ExpectedFlag)),
        }
    }

    fn skip_digits(&mut self) -> usize {
        let mut n = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.next();
            n += 1;
        }
        n
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.next();
        }
    }

    fn skip_whitespace_and_comma(&mut self) {
        self.skip_whitespace();
        if self.peek() == Some(',') {
            self.next();
        }
        self.skip_whitespace();
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, offset: usize, kind: ParseErrorKind) -> ParseError {
        ParseError { offset, kind }
    }
}
