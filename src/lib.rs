//! flatpath - SVG path data flattening
//!
//! flatpath parses path data, bakes an affine transform into it (arcs
//! included), and writes it back in its most compact equivalent form.

use std::num::NonZeroU32;

use rayon::prelude::*;
use serde::{Deserialize, Deserializer};
use tracing::debug;

mod arc;
mod error;
mod optimize;
mod parse;
mod path;
mod serialize;
mod shapes;
mod transform;

pub use arc::*;
pub use error::*;
pub use optimize::*;
pub use parse::*;
pub use path::*;
pub use serialize::*;
pub use shapes::*;
pub use transform::*;

/// Parse `d`, apply `matrix` and re-serialize with the given options.
pub fn flatten(d: &str, matrix: &Matrix, options: &FormatOptions) -> Result<String, FlattenError> {
    let path = parse_path(d)?;
    flatten_path(path, matrix, options)
}

/// Run an already parsed path through the pipeline. Consumes the path.
pub fn flatten_path(
    path: Path,
    matrix: &Matrix,
    options: &FormatOptions,
) -> Result<String, FlattenError> {
    matrix.validate()?;
    debug!(commands = path.len(), "flattening path");

    let path = if options.convert_arcs_to_beziers {
        arcs_to_cubics(path, options.arc_accuracy.get())
    } else {
        path
    };
    let path = transform_path(path, matrix)?;
    let path = optimize(path, options);

    Ok(serialize_path(&path, options.decimal_places, options.minify))
}

/// Lower a basic shape to a path and run it through the pipeline.
pub fn flatten_shape(
    shape: &Shape,
    matrix: &Matrix,
    options: &FormatOptions,
) -> Result<String, FlattenError> {
    let path = shape.to_path()?;
    debug!(shape = shape.name(), "lowered shape");
    flatten_path(path, matrix, options)
}

/// Flatten many paths in parallel. Each input succeeds or fails on its own;
/// results come back in input order.
pub fn flatten_batch<S>(
    inputs: &[S],
    matrix: &Matrix,
    options: &FormatOptions,
) -> Vec<Result<String, FlattenError>>
where
    S: AsRef<str> + Sync,
{
    inputs
        .par_iter()
        .map(|d| flatten(d.as_ref(), matrix, options))
        .collect()
}

/// Output formatting options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct FormatOptions {
    /// Number of decimal places for coordinates (default: 3). `None` keeps
    /// full precision; in TOML this is written `decimal-places = "full"`.
    #[serde(deserialize_with = "deserialize_decimals")]
    pub decimal_places: Option<u8>,
    /// Drop every separator and command letter that is not needed
    pub minify: bool,
    /// Write commands after the first relative to the current point
    pub prefer_relative: bool,
    /// Use H, V, S and T where possible
    pub use_shorthands: bool,
    /// Replace arcs with cubic curves before transforming
    pub convert_arcs_to_beziers: bool,
    /// Cubic segments per quarter turn of arc, at most `MAX_ARC_ACCURACY`
    pub arc_accuracy: NonZeroU32,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            decimal_places: Some(3),
            minify: true,
            prefer_relative: true,
            use_shorthands: true,
            convert_arcs_to_beziers: false,
            arc_accuracy: NonZeroU32::MIN,
        }
    }
}

impl FormatOptions {
    /// Load options from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, FlattenError> {
        Ok(toml::from_str(s)?)
    }
}

fn deserialize_decimals<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimals {
        Places(u8),
        Keyword(String),
    }

    match Decimals::deserialize(deserializer)? {
        Decimals::Places(n) => Ok(Some(n)),
        Decimals::Keyword(k) if k == "full" => Ok(None),
        Decimals::Keyword(k) => Err(serde::de::Error::custom(format!(
            "expected a number of decimal places or \"full\", got {k:?}"
        ))),
    }
}
