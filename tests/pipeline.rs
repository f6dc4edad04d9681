//! Pipeline tests - parse, transform, optimize and serialize real-world path data.

use flatpath::{
    FlattenError, FormatOptions, Matrix, Path, Segment, Shape, flatten, flatten_batch,
    flatten_shape, optimize, parse_path, serialize_path, transform_path,
};

/// Icon-style path data as it shows up in the wild.
const CORPUS: &[&str] = &[
    "M10 10 L20 10 L20 20 Z",
    "M12 2C6.48 2 2 6.48 2 12s4.48 10 10 10 10-4.48 10-10S17.52 2 12 2zm0 18c-4.41 0-8-3.59-8-8s3.59-8 8-8 8 3.59 8 8-3.59 8-8 8z",
    "M3 17.25V21h3.75L17.81 9.94l-3.75-3.75L3 17.25zM20.71 7.04a.996.996 0 000-1.41l-2.34-2.34a.996.996 0 00-1.41 0l-1.83 1.83 3.75 3.75 1.83-1.83z",
    "M0 0Q10 10 20 0T40 0T60 0",
    "M100,200 C100,100 250,100 250,200 S400,300 400,200",
    "M0.5.5l10-5-.5.25h-3.3e1v1E1z",
    "M 50 50 m -10 0 a 10 10 0 1 0 20 0 a 10 10 0 1 0 -20 0",
    "M19 6.41L17.59 5 12 10.59 6.41 5 5 6.41 10.59 12 5 17.59 6.41 19 12 13.41 17.59 19 19 17.59 13.41 12z",
];

fn plain() -> FormatOptions {
    FormatOptions {
        minify: false,
        prefer_relative: false,
        use_shorthands: false,
        ..FormatOptions::default()
    }
}

fn assert_paths_close(a: &Path, b: &Path, tolerance: f64) {
    assert_eq!(a.len(), b.len(), "command count differs");
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.kind(), y.kind());
        for (p, q) in x.segment.operands().iter().zip(y.segment.operands().iter()) {
            assert!((p - q).abs() <= tolerance, "{p} vs {q} in {x:?} / {y:?}");
        }
    }
}

#[test]
fn test_corpus_flatten() {
    let mut total_original = 0usize;
    let mut total_flattened = 0usize;

    for d in CORPUS {
        let flattened = flatten(d, &Matrix::IDENTITY, &FormatOptions::default())
            .unwrap_or_else(|e| panic!("{d}: {e}"));
        total_original += d.len();
        total_flattened += flattened.len();

        // the output must be valid path data drawing the same thing
        let original = parse_path(d).unwrap();
        let reparsed = parse_path(&flattened).unwrap();
        assert_paths_close(&original, &reparsed, 0.06);
    }

    println!("Size: {} -> {} bytes", total_original, total_flattened);
    assert!(total_flattened < total_original);
}

#[test]
fn test_round_trip_full_precision() {
    for d in CORPUS {
        let path = parse_path(d).unwrap();
        for minify in [false, true] {
            let text = serialize_path(&path, None, minify);
            assert_eq!(parse_path(&text).unwrap(), path, "{text}");
        }
    }
}

#[test]
fn test_round_trip_rounded() {
    for d in CORPUS {
        let path = parse_path(d).unwrap();
        let text = serialize_path(&path, Some(3), true);
        assert_paths_close(&parse_path(&text).unwrap(), &path, 0.0005 + 1e-9);
    }
}

#[test]
fn test_optimize_idempotent() {
    let options = FormatOptions::default();
    for d in CORPUS {
        let once = optimize(parse_path(d).unwrap(), &options);
        let twice = optimize(once.clone(), &options);
        assert_eq!(once, twice, "{d}");

        let text = serialize_path(&once, options.decimal_places, options.minify);
        let again = flatten(&text, &Matrix::IDENTITY, &options).unwrap();
        assert_eq!(text, again);
    }
}

#[test]
fn test_identity_transform_is_exact() {
    for d in CORPUS {
        let path = parse_path(d).unwrap();
        assert_eq!(transform_path(path.clone(), &Matrix::IDENTITY).unwrap(), path);
    }
}

#[test]
fn test_shorthand_and_relative() {
    let out = flatten("M10 10 L20 10 L20 20", &Matrix::IDENTITY, &FormatOptions::default()).unwrap();
    assert_eq!(out, "M10 10h10v10");
}

#[test]
fn test_circle_to_path() {
    let circle = Shape::Circle {
        cx: 50.0,
        cy: 50.0,
        r: 40.0,
    };
    let out = flatten_shape(&circle, &Matrix::IDENTITY, &plain()).unwrap();
    assert_eq!(out, "M90 50 A40 40 0 1 1 10 50 A40 40 0 1 1 90 50");
}

#[test]
fn test_scale_line() {
    let out = flatten("M0 0 L10 0", &Matrix::IDENTITY.scale(2.0, 1.0), &plain()).unwrap();
    assert_eq!(out, "M0 0 L20 0");
}

#[test]
fn test_arc_flags_without_separators() {
    let path = parse_path("M0 0A5 5 0 0 0 10 10").unwrap();
    assert_eq!(path.len(), 2);
    let Segment::Arc(arc) = path.commands[1].segment else {
        panic!("Expected Arc command");
    };
    assert!(!arc.large_arc);
    assert!(!arc.sweep);
}

#[test]
fn test_implicit_lineto_repeat() {
    let path = parse_path("M0 0L10 10 20 20").unwrap();
    let letters: Vec<char> = path.iter().map(|c| c.letter()).collect();
    assert_eq!(letters, vec!['M', 'L', 'L']);
}

#[test]
fn test_rotated_circle_keeps_radii() {
    let circle = Shape::Circle {
        cx: 0.0,
        cy: 0.0,
        r: 40.0,
    };
    let out = flatten_shape(&circle, &Matrix::IDENTITY.rotate(30.0), &plain()).unwrap();
    let path = parse_path(&out).unwrap();
    for cmd in path.iter() {
        if let Segment::Arc(arc) = cmd.segment {
            assert_eq!((arc.rx, arc.ry, arc.x_axis_rotation), (40.0, 40.0, 0.0));
        }
    }
}

#[test]
fn test_rotate_quarter_turn() {
    let out = flatten("M0 0 L10 0", &Matrix::IDENTITY.rotate(90.0), &plain()).unwrap();
    assert_eq!(out, "M0 0 L0 10");
}

#[test]
fn test_mirror_reverses_sweep() {
    let out = flatten(
        "M0 0 A10 10 0 0 1 20 0",
        &Matrix::IDENTITY.scale(-1.0, 1.0),
        &plain(),
    )
    .unwrap();
    assert_eq!(out, "M0 0 A10 10 0 0 0 -20 0");
}

#[test]
fn test_skewed_ellipse() {
    let out = flatten(
        "M0 0 A20 10 0 0 1 40 0",
        &Matrix::IDENTITY.skew_x(30.0),
        &plain(),
    )
    .unwrap();
    let path = parse_path(&out).unwrap();
    let Segment::Arc(arc) = path.commands[1].segment else {
        panic!("Expected Arc command");
    };
    // skewing an ellipse tilts it
    assert!(arc.x_axis_rotation > 0.0 && arc.x_axis_rotation < 90.0);
    // area is preserved by a shear: rx * ry stays 200
    assert!((arc.rx * arc.ry - 200.0).abs() < 0.5, "{arc:?}");
}

#[test]
fn test_arcs_to_cubic() {
    let options = FormatOptions {
        convert_arcs_to_beziers: true,
        ..FormatOptions::default()
    };
    let circle = Shape::Circle {
        cx: 50.0,
        cy: 50.0,
        r: 40.0,
    };
    let out = flatten_shape(&circle, &Matrix::IDENTITY.scale(2.0, 2.0), &options).unwrap();
    assert!(!out.contains(['a', 'A']), "{out}");

    // every curve endpoint lies on the scaled circle
    let path = parse_path(&out).unwrap();
    for cmd in path.iter() {
        if let Segment::CurveTo { x, y, .. } = cmd.segment {
            let r = ((x - 100.0).powi(2) + (y - 100.0).powi(2)).sqrt();
            assert!((r - 80.0).abs() < 0.01, "{x} {y}");
        }
    }
}

#[test]
fn test_batch_isolates_failures() {
    let inputs = ["M0 0 L10 0", "M0 0 X1 1", "", "M5 5 h1"];
    let results = flatten_batch(&inputs, &Matrix::IDENTITY, &FormatOptions::default());

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_deref().unwrap(), "M0 0h10");
    assert!(matches!(results[1], Err(FlattenError::Parse(_))));
    assert_eq!(results[2].as_deref().unwrap(), "");
    assert_eq!(results[3].as_deref().unwrap(), "M5 5h1");
}

#[test]
fn test_singular_matrix_never_emits_flat_arc() {
    let options = FormatOptions {
        decimal_places: None,
        ..plain()
    };
    let out = flatten(
        "M0 0 A10 10 0 0 1 20 0",
        &Matrix::IDENTITY.scale(1.0, 0.0),
        &options,
    )
    .unwrap();
    assert_eq!(out, "M0 0 L20 0");
}

#[test]
fn test_invalid_matrix_rejected() {
    let err = flatten(
        "M0 0 L10 0",
        &Matrix::new(1.0, 0.0, 0.0, 1.0, f64::NAN, 0.0),
        &FormatOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, FlattenError::InvalidMatrix(_)));
}

#[test]
fn test_precision_option() {
    let options = FormatOptions {
        decimal_places: Some(1),
        ..FormatOptions::default()
    };
    let out = flatten("M0.123 0.456 L10.06 0.456", &Matrix::IDENTITY, &options).unwrap();
    assert_eq!(out, "M.1 .5h10");
}
