// Path similarity used to decide whether two catalog entries point at the same file

/// Drop the trailing file extension, e.g. "/movies/movie.mkv" -> "/movies/movie".
///
/// A path is left alone when its last `.` sits at position 0 or before the
/// last path separator (a dotted directory name, not an extension).
pub fn strip_extension(path: &str) -> &str {
    let Some(dot) = path.rfind('.') else {
        return path;
    };
    if dot == 0 {
        return path;
    }
    match path.rfind(['/', '\\']) {
        Some(separator) if separator > dot => path,
        _ => &path[..dot],
    }
}

/// Similarity of two file paths in `0..=100`, ignoring their extensions.
///
/// `100 - floor(distance * 100 / max_len)`, with the Levenshtein distance and
/// `max_len` both counted in code points; two empty paths are identical.
pub fn score(path_a: &str, path_b: &str) -> u8 {
    let a = strip_extension(path_a);
    let b = strip_extension(path_b);

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100;
    }

    let distance = strsim::levenshtein(a, b);
    // distance <= max_len, so this never underflows
    (100 - distance * 100 / max_len) as u8
}
