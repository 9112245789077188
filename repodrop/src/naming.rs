//! Short, extension-preserving names for stored files.
//!
//! A generated name is five random characters from a URL-safe alphabet followed by the original
//! file's extension, e.g. `photo.png` becomes `Qx3_k.png`. Names are collision-unlikely, not
//! unique: with 64^5 (about 1.07e9) combinations, the chance of a clash among 10,000 uploads is
//! below 5%. Collisions are not detected here; GitHub rejects a write to an existing path, which
//! surfaces as an upstream error.

use rand::prelude::RngExt;
use rand::rng;

/// Characters a short id is drawn from. Safe in paths and URLs without escaping.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of the random part of a generated name
pub const SHORT_ID_LEN: usize = 5;

/// Extension of `filename` including the leading dot, or `""`.
///
/// Follows `extname` rules on the final path component: the text from the last `.` on, unless
/// that dot is the first character (`.bashrc`) or the component is `..`. The extension is
/// returned verbatim, with no case folding.
pub fn extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    match base.rfind('.') {
        Some(dot) if dot > 0 && base != ".." => &base[dot..],
        _ => "",
    }
}

/// Random identifier of [`SHORT_ID_LEN`] characters
pub fn short_id() -> String {
    let mut rng = rng();
    (0..SHORT_ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Storage name for an upload originally called `original_filename`
pub fn generate_short_name(original_filename: &str) -> String {
    format!("{}{}", short_id(), extension(original_filename))
}
