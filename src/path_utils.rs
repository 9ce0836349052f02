//! Path utilities for ordering, naming and safe extraction.
//!
//! This module hosts the natural-order comparator used to put numbered pages in reading
//! order, the helpers that derive output PDF paths from input archives, and the guard
//! that keeps archive entries inside the extraction workspace.

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    /// Splits a name into alternating text and digit runs. Digit runs are captured.
    static ref TOKEN_REGEX: Regex = Regex::new(r"(\d+)|\D+").unwrap();
    static ref DIGIT_REGEX: Regex = Regex::new(r"^\d$").unwrap();
}

/// One run of a natural sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalToken {
    /// Case-folded non-digit run
    Text(String),
    /// Digit run, compared by value
    Number(NumericRun),
}

/// A run of decimal digits of arbitrary length, stored as ASCII without leading zeros.
///
/// Any Unicode decimal digit is accepted (`"１０"` is ten). Ordering is by value: a shorter
/// run is smaller, equal lengths compare digit by digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericRun(String);

impl NumericRun {
    fn new(digits: &str) -> Self {
        let ascii: String = digits
            .chars()
            .filter_map(decimal_digit_value)
            .filter_map(|value| char::from_digit(value, 10))
            .collect();
        NumericRun(ascii.trim_start_matches('0').to_string())
    }
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DIGIT_REGEX.is_match(c.encode_utf8(&mut buf))
}

/// Value of a Unicode decimal digit.
///
/// Decimal digits are encoded in contiguous blocks of ten that start at zero, so the value
/// is the distance to the start of the surrounding digit range, modulo ten.
fn decimal_digit_value(c: char) -> Option<u32> {
    if let Some(value) = c.to_digit(10) {
        return Some(value);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some((c as u32 - start) % 10)
}

impl Ord for NumericRun {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NumericRun {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key for natural ordering: "page2" sorts before "page10".
///
/// The key always opens with a text token (empty when the name starts with a digit) and
/// then alternates, so tokens at the same position are always of the same kind. Keys
/// compare positionally and a strict prefix sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(pub Vec<NaturalToken>);

/// Builds the natural sort key of `name`.
pub fn natural_sort_key(name: &str) -> NaturalKey {
    let mut tokens = Vec::new();
    for captures in TOKEN_REGEX.captures_iter(name) {
        if let Some(digits) = captures.get(1) {
            if tokens.is_empty() {
                tokens.push(NaturalToken::Text(String::new()));
            }
            tokens.push(NaturalToken::Number(NumericRun::new(digits.as_str())));
        } else if let Some(text) = captures.get(0) {
            tokens.push(NaturalToken::Text(text.as_str().to_lowercase()));
        }
    }
    if tokens.is_empty() {
        tokens.push(NaturalToken::Text(String::new()));
    }
    NaturalKey(tokens)
}

/// Compares two names in natural order.
pub fn compare_natural(a: &str, b: &str) -> Ordering {
    natural_sort_key(a).cmp(&natural_sort_key(b))
}

/// Orders page paths by base name in natural order.
///
/// The directory part does not influence the primary key. Equal base-name keys fall back to
/// the natural key of the whole path and then to the raw path so the order stays total.
pub fn compare_paths_natural(a: &Path, b: &Path) -> Ordering {
    compare_natural(&get_file_name_lossy(a), &get_file_name_lossy(b))
        .then_with(|| compare_natural(&path_to_string_lossy(a), &path_to_string_lossy(b)))
        .then_with(|| a.cmp(b))
}

/// Gets the file name from a path with fallback to lossy conversion.
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Checks if a filename starts with a dot (hidden file).
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Output path used when none is given: the input with its extension replaced by `.pdf`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// Output path inside `output_dir`, named after the input's stem.
pub fn output_path_in_dir(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{}.pdf", stem))
}

/// Resolves a RAR entry name below `destination`.
///
/// Both `/` and `\` are accepted as separators. Absolute names, drive prefixes and `..`
/// components are rejected so nothing can be written outside the workspace. ZIP entries go
/// through `ZipFile::enclosed_name` instead.
pub fn safe_entry_path(destination: &Path, entry_name: &str) -> Result<PathBuf> {
    let normalized = entry_name.replace('\\', "/");
    let relative = Path::new(&normalized);
    let mut resolved = destination.to_path_buf();
    let mut depth = 0usize;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidPath(
                    PathBuf::from(entry_name),
                    "Archive entry escapes the extraction directory".to_string(),
                ));
            }
        }
    }

    if depth == 0 {
        return Err(Error::InvalidPath(
            PathBuf::from(entry_name),
            "Archive entry has an empty name".to_string(),
        ));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort_by(|a, b| compare_natural(a, b));
        names
    }

    #[test]
    fn test_natural_order_numbers() {
        assert_eq!(
            sorted(&["page2.png", "page10.png", "page1.png"]),
            vec!["page1.png", "page2.png", "page10.png"]
        );
        assert_eq!(
            sorted(&["page100.png", "page10.png", "page2.png"]),
            vec!["page2.png", "page10.png", "page100.png"]
        );
    }

    #[test]
    fn test_natural_order_case_insensitive() {
        assert_eq!(compare_natural("Page1.png", "page1.PNG"), Ordering::Equal);
        assert_eq!(compare_natural("B.png", "a.png"), Ordering::Greater);
    }

    #[test]
    fn test_natural_key_shapes() {
        assert_eq!(
            natural_sort_key("cover"),
            NaturalKey(vec![NaturalToken::Text("cover".to_string())])
        );
        assert_eq!(
            natural_sort_key("0042"),
            NaturalKey(vec![
                NaturalToken::Text(String::new()),
                NaturalToken::Number(NumericRun::new("42")),
            ])
        );
        assert_eq!(natural_sort_key(""), NaturalKey(vec![NaturalToken::Text(String::new())]));
    }

    #[test]
    fn test_natural_order_full_width_digits() {
        assert_eq!(
            sorted(&["ページ１０.jpg", "ページ２.jpg", "ページ１.jpg"]),
            vec!["ページ１.jpg", "ページ２.jpg", "ページ１０.jpg"]
        );
        assert_eq!(
            natural_sort_key("ページ１０.jpg"),
            NaturalKey(vec![
                NaturalToken::Text("ページ".to_string()),
                NaturalToken::Number(NumericRun::new("10")),
                NaturalToken::Text(".jpg".to_string()),
            ])
        );
        // Mixed scripts compare by value
        assert_eq!(compare_natural("p０１０", "p10"), Ordering::Equal);
        assert_eq!(compare_natural("p٣", "p12"), Ordering::Less);
    }

    #[test]
    fn test_natural_key_alternates() {
        for name in ["ページ１０ｂ２.jpg", "12ab034", "a1b2c3", "x"] {
            let NaturalKey(tokens) = natural_sort_key(name);
            assert!(matches!(tokens[0], NaturalToken::Text(_)));
            for pair in tokens.windows(2) {
                let same_kind = matches!(
                    pair,
                    [NaturalToken::Text(_), NaturalToken::Text(_)]
                        | [NaturalToken::Number(_), NaturalToken::Number(_)]
                );
                assert!(!same_kind, "adjacent tokens of one kind in {:?}", name);
            }
        }
    }

    #[test]
    fn test_natural_order_is_idempotent() {
        let once = sorted(&[
            "page10.png",
            "Page2.png",
            "page002.png",
            "cover.jpg",
            "10.jpg",
            "page1a.png",
            "page1.png",
        ]);
        let refs: Vec<&str> = once.iter().map(String::as_str).collect();
        assert_eq!(sorted(&refs), once);

        let paths = [
            Path::new("b/page2.png"),
            Path::new("a/page2.png"),
            Path::new("page1.png"),
        ];
        let mut first = paths.to_vec();
        first.sort_by(|a, b| compare_paths_natural(a, b));
        let mut second = first.clone();
        second.sort_by(|a, b| compare_paths_natural(a, b));
        assert_eq!(first, second);
        assert_eq!(first[0], Path::new("page1.png"));
        assert_eq!(first[1], Path::new("a/page2.png"));
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(compare_natural("page", "page1"), Ordering::Less);
        assert_eq!(compare_natural("page1", "page1a"), Ordering::Less);
    }

    #[test]
    fn test_digit_names_before_letters() {
        assert_eq!(
            sorted(&["b.jpg", "10.jpg", "a.jpg", "9.jpg"]),
            vec!["9.jpg", "10.jpg", "a.jpg", "b.jpg"]
        );
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let big = "page123456789012345678901234567890.png";
        let bigger = "page923456789012345678901234567890.png";
        assert_eq!(compare_natural(big, bigger), Ordering::Less);
        assert_eq!(compare_natural("page007.png", "page7.png"), Ordering::Equal);
    }

    #[test]
    fn test_compare_paths_ignores_directory() {
        let a = Path::new("z_chapter/page1.png");
        let b = Path::new("a_chapter/page2.png");
        assert_eq!(compare_paths_natural(a, b), Ordering::Less);

        // Identical base names fall back to the full path
        let c = Path::new("ch2/01.jpg");
        let d = Path::new("ch10/01.jpg");
        assert_eq!(compare_paths_natural(c, d), Ordering::Less);
    }

    #[test]
    fn test_output_paths() {
        assert_eq!(
            default_output_path(Path::new("books/vol 1.cbz")),
            PathBuf::from("books/vol 1.pdf")
        );
        assert_eq!(
            output_path_in_dir(Path::new("books/vol.2.cbr"), Path::new("out")),
            PathBuf::from("out/vol.2.pdf")
        );
    }

    #[test]
    fn test_safe_entry_path() {
        let dest = Path::new("/tmp/ws");
        assert_eq!(
            safe_entry_path(dest, "ch1/001.jpg").unwrap(),
            PathBuf::from("/tmp/ws/ch1/001.jpg")
        );
        assert_eq!(
            safe_entry_path(dest, "ch1\\002.jpg").unwrap(),
            PathBuf::from("/tmp/ws/ch1/002.jpg")
        );
        assert!(safe_entry_path(dest, "../evil.jpg").is_err());
        assert!(safe_entry_path(dest, "/etc/passwd").is_err());
        assert!(safe_entry_path(dest, "./").is_err());
    }

    #[test]
    fn test_is_hidden_file() {
        assert!(is_hidden_file(Path::new("ch1/._001.jpg")));
        assert!(!is_hidden_file(Path::new("ch1/001.jpg")));
    }
}
