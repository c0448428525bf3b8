// SPDX-License-Identifier: GPL-3.0-or-later

//! Text normalization for fuzzy catalog matching.
//!
//! Listening history strings carry collaboration spellings and version
//! qualifiers ("ft.", " - 2009 Remaster", "(Live at ...)") that the catalog's
//! canonical names do not. These functions are pure and deterministic.

/// Separator rewrites applied in order, every one of them, to artist names.
/// Canonical forms follow the catalog's artist credit phrases.
pub const ARTIST_SEPARATOR_REWRITES: &[(&str, &str)] = &[
    (", ", " & "),
    (" ft. ", " feat. "),
    (" ft ", " feat. "),
    (" featuring ", " feat. "),
    (" x ", " & "),
];

/// Keywords that mark a trailing `" - <suffix>"` as a version qualifier.
pub const TRACK_SUFFIX_KEYWORDS: &[&str] = &[
    "remaster",
    "remix",
    "mix",
    "version",
    "anniversary",
    "edit",
    "recording",
    "take",
];

/// Keywords that mark a parenthesized segment as a version or credit qualifier.
pub const PAREN_KEYWORDS: &[&str] = &[
    "remaster",
    "remix",
    "mix",
    "version",
    "edit",
    "feat.",
    "feat",
    "ft.",
    "ft",
    "featuring",
    "with",
    "live",
    "acoustic",
    "instrumental",
];

/// Artist credit separators in the priority order used to find the lead artist.
pub const CREDIT_SEPARATORS: &[&str] = &[" & ", " feat. ", " featuring ", " x ", ","];

const SUFFIX_DELIMITER: &str = " - ";

/// Rewrite collaboration separators to their canonical form, then trim.
///
/// Rewrites repeat until nothing changes, so back-to-back separators such as
/// "A x x B" are fully canonicalized and the result is stable under a second pass.
pub fn normalize_artist(name: &str) -> String {
    let mut current = name.to_string();
    loop {
        let next = rewrite_separators(&current, ARTIST_SEPARATOR_REWRITES);
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

/// Trim and drop version qualifiers that never appear in canonical titles.
pub fn normalize_track(name: &str) -> String {
    let name = strip_version_suffix(name.trim(), TRACK_SUFFIX_KEYWORDS);
    collapse_whitespace(&strip_parentheticals(name, PAREN_KEYWORDS))
}

/// Lead artist of a (normalized) credit: everything before the first separator
/// found, trying separators in [`CREDIT_SEPARATORS`] order.
pub fn first_credited_artist(name: &str) -> &str {
    CREDIT_SEPARATORS
        .iter()
        .find_map(|sep| name.find(sep).map(|idx| name[..idx].trim()))
        .unwrap_or(name)
}

/// True when `name` contains any of the [`CREDIT_SEPARATORS`].
pub fn has_credit_separator(name: &str) -> bool {
    CREDIT_SEPARATORS.iter().any(|sep| name.contains(sep))
}

pub fn rewrite_separators(name: &str, rewrites: &[(&str, &str)]) -> String {
    rewrites
        .iter()
        .fold(name.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Cut the text from the first `" - "` onwards when the suffix mentions a keyword.
pub fn strip_version_suffix<'a>(name: &'a str, keywords: &[&str]) -> &'a str {
    match name.find(SUFFIX_DELIMITER) {
        Some(idx) if contains_any(&name[idx + SUFFIX_DELIMITER.len()..], keywords) => &name[..idx],
        _ => name,
    }
}

/// Remove every `(...)` segment whose content mentions a keyword; other
/// segments such as "(Part 1)" belong to the title and are kept.
pub fn strip_parentheticals(name: &str, keywords: &[&str]) -> String {
    let mut out = name.to_string();
    let mut cursor = 0;

    while let Some(open) = out[cursor..].find('(').map(|i| cursor + i) {
        let Some(close) = out[open..].find(')').map(|i| open + i) else {
            break;
        };

        if contains_any(&out[open + 1..close], keywords) {
            out.replace_range(open..=close, "");
            cursor = open;
        } else {
            cursor = close + 1;
        }
    }

    out
}

/// Trim and squeeze internal whitespace runs down to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|keyword| text.contains(keyword))
}
