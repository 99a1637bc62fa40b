//! Header normalization
//!
//! Canonicalizes column header text so lookups survive the spelling and
//! spacing drift between supplier spreadsheet versions: `U.PRICE`,
//! `u price` and ` U PRICE ` all become `U_PRICE`.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use super::Cell;

/// Canonical form of a header string
///
/// Accents are folded, whitespace is collapsed, punctuation is removed
/// (acting as a word separator when it sits between two words), the result
/// is upper-cased and spaces become `_`. Never fails; empty input yields "".
pub fn normalize_field(raw: &str) -> String {
    let folded: String = raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();

    let spaced: String = folded
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .map(|word| word.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Canonical form of a header cell; non-text and empty cells yield ""
pub fn normalize_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => normalize_field(text),
        Cell::Empty | Cell::Number(_) => String::new(),
    }
}
