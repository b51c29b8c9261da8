//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates, plus the
//! bijective base-26 column label codec the references are built on.
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.row, 2);  // 0-indexed
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", " AA10 ").
    /// Returns None if the input is invalid; callers decide whether that is fatal.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name.trim())
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let col = Self::letters_to_col(&caps["letters"])?;
        let row = Self::row_from_number(&caps["numbers"])?;
        Some(CellRef::new(row, col))
    }

    /// Convert spreadsheet-style letters to a column index (A -> 0, Z -> 25, AA -> 26).
    ///
    /// Letters are case-insensitive. Returns None for anything that is not a
    /// non-empty run of ASCII letters, or when the index would overflow.
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut col_acc = 0usize;
        for c in letters.bytes() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        col_acc.checked_sub(1)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Convert a 1-based row number ("1", "42") to a zero-based row index.
    pub fn row_from_number(digits: &str) -> Option<usize> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<usize>().ok()?.checked_sub(1)
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s.trim()).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::CellRef;
    use proptest::prelude::*;

    #[test]
    fn test_from_str_single_letter_columns() {
        let a1 = CellRef::from_str("A1").unwrap();
        assert_eq!((a1.row, a1.col), (0, 0));

        let b1 = CellRef::from_str("B1").unwrap();
        assert_eq!((b1.row, b1.col), (0, 1));

        let z1 = CellRef::from_str("Z1").unwrap();
        assert_eq!((z1.row, z1.col), (0, 25));
    }

    #[test]
    fn test_from_str_multi_letter_columns() {
        assert_eq!(CellRef::from_str("AA1").unwrap().col, 26);
        assert_eq!(CellRef::from_str("AB1").unwrap().col, 27);
        assert_eq!(CellRef::from_str("AZ1").unwrap().col, 51);
        assert_eq!(CellRef::from_str("BA1").unwrap().col, 52);
    }

    #[test]
    fn test_from_str_row_numbers_and_trimming() {
        assert_eq!(CellRef::from_str("A10").unwrap().row, 9);
        assert_eq!(CellRef::from_str("  A100 ").unwrap().row, 99);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(CellRef::from_str("a1"), Some(CellRef::new(0, 0)));
        assert_eq!(CellRef::from_str("aA1").unwrap().col, 26);
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!(CellRef::from_str("").is_none());
        assert!(CellRef::from_str("123").is_none());
        assert!(CellRef::from_str("ABC").is_none());
        assert!(CellRef::from_str("A0").is_none());
        assert!(CellRef::from_str("1A").is_none());
        assert!(CellRef::from_str("A 1").is_none());
        assert!(CellRef::from_str("A1B").is_none());
    }

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_letters_to_col() {
        assert_eq!(CellRef::letters_to_col("A"), Some(0));
        assert_eq!(CellRef::letters_to_col("z"), Some(25));
        assert_eq!(CellRef::letters_to_col("AA"), Some(26));
        assert_eq!(CellRef::letters_to_col("ZZ"), Some(701));
        assert_eq!(CellRef::letters_to_col("AAA"), Some(702));
        assert_eq!(CellRef::letters_to_col(""), None);
        assert_eq!(CellRef::letters_to_col("A1"), None);
    }

    #[test]
    fn test_row_from_number() {
        assert_eq!(CellRef::row_from_number("1"), Some(0));
        assert_eq!(CellRef::row_from_number("250"), Some(249));
        assert_eq!(CellRef::row_from_number("0"), None);
        assert_eq!(CellRef::row_from_number("-1"), None);
        assert_eq!(CellRef::row_from_number(""), None);
    }

    #[test]
    fn test_display_round_trip() {
        for name in ["A1", "Z9", "AA10", "XFD1048576"] {
            assert_eq!(CellRef::from_str(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_column_codec_round_trip_exhaustive() {
        for n in 0..10_000usize {
            assert_eq!(CellRef::letters_to_col(&CellRef::col_to_letters(n)), Some(n));
        }
    }

    proptest! {
        #[test]
        fn prop_column_codec_round_trip(n in 0usize..1_000_000_000) {
            prop_assert_eq!(CellRef::letters_to_col(&CellRef::col_to_letters(n)), Some(n));
        }

        #[test]
        fn prop_letters_are_uppercase(n in 0usize..10_000) {
            prop_assert!(CellRef::col_to_letters(n).bytes().all(|b| b.is_ascii_uppercase()));
        }
    }
}
