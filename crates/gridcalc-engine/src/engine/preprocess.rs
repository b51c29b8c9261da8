//! Formula preprocessing.
//!
//! Before a formula body can be handed to the arithmetic parser, every
//! reference in it is replaced by a number:
//!
//! - **Range calls**: `SUM(A1:B5, C:C)` → the resolved sum
//! - **Cell references**: `A1` → the resolved value of that cell
//!
//! What remains must be plain arithmetic; anything else is rejected before
//! parsing.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::eval::ValueSource;
use super::range::resolve_range;
use crate::error::{EvalError, Result};

/// Regex that matches `SUM(...)` calls, case-insensitively.
///
/// Captures:
/// - group 1: the range expression between the parentheses
fn sum_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bSUM\(([^)]*)\)").expect("SUM call regex must compile"))
}

fn cell_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+)([0-9]+)\b").expect("cell reference regex must compile")
    })
}

fn arithmetic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9+\-*/().\s]*$").expect("arithmetic charset regex must compile")
    })
}

/// Like `Regex::replace_all`, but the replacement may fail and stop the scan.
fn try_replace_all(
    re: &Regex,
    text: &str,
    mut replacement: impl FnMut(&Captures) -> Result<String>,
) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replacement(&caps)?);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// Render a resolved value as an arithmetic literal.
///
/// Negative values are parenthesized so `2-SUM(A1)` never becomes `2--5`.
fn number_literal(n: f64) -> String {
    if n < 0.0 {
        format!("({})", n)
    } else {
        n.to_string()
    }
}

/// Replace every `SUM(range)` call with its resolved total.
pub fn substitute_sum_calls(body: &str, source: &mut dyn ValueSource) -> Result<String> {
    try_replace_all(sum_fn_re(), body, |caps| {
        let total = resolve_range(&caps[1], source)?;
        if !total.is_finite() {
            return Err(EvalError::NonFiniteResult);
        }
        Ok(number_literal(total))
    })
}

/// Replace every remaining bare cell reference with the referenced value.
///
/// Values that are not finite are substituted as 0. A token shaped like a
/// reference that does not parse (for example `A0`) fails the formula.
pub fn substitute_cell_refs(text: &str, source: &mut dyn ValueSource) -> Result<String> {
    try_replace_all(cell_ref_re(), text, |caps| {
        let token = &caps[0];
        let cell = CellRef::from_str(token).ok_or_else(|| EvalError::AddressParse(token.into()))?;
        let value = source.value_at(cell)?;
        Ok(number_literal(if value.is_finite() { value } else { 0.0 }))
    })
}

/// Reject anything that is not digits, `+ - * / ( ) .` or whitespace.
pub fn validate_arithmetic(text: &str) -> Result<()> {
    if arithmetic_re().is_match(text) {
        Ok(())
    } else {
        Err(EvalError::InvalidFormulaCharacters(text.to_string()))
    }
}
