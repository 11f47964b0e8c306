//! Formatting of allocated document numbers.
//!
//! The allocator hands out bare integers; these helpers turn them into the display form that
//! consumers embed in invoices, sales and orders. The sequential part is always zero-padded so
//! that numbers sort lexicographically in the same order they were issued.

/// Number of digits in the zero-padded sequential part of a document number.
pub const SEQUENCE_WIDTH: usize = 9;

/// Formats a fiscal document number, e.g. `001-001-000000123` for establishment "001",
/// emission point "001" and sequence value 123.
pub fn fiscal_number(establishment: &str, emission_point: &str, value: i64) -> String {
    format!("{establishment}-{emission_point}-{value:0width$}", width = SEQUENCE_WIDTH)
}

/// Formats an internal (non-fiscal) document number. The free-text prefix takes the place of
/// the emission point, e.g. `VTA-001-000000123`.
pub fn prefixed_number(prefix: &str, establishment: &str, value: i64) -> String {
    format!("{prefix}-{establishment}-{value:0width$}", width = SEQUENCE_WIDTH)
}

/// Picks the fiscal or prefixed format depending on whether a prefix was supplied.
pub fn document_number(prefix: Option<&str>, establishment: &str, emission_point: &str, value: i64) -> String {
    match prefix {
        Some(p) => prefixed_number(p, establishment, value),
        None => fiscal_number(establishment, emission_point, value),
    }
}
