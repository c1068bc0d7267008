//! Well coordinate conversion for SBS microplates.
//!
//! Offsets are 0-based and column-major: the offset walks down each column
//! before moving to the next one. On a 96-well plate (8 rows) A1 is 0, B1 is
//! 1, H1 is 7 and A2 is 8. The same conversion is used by every encoder so
//! the serialized indexes and the display names always agree.

use crate::constants::ROWS_96_WELL;
use crate::error::{EncodeError, Result};

/// Parses a well name ("A1", "H12") into a column-major offset.
///
/// Pure digit strings pass through unchanged so callers can hand in an
/// already-computed offset where a name is accepted.
pub fn well_name_to_offset(name: &str, rows: u32) -> Result<u32> {
    let name = name.trim();
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
        return name
            .parse::<u32>()
            .map_err(|_| EncodeError::InvalidWellName(name.to_string()));
    }

    let mut bytes = name.bytes();
    let row_letter = bytes
        .next()
        .ok_or_else(|| EncodeError::InvalidWellName(name.to_string()))?
        .to_ascii_uppercase();
    if !row_letter.is_ascii_uppercase() {
        return Err(EncodeError::InvalidWellName(name.to_string()));
    }
    let row = u32::from(row_letter - b'A');
    if row >= rows {
        return Err(EncodeError::InvalidWellName(name.to_string()));
    }

    let col_part = &name[1..];
    let col = col_part
        .parse::<u32>()
        .map_err(|_| EncodeError::InvalidWellName(name.to_string()))?;
    if col == 0 {
        return Err(EncodeError::InvalidWellName(name.to_string()));
    }

    Ok((col - 1) * rows + row)
}

/// Formats a column-major offset as a well name ("A1", "H12").
pub fn offset_to_well_name(offset: u32, rows: u32) -> String {
    let col = offset / rows;
    let row = offset % rows;
    let row_letter = char::from(b'A' + row as u8);
    format!("{}{}", row_letter, col + 1)
}

/// Joins offsets into the wire form the controller expects: semicolon
/// separated with a trailing semicolon ("0;1;2;").
pub fn serialized_well_indexes(offsets: &[u32]) -> String {
    let mut out = String::new();
    for offset in offsets {
        out.push_str(&offset.to_string());
        out.push(';');
    }
    out
}

/// Builds the human-readable well selection string.
///
/// When every tip targets the same well the controller displays a count form
/// ("8 * A1"); otherwise the individual names are joined with semicolons.
pub fn selected_wells_string(offsets: &[u32], rows: u32) -> String {
    match offsets {
        [] => String::new(),
        [first, rest @ ..] if rest.iter().all(|o| o == first) => {
            format!("{} * {}", offsets.len(), offset_to_well_name(*first, rows))
        }
        _ => offsets
            .iter()
            .map(|o| offset_to_well_name(*o, rows))
            .collect::<Vec<_>>()
            .join(";"),
    }
}

/// Convenience wrapper for 96-well plates.
pub fn well_96_to_offset(name: &str) -> Result<u32> {
    well_name_to_offset(name, ROWS_96_WELL)
}
