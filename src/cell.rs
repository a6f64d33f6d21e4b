//! Cell values as returned by point lookups.

use std::fmt;

/// Wire type flag for numeric cells.
pub const TYPE_NUMERIC: &str = "1";
/// Wire type flag for string cells.
pub const TYPE_STRING: &str = "2";
/// Wire type flag for a row the server could not evaluate.
pub const TYPE_ERROR: &str = "99";

/// The value of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// A numeric cell.
    Number(f64),
    /// A string cell.
    Text(String),
    /// Requested during a collecting phase; available after flush.
    Pending,
    /// Never resolved, absent on the server, or rejected by it.
    Unavailable,
}

impl CellValue {
    /// Decode a `type;exists;value` row.
    ///
    /// Error rows, rows flagged as non-existing, and numeric values that do not
    /// parse all decode to [`CellValue::Unavailable`].
    pub fn from_row(fields: &[String]) -> Self {
        match fields {
            [kind, exists, value, ..] if exists == "1" => match kind.as_str() {
                TYPE_NUMERIC => value
                    .parse::<f64>()
                    .map(CellValue::Number)
                    .unwrap_or(CellValue::Unavailable),
                TYPE_STRING => CellValue::Text(value.clone()),
                _ => CellValue::Unavailable,
            },
            _ => CellValue::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CellValue::Number(_) | CellValue::Text(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Pending => write!(f, "#PENDING"),
            CellValue::Unavailable => write!(f, "#N/A"),
        }
    }
}
