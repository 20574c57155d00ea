//! # Label Records
//!
//! A label carries between one and three named fields. The scanner and the
//! operator UI hand the engine a single delimited string:
//!
//! ```text
//! "A012345|50|REEL-042"
//!     │     │     │
//!     │     │     └── Lot Nr
//!     │     └──────── Cantitate
//!     └────────────── SAP-Nr
//! ```
//!
//! Field names are assigned by position, never inferred from the content.
//! Missing trailing segments become empty values, which render as a
//! placeholder row rather than disappearing from the label.
//!
//! ## Example
//!
//! ```
//! use eticheta::record::parse;
//!
//! let parsed = parse("A1|5");
//! let pairs: Vec<_> = parsed.record.iter().map(|f| (f.name.as_str(), f.value.as_str())).collect();
//! assert_eq!(pairs, [("SAP-Nr", "A1"), ("Cantitate", "5"), ("Lot Nr", "")]);
//! ```

use serde::Serialize;
use thiserror::Error;

/// Segment separator in raw input.
pub const DELIMITER: char = '|';

/// Positional field names.
pub const FIELD_NAMES: [&str; 3] = ["SAP-Nr", "Cantitate", "Lot Nr"];

/// Largest number of fields a label can carry.
pub const MAX_FIELDS: usize = 3;

/// Errors building a record from explicit fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("a label needs at least one field")]
    Empty,

    #[error("a label holds at most {MAX_FIELDS} fields, got {0}")]
    TooManyFields(usize),
}

/// One named value on a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Empty values are drawn as a placeholder caption.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Ordered, immutable set of 1–3 fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelRecord {
    fields: Vec<Field>,
}

impl LabelRecord {
    /// Build a record from explicit fields.
    pub fn new(fields: Vec<Field>) -> Result<Self, RecordError> {
        match fields.len() {
            0 => Err(RecordError::Empty),
            n if n > MAX_FIELDS => Err(RecordError::TooManyFields(n)),
            _ => Ok(Self { fields }),
        }
    }

    /// Build a record from positional values, naming them `SAP-Nr`,
    /// `Cantitate` and `Lot Nr` in order.
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Result<Self, RecordError> {
        if values.len() > MAX_FIELDS {
            return Err(RecordError::TooManyFields(values.len()));
        }
        let fields = values
            .iter()
            .zip(FIELD_NAMES)
            .map(|(value, name)| Field::new(name, value.as_ref().trim()))
            .collect();
        Self::new(fields)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; a record has at least one field.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a LabelRecord {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// What the parser had to make up or throw away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseDegraded {
    /// Names of fields that had no segment in the input.
    pub missing: Vec<&'static str>,
    /// Segments past the third, ignored.
    pub discarded: Vec<String>,
}

impl ParseDegraded {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.discarded.is_empty()
    }
}

/// Result of parsing raw input. Parsing never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub record: LabelRecord,
    pub degraded: ParseDegraded,
}

/// Split raw delimited input into a three-field record.
///
/// Segments are trimmed. Input without a delimiter becomes the first
/// field; absent segments become empty values.
pub fn parse(raw: &str) -> Parsed {
    let mut segments = raw.split(DELIMITER).map(str::trim);
    let mut degraded = ParseDegraded::default();

    let fields = FIELD_NAMES
        .iter()
        .map(|&name| {
            let value = match segments.next() {
                Some(segment) => segment.to_string(),
                None => {
                    degraded.missing.push(name);
                    String::new()
                }
            };
            Field::new(name, value)
        })
        .collect();

    degraded.discarded = segments.map(str::to_string).collect();

    if !degraded.is_clean() {
        log::debug!(
            "parse degraded: missing {:?}, discarded {:?}",
            degraded.missing,
            degraded.discarded
        );
    }

    Parsed {
        record: LabelRecord { fields },
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(record: &LabelRecord) -> Vec<(&str, &str)> {
        record
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect()
    }

    #[test]
    fn test_two_segments() {
        let parsed = parse("A1|5");
        assert_eq!(
            pairs(&parsed.record),
            vec![("SAP-Nr", "A1"), ("Cantitate", "5"), ("Lot Nr", "")]
        );
        assert_eq!(parsed.degraded.missing, vec!["Lot Nr"]);
    }

    #[test]
    fn test_no_delimiter() {
        let parsed = parse("A012345");
        assert_eq!(
            pairs(&parsed.record),
            vec![("SAP-Nr", "A012345"), ("Cantitate", ""), ("Lot Nr", "")]
        );
    }

    #[test]
    fn test_always_three_fields() {
        for raw in ["", "x", "x|y", "x|y|z", "|", "||"] {
            assert_eq!(parse(raw).record.len(), 3, "input {:?}", raw);
        }
    }

    #[test]
    fn test_full_input_is_clean() {
        let parsed = parse("A012345|50|REEL-042");
        assert!(parsed.degraded.is_clean());
        assert_eq!(parsed.record.fields()[2].value, "REEL-042");
    }

    #[test]
    fn test_segments_trimmed() {
        let parsed = parse("  A1 | 5 |  L7 ");
        assert_eq!(
            pairs(&parsed.record),
            vec![("SAP-Nr", "A1"), ("Cantitate", "5"), ("Lot Nr", "L7")]
        );
    }

    #[test]
    fn test_extra_segments_discarded() {
        let parsed = parse("a|b|c|d|e");
        assert_eq!(parsed.record.len(), 3);
        assert_eq!(parsed.degraded.discarded, vec!["d", "e"]);
    }

    #[test]
    fn test_record_bounds() {
        assert_eq!(LabelRecord::new(vec![]), Err(RecordError::Empty));
        let four = vec![Field::new("a", "1"); 4];
        assert_eq!(LabelRecord::new(four), Err(RecordError::TooManyFields(4)));
        assert!(LabelRecord::from_values(&["one"]).is_ok());
    }
}
