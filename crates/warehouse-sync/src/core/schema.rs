//! Schema metadata, watermark values, and primary-key values.
//!
//! These types provide a store-agnostic representation of the shape of a
//! replicated table and of the ordering values used for incremental copies.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::SqlValue;

/// Column metadata as introspected from the replica store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Source data type (e.g. "int", "varchar", "datetime").
    pub data_type: String,

    /// Maximum length for string/binary types (-1 for unbounded).
    pub max_length: i32,

    /// Numeric precision.
    pub precision: i32,

    /// Numeric scale.
    pub scale: i32,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

/// A warehouse column produced by the type mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetColumn {
    /// Column name (same as source).
    pub name: String,

    /// Warehouse data type string (e.g. "bigint", "text", "boolean").
    pub target_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,
}

/// The mapped shape of one warehouse table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSchema {
    /// Columns in source ordinal order.
    pub columns: Vec<TargetColumn>,
}

impl TargetSchema {
    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A watermark value: the monotonically increasing column value identifying
/// rows added or changed since the last successful copy.
///
/// Comparisons across variants are undefined (a table's watermark column does
/// not change type between runs without also changing the fingerprint), so
/// [`Watermark::is_after`] treats a cross-variant comparison as not-greater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Watermark {
    /// Integer watermark (auto-increment ids, version counters).
    Int(i64),

    /// Timestamp watermark (date_changed/date_created style columns).
    DateTime(NaiveDateTime),
}

impl Watermark {
    /// Strict "greater than" comparison used for incremental filtering.
    pub fn is_after(&self, other: &Watermark) -> bool {
        match (self, other) {
            (Watermark::Int(a), Watermark::Int(b)) => a > b,
            (Watermark::DateTime(a), Watermark::DateTime(b)) => a > b,
            _ => false,
        }
    }

    /// Extract a watermark from a row value, widening integer types.
    pub fn from_value(value: &SqlValue) -> Option<Watermark> {
        match value {
            SqlValue::I16(v) => Some(Watermark::Int(*v as i64)),
            SqlValue::I32(v) => Some(Watermark::Int(*v as i64)),
            SqlValue::I64(v) => Some(Watermark::Int(*v)),
            SqlValue::DateTime(v) => Some(Watermark::DateTime(*v)),
            SqlValue::Timestamptz(v) => Some(Watermark::DateTime(v.naive_utc())),
            SqlValue::Date(v) => v.and_hms_opt(0, 0, 0).map(Watermark::DateTime),
            _ => None,
        }
    }

    /// Return the later of the two watermarks, preferring `self` on a
    /// cross-variant mismatch.
    pub fn later(self, other: Watermark) -> Watermark {
        if other.is_after(&self) {
            other
        } else {
            self
        }
    }
}

/// A primary-key value used for the deterministic tie-break ordering of rows
/// sharing a watermark value at a chunk boundary.
///
/// Ordering across variants follows variant order; it is only meaningful
/// within a single table, where the key column type is uniform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyValue {
    /// Integer primary key (covers smallint, int, bigint).
    Int(i64),

    /// UUID primary key.
    Uuid(Uuid),

    /// String primary key.
    Text(String),
}

impl KeyValue {
    /// Extract a key from a row value.
    pub fn from_value(value: &SqlValue) -> Option<KeyValue> {
        match value {
            SqlValue::I16(v) => Some(KeyValue::Int(*v as i64)),
            SqlValue::I32(v) => Some(KeyValue::Int(*v as i64)),
            SqlValue::I64(v) => Some(KeyValue::Int(*v)),
            SqlValue::Uuid(v) => Some(KeyValue::Uuid(*v)),
            SqlValue::Text(v) => Some(KeyValue::Text(v.clone())),
            _ => None,
        }
    }

    /// Render as a SQL literal for keyset boundary clauses.
    ///
    /// Single quotes are doubled; key values come from the trusted replica
    /// store, and the literal is only used in boundary comparisons.
    pub fn to_sql_literal(&self) -> String {
        match self {
            KeyValue::Int(v) => v.to_string(),
            KeyValue::Uuid(v) => format!("'{}'", v),
            KeyValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }
}

impl Watermark {
    /// Render as a SQL literal for watermark filter clauses.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Watermark::Int(v) => v.to_string(),
            Watermark::DateTime(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.6f")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_watermark_strictly_after() {
        assert!(Watermark::Int(5).is_after(&Watermark::Int(4)));
        assert!(!Watermark::Int(5).is_after(&Watermark::Int(5)));
        assert!(!Watermark::Int(4).is_after(&Watermark::Int(5)));

        let a = Watermark::DateTime(ts("2026-01-02 00:00:00"));
        let b = Watermark::DateTime(ts("2026-01-01 00:00:00"));
        assert!(a.is_after(&b));
        assert!(!b.is_after(&a));
        assert!(!a.clone().is_after(&a));
    }

    #[test]
    fn test_watermark_cross_variant_not_after() {
        let int = Watermark::Int(100);
        let dt = Watermark::DateTime(ts("2026-01-01 00:00:00"));
        assert!(!int.is_after(&dt));
        assert!(!dt.is_after(&int));
    }

    #[test]
    fn test_watermark_from_value() {
        assert_eq!(
            Watermark::from_value(&SqlValue::I32(7)),
            Some(Watermark::Int(7))
        );
        assert_eq!(Watermark::from_value(&SqlValue::Null), None);
        assert_eq!(Watermark::from_value(&SqlValue::Text("x".into())), None);

        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            Watermark::from_value(&SqlValue::Date(d)),
            Some(Watermark::DateTime(d.and_hms_opt(0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_watermark_later() {
        assert_eq!(
            Watermark::Int(3).later(Watermark::Int(9)),
            Watermark::Int(9)
        );
        assert_eq!(
            Watermark::Int(9).later(Watermark::Int(3)),
            Watermark::Int(9)
        );
    }

    #[test]
    fn test_key_value_ordering_and_literals() {
        assert!(KeyValue::Int(2) > KeyValue::Int(1));
        assert!(KeyValue::Text("b".into()) > KeyValue::Text("a".into()));
        assert_eq!(KeyValue::Int(42).to_sql_literal(), "42");
        assert_eq!(
            KeyValue::Text("O'Brien".into()).to_sql_literal(),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_watermark_serde_round_trip() {
        let wm = Watermark::DateTime(ts("2026-08-01 12:30:00"));
        let json = serde_json::to_string(&wm).unwrap();
        let back: Watermark = serde_json::from_str(&json).unwrap();
        assert_eq!(wm, back);

        let wm = Watermark::Int(1090);
        let json = serde_json::to_string(&wm).unwrap();
        assert_eq!(json, r#"{"int":1090}"#);
    }
}
