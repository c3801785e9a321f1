//! Type & schema mapping between the replica store and the warehouse.
//!
//! Two jobs live here: computing the stable shape fingerprint used for drift
//! detection, and translating source column types to warehouse types. The
//! fingerprint is order-sensitive and recomputed every run; it is never cached
//! across runs, so a drifted table is caught without scanning its data.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::schema::{Column, TargetColumn, TargetSchema};
use crate::error::{Result, SyncError};
use crate::store::ReplicaSource;

/// Stable hash of a table's column name/type/order shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFingerprint(String);

impl SchemaFingerprint {
    /// The hex digest string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SchemaFingerprint {
    fn from(s: String) -> Self {
        SchemaFingerprint(s)
    }
}

/// Compute the shape fingerprint for a column set.
///
/// Identical shape produces an identical fingerprint; any column add, remove,
/// reorder, or retype produces a different one.
pub fn compute_fingerprint(columns: &[Column]) -> SchemaFingerprint {
    let mut hasher = Sha256::new();
    for col in columns {
        hasher.update(col.name.as_bytes());
        hasher.update([0x1f]);
        hasher.update(col.data_type.to_lowercase().as_bytes());
        hasher.update([0x1f]);
        hasher.update(format!("{}:{}:{}", col.max_length, col.precision, col.scale).as_bytes());
        hasher.update([0x1e]);
    }
    SchemaFingerprint(hex::encode(hasher.finalize()))
}

/// How a single column type maps, before sampling is applied.
#[derive(Debug, Clone, PartialEq)]
enum MappedType {
    /// Direct translation to a warehouse type string.
    Direct(String),

    /// Fixed-width integer that may be a flag column; decided by sampling.
    /// Carries the numeric fallback used when the sample is ambiguous.
    MaybeBoolean(String),
}

/// Maps source column definitions to a warehouse-compatible schema.
pub struct SchemaMapper {
    sample_limit: usize,
}

impl SchemaMapper {
    /// Create a mapper. `sample_limit` bounds the per-column value sample
    /// used by the boolean heuristic.
    pub fn new(sample_limit: usize) -> Self {
        Self { sample_limit }
    }

    /// Map a table's columns to its warehouse schema.
    ///
    /// `tinyint` columns are sampled through `source`: if every sampled value
    /// is 0 or 1 the column maps to `boolean`; an empty or mixed sample maps
    /// to the narrowest safe numeric type instead. Misclassifying a numeric
    /// column as boolean corrupts downstream models, so ambiguity never
    /// resolves to boolean.
    pub async fn map_schema(
        &self,
        table: &str,
        columns: &[Column],
        source: &dyn ReplicaSource,
    ) -> Result<TargetSchema> {
        let mut mapped = Vec::with_capacity(columns.len());

        for col in columns {
            let target_type = match map_type(table, col)? {
                MappedType::Direct(t) => t,
                MappedType::MaybeBoolean(fallback) => {
                    let samples = source
                        .sample_int_values(table, &col.name, self.sample_limit)
                        .await?;
                    if !samples.is_empty() && samples.iter().all(|v| *v == 0 || *v == 1) {
                        "boolean".to_string()
                    } else {
                        fallback
                    }
                }
            };

            mapped.push(TargetColumn {
                name: col.name.clone(),
                target_type,
                is_nullable: col.is_nullable,
            });
        }

        Ok(TargetSchema { columns: mapped })
    }
}

/// Translate one source column type.
///
/// Unsupported types are a fatal per-table configuration error, reported and
/// never retried; sibling tables are unaffected.
fn map_type(table: &str, col: &Column) -> Result<MappedType> {
    let raw = col.data_type.to_lowercase();
    // MySQL-style unsigned modifiers widen one step to stay lossless.
    let (base, unsigned) = match raw.strip_suffix(" unsigned") {
        Some(b) => (b.trim(), true),
        None => (raw.as_str(), false),
    };

    let direct = |t: &str| Ok(MappedType::Direct(t.to_string()));

    match base {
        "tinyint" if !unsigned => Ok(MappedType::MaybeBoolean("smallint".to_string())),
        "tinyint" => direct("smallint"),
        "bit" | "boolean" | "bool" => direct("boolean"),

        "smallint" | "int2" => direct(if unsigned { "integer" } else { "smallint" }),
        "mediumint" | "int" | "integer" | "int4" => {
            direct(if unsigned { "bigint" } else { "integer" })
        }
        "bigint" | "int8" => {
            // Unsigned bigint has no wider integer; numeric is the safe home.
            direct(if unsigned { "numeric(20,0)" } else { "bigint" })
        }
        "year" => direct("smallint"),

        "decimal" | "numeric" => {
            if col.precision > 0 {
                direct(&format!("numeric({},{})", col.precision, col.scale))
            } else {
                direct("numeric")
            }
        }
        "float" | "real" | "float4" => direct("real"),
        "double" | "double precision" | "float8" => direct("double precision"),

        "char" | "bpchar" => {
            if col.max_length > 0 && col.max_length <= 10_485_760 {
                direct(&format!("char({})", col.max_length))
            } else {
                direct("text")
            }
        }
        "varchar" => {
            if col.max_length > 0 && col.max_length <= 10_485_760 {
                direct(&format!("varchar({})", col.max_length))
            } else {
                direct("text")
            }
        }
        "text" | "tinytext" | "mediumtext" | "longtext" | "enum" | "set" | "json" | "jsonb" => {
            direct("text")
        }

        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea" => {
            direct("bytea")
        }

        "date" => direct("date"),
        "time" => direct("time"),
        "datetime" | "timestamp" => direct("timestamp"),
        "timestamptz" => direct("timestamptz"),

        "uuid" | "uniqueidentifier" => direct("uuid"),

        _ => Err(SyncError::UnsupportedType {
            table: table.to_string(),
            column: col.name.clone(),
            data_type: col.data_type.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, data_type: &str) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            max_length: 0,
            precision: 0,
            scale: 0,
            is_nullable: true,
            ordinal_pos: 1,
        }
    }

    #[test]
    fn test_fingerprint_stable_for_identical_shape() {
        let cols = vec![col("id", "int"), col("name", "varchar")];
        assert_eq!(compute_fingerprint(&cols), compute_fingerprint(&cols));
    }

    #[test]
    fn test_fingerprint_order_sensitive() {
        let a = vec![col("id", "int"), col("name", "varchar")];
        let b = vec![col("name", "varchar"), col("id", "int")];
        assert_ne!(compute_fingerprint(&a), compute_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_changes_on_retype() {
        let a = vec![col("id", "int")];
        let b = vec![col("id", "bigint")];
        assert_ne!(compute_fingerprint(&a), compute_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_changes_on_add_remove() {
        let a = vec![col("id", "int")];
        let b = vec![col("id", "int"), col("voided", "tinyint")];
        assert_ne!(compute_fingerprint(&a), compute_fingerprint(&b));
        assert_ne!(compute_fingerprint(&b), compute_fingerprint(&[]));
    }

    #[test]
    fn test_fingerprint_length_sensitive() {
        let mut a = col("name", "varchar");
        a.max_length = 50;
        let mut b = col("name", "varchar");
        b.max_length = 255;
        assert_ne!(compute_fingerprint(&[a]), compute_fingerprint(&[b]));
    }

    #[test]
    fn test_map_integer_types() {
        assert_eq!(
            map_type("t", &col("a", "int")).unwrap(),
            MappedType::Direct("integer".into())
        );
        assert_eq!(
            map_type("t", &col("a", "bigint")).unwrap(),
            MappedType::Direct("bigint".into())
        );
        assert_eq!(
            map_type("t", &col("a", "int unsigned")).unwrap(),
            MappedType::Direct("bigint".into())
        );
        assert_eq!(
            map_type("t", &col("a", "bigint unsigned")).unwrap(),
            MappedType::Direct("numeric(20,0)".into())
        );
    }

    #[test]
    fn test_tinyint_defers_to_sampling() {
        assert_eq!(
            map_type("t", &col("voided", "tinyint")).unwrap(),
            MappedType::MaybeBoolean("smallint".into())
        );
        // Unsigned tinyint is never a flag column in the source schema.
        assert_eq!(
            map_type("t", &col("age", "tinyint unsigned")).unwrap(),
            MappedType::Direct("smallint".into())
        );
    }

    #[test]
    fn test_map_string_types() {
        let mut c = col("name", "varchar");
        c.max_length = 255;
        assert_eq!(
            map_type("t", &c).unwrap(),
            MappedType::Direct("varchar(255)".into())
        );

        let mut unbounded = col("notes", "varchar");
        unbounded.max_length = -1;
        assert_eq!(
            map_type("t", &unbounded).unwrap(),
            MappedType::Direct("text".into())
        );

        assert_eq!(
            map_type("t", &col("kind", "enum")).unwrap(),
            MappedType::Direct("text".into())
        );
    }

    #[test]
    fn test_map_decimal_with_precision() {
        let mut c = col("dose", "decimal");
        c.precision = 10;
        c.scale = 2;
        assert_eq!(
            map_type("t", &c).unwrap(),
            MappedType::Direct("numeric(10,2)".into())
        );
    }

    #[test]
    fn test_map_temporal_types() {
        assert_eq!(
            map_type("t", &col("d", "datetime")).unwrap(),
            MappedType::Direct("timestamp".into())
        );
        assert_eq!(
            map_type("t", &col("d", "date")).unwrap(),
            MappedType::Direct("date".into())
        );
    }

    #[test]
    fn test_unsupported_type_is_fatal() {
        let err = map_type("person", &col("shape", "geometry")).unwrap_err();
        match err {
            SyncError::UnsupportedType {
                table,
                column,
                data_type,
            } => {
                assert_eq!(table, "person");
                assert_eq!(column, "shape");
                assert_eq!(data_type, "geometry");
            }
            other => panic!("expected UnsupportedType, got {other}"),
        }
    }
}
