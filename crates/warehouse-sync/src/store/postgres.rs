//! Postgres implementations of the store traits.
//!
//! [`PostgresSource`] reads the intermediate replication store;
//! [`PostgresWarehouse`] writes the warehouse raw namespace. Both share one
//! pooling and TLS setup via [`connect_pool`]. Row data binds as statement
//! parameters; only ordering boundaries (watermark and key literals, which
//! come from the trusted replica store) are formatted into SQL text.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use rustls::ClientConfig;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Config as PgConfig;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::core::schema::{Column, TargetSchema};
use crate::core::value::{Row, SqlValue};
use crate::error::{Result, SyncError};

use super::{ChunkBound, ChunkRequest, ReplicaSource, Warehouse};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Postgres caps bind parameters at 65535 per statement; stay under it.
const MAX_BIND_PARAMS: usize = 60_000;

/// Column introspection against the replica store.
///
/// The numeric columns of `information_schema.columns` are typed
/// `cardinal_number`, a domain over int4 that does not decode as i32
/// without an explicit cast.
const REPLICA_COLUMNS_SQL: &str = "SELECT column_name, udt_name, \
     COALESCE(character_maximum_length, -1)::int4, \
     COALESCE(numeric_precision, 0)::int4, \
     COALESCE(numeric_scale, 0)::int4, \
     is_nullable = 'YES', \
     ordinal_position::int4 \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

/// Build a connection pool for one Postgres endpoint.
pub(crate) async fn connect_pool(config: &StoreConfig, context: &str) -> Result<Pool> {
    let mut pg_config = PgConfig::new();
    pg_config.host(&config.host);
    pg_config.port(config.port);
    pg_config.dbname(&config.database);
    pg_config.user(&config.user);
    pg_config.password(&config.password);

    pg_config.keepalives(true);
    pg_config.keepalives_idle(Duration::from_secs(30));
    pg_config.connect_timeout(POOL_CONNECTION_TIMEOUT);

    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };

    let ssl_mode = config.ssl_mode.to_lowercase();
    let pool = match ssl_mode.as_str() {
        "disable" => {
            warn!("Postgres TLS is disabled. Credentials will be transmitted in plaintext.");
            let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
            Pool::builder(mgr)
                .max_size(config.max_connections)
                .build()
                .map_err(|e| SyncError::pool(e, context))?
        }
        _ => {
            let tls_config = build_tls_config(&ssl_mode)?;
            let tls_connector = MakeRustlsConnect::new(tls_config);
            let mgr = Manager::from_config(pg_config, tls_connector, mgr_config);
            Pool::builder(mgr)
                .max_size(config.max_connections)
                .build()
                .map_err(|e| SyncError::pool(e, context))?
        }
    };

    // Test connection
    let client = pool.get().await.map_err(|e| SyncError::pool(e, context))?;
    client.simple_query("SELECT 1").await?;

    info!(
        "Connected to Postgres: {}:{}/{}",
        config.host, config.port, config.database
    );

    Ok(pool)
}

/// Build TLS configuration for the requested ssl_mode.
fn build_tls_config(ssl_mode: &str) -> Result<ClientConfig> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = match ssl_mode {
        "require" => {
            warn!("ssl_mode=require: TLS enabled but server certificate is not verified.");
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth()
        }
        "verify-ca" | "verify-full" => {
            info!("ssl_mode={}: certificate verification enabled", ssl_mode);
            ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth()
        }
        other => {
            return Err(SyncError::Config(format!(
                "Invalid ssl_mode '{}'. Valid options: disable, require, verify-ca, verify-full",
                other
            )));
        }
    };

    Ok(config)
}

/// Quote a Postgres identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Qualify a table name with schema.
fn qualify(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Build the SELECT for one ordered chunk read.
fn chunk_query(schema: &str, req: &ChunkRequest<'_>) -> String {
    let col_list = req
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let key = quote_ident(req.key_column);

    let mut sql = format!(
        "SELECT {} FROM {}",
        col_list,
        qualify(schema, req.table)
    );

    match &req.bound {
        Some(ChunkBound::AfterWatermark(wm)) => {
            if let Some(wm_col) = req.watermark_column {
                sql.push_str(&format!(
                    " WHERE {} > {}",
                    quote_ident(wm_col),
                    wm.to_sql_literal()
                ));
            }
        }
        Some(ChunkBound::AfterPair(wm, k)) => {
            if let Some(wm_col) = req.watermark_column {
                // Row-value comparison: strictly after (wm, key), so rows
                // sharing the boundary watermark are neither lost nor repeated.
                sql.push_str(&format!(
                    " WHERE ({}, {}) > ({}, {})",
                    quote_ident(wm_col),
                    key,
                    wm.to_sql_literal(),
                    k.to_sql_literal()
                ));
            }
        }
        Some(ChunkBound::AfterKey(k)) => {
            sql.push_str(&format!(" WHERE {} > {}", key, k.to_sql_literal()));
        }
        None => {}
    }

    match req.watermark_column {
        Some(wm_col) => sql.push_str(&format!(" ORDER BY {}, {}", quote_ident(wm_col), key)),
        None => sql.push_str(&format!(" ORDER BY {}", key)),
    }

    if let Some(limit) = req.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    sql
}

/// Build a multi-row parameterized INSERT.
fn insert_sql(target: &str, columns: &[String], nrows: usize) -> String {
    let col_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let ncols = columns.len();

    let mut sql = format!("INSERT INTO {} ({}) VALUES ", target, col_list);
    for r in 0..nrows {
        if r > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for c in 0..ncols {
            if c > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&format!("${}", r * ncols + c + 1));
        }
        sql.push(')');
    }
    sql
}

/// The ON CONFLICT clause for an upsert keyed by `primary_key`.
fn conflict_clause(columns: &[String], primary_key: &[String]) -> String {
    let pk_list = primary_key
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let update_cols: Vec<String> = columns
        .iter()
        .filter(|c| !primary_key.contains(c))
        .map(|c| format!("{} = EXCLUDED.{}", quote_ident(c), quote_ident(c)))
        .collect();

    if update_cols.is_empty() {
        format!(" ON CONFLICT ({}) DO NOTHING", pk_list)
    } else {
        format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            pk_list,
            update_cols.join(", ")
        )
    }
}

/// Decode one column of a result row into an owned [`SqlValue`].
fn decode_value(row: &tokio_postgres::Row, idx: usize) -> Result<SqlValue> {
    let ty = row.columns()[idx].type_();

    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?
            .map_or(SqlValue::Null, SqlValue::I16)
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?
            .map_or(SqlValue::Null, SqlValue::I32)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?
            .map_or(SqlValue::Null, SqlValue::I64)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?
            .map_or(SqlValue::Null, SqlValue::F32)
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?
            .map_or(SqlValue::Null, SqlValue::F64)
    } else if *ty == Type::NUMERIC {
        row.try_get::<_, Option<rust_decimal::Decimal>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Decimal)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        row.try_get::<_, Option<String>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Text)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        // JSON columns land in the warehouse as text.
        row.try_get::<_, Option<serde_json::Value>>(idx)?
            .map_or(SqlValue::Null, |v| SqlValue::Text(v.to_string()))
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Bytes)
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<uuid::Uuid>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Uuid)
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map_or(SqlValue::Null, SqlValue::DateTime)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Timestamptz)
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<chrono::NaiveDate>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Date)
    } else if *ty == Type::TIME {
        row.try_get::<_, Option<chrono::NaiveTime>>(idx)?
            .map_or(SqlValue::Null, SqlValue::Time)
    } else {
        return Err(SyncError::store(
            format!("cannot decode column type '{}'", ty),
            "reading replica rows",
        ));
    };

    Ok(value)
}

/// Decode a full result row.
fn decode_row(row: &tokio_postgres::Row) -> Result<Row> {
    (0..row.len()).map(|i| decode_value(row, i)).collect()
}

/// The expected udt name for a mapped warehouse type string.
///
/// Used when comparing an existing table's shape against the mapped schema,
/// so a retyped column forces a rebuild just like a renamed one.
fn udt_of(target_type: &str) -> &str {
    let base = target_type
        .split('(')
        .next()
        .unwrap_or(target_type)
        .trim();
    match base {
        "boolean" => "bool",
        "smallint" => "int2",
        "integer" => "int4",
        "bigint" => "int8",
        "real" => "float4",
        "double precision" => "float8",
        "numeric" => "numeric",
        "char" => "bpchar",
        "varchar" => "varchar",
        "text" => "text",
        "bytea" => "bytea",
        "timestamp" => "timestamp",
        "timestamptz" => "timestamptz",
        "date" => "date",
        "time" => "time",
        "uuid" => "uuid",
        other => other,
    }
}

/// Read side against the intermediate replication store.
pub struct PostgresSource {
    pool: Pool,
    schema: String,
}

impl PostgresSource {
    /// Connect to the replica store described by `config`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = connect_pool(config, "creating replica source pool").await?;
        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }
}

#[async_trait]
impl ReplicaSource for PostgresSource {
    async fn fetch_columns(&self, table: &str) -> Result<Vec<Column>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(REPLICA_COLUMNS_SQL, &[&self.schema, &table])
            .await?;

        if rows.is_empty() {
            return Err(SyncError::store(
                format!("table '{}' not found in schema '{}'", table, self.schema),
                "introspecting replica store",
            ));
        }

        let columns = rows
            .iter()
            .map(|r| Column {
                name: r.get(0),
                data_type: r.get(1),
                max_length: r.get(2),
                precision: r.get(3),
                scale: r.get(4),
                is_nullable: r.get(5),
                ordinal_pos: r.get(6),
            })
            .collect();

        Ok(columns)
    }

    async fn count_rows(&self, table: &str) -> Result<i64> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", qualify(&self.schema, table));
        let row = client.query_one(&sql, &[]).await?;
        Ok(row.get(0))
    }

    async fn sample_int_values(
        &self,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<i64>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} IS NOT NULL LIMIT {}",
            quote_ident(column),
            qualify(&self.schema, table),
            quote_ident(column),
            limit
        );
        let rows = client.query(&sql, &[]).await?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(v) = decode_value(row, 0)?.as_i64() {
                values.push(v);
            }
        }
        Ok(values)
    }

    async fn read_chunk(&self, req: &ChunkRequest<'_>) -> Result<Vec<Row>> {
        let client = self.pool.get().await?;
        let sql = chunk_query(&self.schema, req);
        debug!(table = req.table, "reading chunk: {}", sql);

        let rows = client.query(&sql, &[]).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Write side against the warehouse raw namespace.
pub struct PostgresWarehouse {
    pool: Pool,
    schema: String,
}

impl PostgresWarehouse {
    /// Connect to the warehouse described by `config`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = connect_pool(config, "creating warehouse pool").await?;
        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    /// The pool backing this warehouse, for the warehouse-resident tracker.
    pub fn tracker_pool(&self) -> Pool {
        self.pool.clone()
    }

    /// Existing (name, udt) pairs for a table, in ordinal order.
    async fn existing_shape(&self, table: &str) -> Result<Vec<(String, String)>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT column_name, udt_name \
                 FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 \
                 ORDER BY ordinal_position",
                &[&self.schema, &table],
            )
            .await?;
        Ok(rows.iter().map(|r| (r.get(0), r.get(1))).collect())
    }

    async fn create_table(
        &self,
        table: &str,
        schema: &TargetSchema,
        primary_key: &[String],
    ) -> Result<()> {
        let client = self.pool.get().await?;

        let mut defs: Vec<String> = schema
            .columns
            .iter()
            .map(|c| {
                let nullable = if c.is_nullable && !primary_key.contains(&c.name) {
                    ""
                } else {
                    " NOT NULL"
                };
                format!("{} {}{}", quote_ident(&c.name), c.target_type, nullable)
            })
            .collect();

        if !primary_key.is_empty() {
            let pk_list = primary_key
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ");
            defs.push(format!("PRIMARY KEY ({})", pk_list));
        }

        let sql = format!(
            "CREATE TABLE {} ({})",
            qualify(&self.schema, table),
            defs.join(", ")
        );
        client.execute(&sql, &[]).await?;
        info!(table, "created warehouse table");
        Ok(())
    }

    /// Write one chunk inside a single transaction.
    async fn write_chunk(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Row],
        suffix: &str,
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let ncols = columns.len();
        for row in rows {
            if row.len() != ncols {
                return Err(SyncError::store(
                    format!(
                        "row width {} does not match {} target columns for '{}'",
                        row.len(),
                        ncols,
                        table
                    ),
                    "writing warehouse chunk",
                ));
            }
        }

        let target = qualify(&self.schema, table);
        let rows_per_stmt = (MAX_BIND_PARAMS / ncols.max(1)).max(1);

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let mut written = 0u64;
        for batch in rows.chunks(rows_per_stmt) {
            let sql = format!("{}{}", insert_sql(&target, columns, batch.len()), suffix);
            let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(batch.len() * ncols);
            for row in batch {
                for value in row {
                    params.push(value);
                }
            }
            written += tx.execute(&sql, &params).await?;
        }

        tx.commit().await?;
        Ok(written)
    }
}

#[async_trait]
impl Warehouse for PostgresWarehouse {
    async fn ensure_table(
        &self,
        table: &str,
        schema: &TargetSchema,
        primary_key: &[String],
    ) -> Result<()> {
        let existing = self.existing_shape(table).await?;
        if existing.is_empty() {
            return self.create_table(table, schema, primary_key).await;
        }

        let wanted: Vec<(String, String)> = schema
            .columns
            .iter()
            .map(|c| (c.name.clone(), udt_of(&c.target_type).to_string()))
            .collect();

        if existing == wanted {
            return Ok(());
        }

        warn!(table, "warehouse table shape differs, rebuilding");
        let client = self.pool.get().await?;
        let sql = format!("DROP TABLE {}", qualify(&self.schema, table));
        client.execute(&sql, &[]).await?;
        self.create_table(table, schema, primary_key).await
    }

    async fn clear_table(&self, table: &str) -> Result<()> {
        let client = self.pool.get().await?;
        let sql = format!("TRUNCATE TABLE {}", qualify(&self.schema, table));
        client.execute(&sql, &[]).await?;
        Ok(())
    }

    async fn append_chunk(&self, table: &str, columns: &[String], rows: Vec<Row>) -> Result<u64> {
        self.write_chunk(table, columns, &rows, "").await
    }

    async fn upsert_chunk(
        &self,
        table: &str,
        columns: &[String],
        primary_key: &[String],
        rows: Vec<Row>,
    ) -> Result<u64> {
        let suffix = conflict_clause(columns, primary_key);
        self.write_chunk(table, columns, &rows, &suffix).await
    }

    async fn count_rows(&self, table: &str) -> Result<i64> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", qualify(&self.schema, table));
        let row = client.query_one(&sql, &[]).await?;
        Ok(row.get(0))
    }
}

#[derive(Debug)]
struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{KeyValue, Watermark};

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replica_columns_sql_casts_cardinal_numbers() {
        // Without the casts these arrive as the cardinal_number domain,
        // which i32 refuses to decode.
        assert!(REPLICA_COLUMNS_SQL.contains("ordinal_position::int4"));
        for cast in [
            "COALESCE(character_maximum_length, -1)::int4",
            "COALESCE(numeric_precision, 0)::int4",
            "COALESCE(numeric_scale, 0)::int4",
        ] {
            assert!(REPLICA_COLUMNS_SQL.contains(cast), "missing cast: {cast}");
        }
    }

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("person"), "\"person\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_chunk_query_initial_read() {
        let columns = cols(&["medication_id", "name", "date_changed"]);
        let req = ChunkRequest {
            table: "medication",
            columns: &columns,
            watermark_column: Some("date_changed"),
            key_column: "medication_id",
            bound: None,
            limit: Some(500),
        };
        let sql = chunk_query("seed", &req);
        assert_eq!(
            sql,
            "SELECT \"medication_id\", \"name\", \"date_changed\" FROM \"seed\".\"medication\" \
             ORDER BY \"date_changed\", \"medication_id\" LIMIT 500"
        );
    }

    #[test]
    fn test_chunk_query_watermark_bound_is_strict() {
        let columns = cols(&["id", "updated"]);
        let req = ChunkRequest {
            table: "obs",
            columns: &columns,
            watermark_column: Some("updated"),
            key_column: "id",
            bound: Some(ChunkBound::AfterWatermark(Watermark::Int(1090))),
            limit: None,
        };
        let sql = chunk_query("seed", &req);
        assert!(sql.contains("WHERE \"updated\" > 1090"));
        assert!(sql.ends_with("ORDER BY \"updated\", \"id\""));
    }

    #[test]
    fn test_chunk_query_pair_bound_uses_row_comparison() {
        let columns = cols(&["id", "updated"]);
        let req = ChunkRequest {
            table: "obs",
            columns: &columns,
            watermark_column: Some("updated"),
            key_column: "id",
            bound: Some(ChunkBound::AfterPair(Watermark::Int(7), KeyValue::Int(42))),
            limit: Some(100),
        };
        let sql = chunk_query("seed", &req);
        assert!(sql.contains("WHERE (\"updated\", \"id\") > (7, 42)"));
    }

    #[test]
    fn test_chunk_query_key_bound_without_watermark() {
        let columns = cols(&["id", "name"]);
        let req = ChunkRequest {
            table: "person",
            columns: &columns,
            watermark_column: None,
            key_column: "id",
            bound: Some(ChunkBound::AfterKey(KeyValue::Text("O'Brien".into()))),
            limit: Some(100),
        };
        let sql = chunk_query("seed", &req);
        assert!(sql.contains("WHERE \"id\" > 'O''Brien'"));
        assert!(sql.contains("ORDER BY \"id\" LIMIT 100"));
    }

    #[test]
    fn test_insert_sql_numbers_params_row_major() {
        let sql = insert_sql("\"raw\".\"t\"", &cols(&["a", "b"]), 2);
        assert_eq!(
            sql,
            "INSERT INTO \"raw\".\"t\" (\"a\", \"b\") VALUES ($1, $2), ($3, $4)"
        );
    }

    #[test]
    fn test_conflict_clause_updates_non_key_columns() {
        let clause = conflict_clause(&cols(&["id", "name", "dose"]), &cols(&["id"]));
        assert_eq!(
            clause,
            " ON CONFLICT (\"id\") DO UPDATE SET \"name\" = EXCLUDED.\"name\", \
             \"dose\" = EXCLUDED.\"dose\""
        );
    }

    #[test]
    fn test_conflict_clause_key_only_table() {
        let clause = conflict_clause(&cols(&["a", "b"]), &cols(&["a", "b"]));
        assert_eq!(clause, " ON CONFLICT (\"a\", \"b\") DO NOTHING");
    }

    #[test]
    fn test_udt_of_strips_modifiers() {
        assert_eq!(udt_of("varchar(255)"), "varchar");
        assert_eq!(udt_of("numeric(10,2)"), "numeric");
        assert_eq!(udt_of("double precision"), "float8");
        assert_eq!(udt_of("boolean"), "bool");
    }
}
