use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tether_core::{Binding, BindingReader, BindingStore, ShortId, StorageError, StorageResult};
use tracing::trace;

const SELECT_BINDING: &str = r#"
    SELECT id, url, bound_at, expire_at, max_access, counter, expired_url, exhausted_url
    FROM bindings
    WHERE id = ?
    LIMIT 1
"#;

/// MySQL implementation of the store traits.
///
/// Timestamps are stored as microseconds since the Unix epoch. Deletes are
/// hard deletes, so a deleted id can be bound again with a fresh counter.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `bindings` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        sqlx::query(include_str!("../ddl/mysql/bindings.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn parse_timestamp(column: &str, micros: i64) -> StorageResult<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{micros}': {e}"))
    })
}

fn decode_binding(row: &MySqlRow) -> StorageResult<Binding> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let bound_at: i64 = row.try_get("bound_at").map_err(map_sqlx_error)?;
    let expire_at: Option<i64> = row.try_get("expire_at").map_err(map_sqlx_error)?;

    Ok(Binding {
        id: ShortId::new_unchecked(id),
        url: row.try_get("url").map_err(map_sqlx_error)?,
        bound_at: parse_timestamp("bound_at", bound_at)?,
        expire_at: expire_at
            .map(|micros| parse_timestamp("expire_at", micros))
            .transpose()?,
        max_access: row.try_get("max_access").map_err(map_sqlx_error)?,
        counter: row.try_get("counter").map_err(map_sqlx_error)?,
        expired_url: row.try_get("expired_url").map_err(map_sqlx_error)?,
        exhausted_url: row.try_get("exhausted_url").map_err(map_sqlx_error)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl BindingReader for MySqlStore {
    async fn get(&self, id: &ShortId) -> StorageResult<Binding> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query("UPDATE bindings SET counter = counter + 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Err(StorageError::NotFound(id.to_string()));
        }

        let row = sqlx::query(SELECT_BINDING)
            .bind(id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let binding = decode_binding(&row)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        trace!(id = %id, counter = binding.counter, "counted read");
        Ok(binding)
    }

    async fn peek(&self, id: &ShortId) -> StorageResult<Binding> {
        let row = sqlx::query(SELECT_BINDING)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => decode_binding(&row),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl BindingStore for MySqlStore {
    async fn insert(&self, binding: Binding) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO bindings
                (id, url, bound_at, expire_at, max_access, counter, expired_url, exhausted_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(binding.id.as_str())
        .bind(binding.url.as_str())
        .bind(binding.bound_at.as_microsecond())
        .bind(binding.expire_at.map(|ts| ts.as_microsecond()))
        .bind(binding.max_access)
        .bind(binding.counter)
        .bind(binding.expired_url.as_deref())
        .bind(binding.exhausted_url.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::DuplicateId(binding.id.into_inner()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn upsert(&self, binding: Binding) -> StorageResult<()> {
        // `bound_at` and `counter` are left alone on the update path.
        sqlx::query(
            r#"
            INSERT INTO bindings
                (id, url, bound_at, expire_at, max_access, counter, expired_url, exhausted_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?) AS incoming
            ON DUPLICATE KEY UPDATE
                url = incoming.url,
                expire_at = incoming.expire_at,
                max_access = incoming.max_access,
                expired_url = incoming.expired_url,
                exhausted_url = incoming.exhausted_url
            "#,
        )
        .bind(binding.id.as_str())
        .bind(binding.url.as_str())
        .bind(binding.bound_at.as_microsecond())
        .bind(binding.expire_at.map(|ts| ts.as_microsecond()))
        .bind(binding.max_access)
        .bind(binding.counter)
        .bind(binding.expired_url.as_deref())
        .bind(binding.exhausted_url.as_deref())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, id: &ShortId) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM bindings WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
