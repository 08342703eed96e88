use super::NoteStore;
use crate::models::Entry;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    postgres::{PgPool, PgPoolOptions, PgRow},
    query,
    types::Json,
    Row,
};

/// Durable store: a single `kv` table with a jsonb value column.
#[derive(Clone, Debug)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(db_url: &str, max_connections: u32) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await?;

        Ok(PgStore { db })
    }

    /// Create the `kv` table if this is a fresh database.
    pub async fn migrate(&self) -> Result<()> {
        query(
            "create table if not exists kv (
                key text primary key,
                value jsonb not null
            )",
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

fn entry_from_row(row: PgRow) -> Result<Entry> {
    let key: String = row.try_get("key")?;
    let Json(value): Json<Value> = row.try_get("value")?;

    Ok(Entry { key, value })
}

#[async_trait]
impl NoteStore for PgStore {
    async fn get_with_prefix(&self, prefix: &str) -> Result<Vec<Entry>> {
        // `like` would treat `_` and `%` in the prefix as wildcards
        let rows = query(
            "select key, value from kv
            where left(key, char_length($1::text)) = $1::text
            order by key",
        )
        .bind(prefix)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = query("select value from kv where key = $1")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        Ok(match row {
            Some(row) => {
                let Json(value): Json<Value> = row.try_get("value")?;
                Some(value)
            }
            None => None,
        })
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        query(
            "insert into kv (key, value) values ($1, $2)
            on conflict (key) do update set value = excluded.value",
        )
        .bind(key)
        .bind(Json(value))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let res = query("delete from kv where key = $1")
            .bind(key)
            .execute(&self.db)
            .await?;

        Ok(res.rows_affected() > 0)
    }
}
