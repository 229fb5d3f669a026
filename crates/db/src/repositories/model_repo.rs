//! Repository for the `models` registry collection.
//!
//! Models are stored as JSONB documents; `id` and `name` are promoted to
//! columns for indexed lookup. Serialization failures surface as
//! `sqlx::Error::Decode` so callers handle one error type.

use basin_core::model::Model;
use sqlx::PgPool;

/// Provides document access to registered models.
pub struct ModelRepo;

impl ModelRepo {
    /// Fetch a model document by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Model>, sqlx::Error> {
        let doc: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT doc FROM models WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        doc.map(|d| serde_json::from_value(d).map_err(decode_error))
            .transpose()
    }

    /// Insert or replace a model document.
    pub async fn upsert(pool: &PgPool, model: &Model) -> Result<(), sqlx::Error> {
        let doc = serde_json::to_value(model).map_err(decode_error)?;
        sqlx::query(
            "INSERT INTO models (id, name, doc) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE \
             SET name = EXCLUDED.name, doc = EXCLUDED.doc, updated_at = NOW()",
        )
        .bind(&model.id)
        .bind(&model.name)
        .bind(doc)
        .execute(pool)
        .await?;
        Ok(())
    }
}

fn decode_error(e: serde_json::Error) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}
