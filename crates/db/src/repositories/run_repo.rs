//! Repository for the `runs` registry collection.
//!
//! Runs are JSONB documents with `model_id`, `model_name`, and `status`
//! promoted to columns for search. The document is the source of truth;
//! the promoted columns are rewritten on every update.

use basin_core::run::ModelRun;
use sqlx::PgPool;

/// Maximum page size for run search.
const MAX_LIMIT: i64 = 100;

/// Default page size for run search.
const DEFAULT_LIMIT: i64 = 50;

/// Search filters for `GET /runs`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct RunSearchQuery {
    pub model_id: Option<String>,
    pub model_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Provides document access to model runs.
pub struct RunRepo;

impl RunRepo {
    /// Insert or replace a run document. A resubmitted run id (a force
    /// restart, or a retry after a partial submission) rewrites the
    /// existing row in place.
    pub async fn upsert(pool: &PgPool, run: &ModelRun) -> Result<(), sqlx::Error> {
        let doc = serde_json::to_value(run).map_err(decode_error)?;
        sqlx::query(
            "INSERT INTO runs (id, model_id, model_name, status, doc) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE \
             SET model_id = EXCLUDED.model_id, model_name = EXCLUDED.model_name, \
                 status = EXCLUDED.status, doc = EXCLUDED.doc, updated_at = NOW()",
        )
        .bind(&run.id)
        .bind(&run.model_id)
        .bind(&run.model_name)
        .bind(run.status.as_str())
        .bind(doc)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Replace a run document, rewriting the promoted columns.
    pub async fn update(pool: &PgPool, run: &ModelRun) -> Result<(), sqlx::Error> {
        let doc = serde_json::to_value(run).map_err(decode_error)?;
        sqlx::query(
            "UPDATE runs \
             SET model_id = $2, model_name = $3, status = $4, doc = $5, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(&run.id)
        .bind(&run.model_id)
        .bind(&run.model_name)
        .bind(run.status.as_str())
        .bind(doc)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fetch a run document by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ModelRun>, sqlx::Error> {
        let doc: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT doc FROM runs WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        doc.map(|d| serde_json::from_value(d).map_err(decode_error))
            .transpose()
    }

    /// Search runs by model id or name, newest first.
    pub async fn search(
        pool: &PgPool,
        params: &RunSearchQuery,
    ) -> Result<Vec<ModelRun>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if params.model_id.is_some() {
            conditions.push(format!("model_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.model_name.is_some() {
            conditions.push(format!("model_name = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT doc FROM runs \
             {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_scalar::<_, serde_json::Value>(&query);
        if let Some(model_id) = &params.model_id {
            q = q.bind(model_id);
        }
        if let Some(model_name) = &params.model_name {
            q = q.bind(model_name);
        }
        q = q.bind(limit).bind(offset);

        let docs = q.fetch_all(pool).await?;
        docs.into_iter()
            .map(|d| serde_json::from_value(d).map_err(decode_error))
            .collect()
    }
}

fn decode_error(e: serde_json::Error) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}
