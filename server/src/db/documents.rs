//! PostgreSQL-backed document store.
//!
//! All collections share one `documents` table; bodies are JSONB and
//! field-equality filters are evaluated as containment (`body @> filter`).
//! Rows come back in insertion order (`seq`).

use async_trait::async_trait;
use fleet_engine::{
    Collection, Document, DocumentId, DocumentStore, Filter, StoreError, StoreResult,
    StoredDocument,
};
use serde_json::Value;
use sqlx::{PgPool, Row};

/// A stored document row from the database.
#[derive(Debug)]
pub struct DocumentRow {
    pub doc_id: String,
    pub body: Value,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for DocumentRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(DocumentRow {
            doc_id: row.try_get("doc_id")?,
            body: row.try_get("body")?,
        })
    }
}

impl DocumentRow {
    /// Convert a database row into a stored document.
    pub fn into_document(self, collection: Collection) -> StoreResult<StoredDocument> {
        let id = DocumentId::parse(&self.doc_id).map_err(|e| StoreError::Decode {
            collection,
            detail: e.to_string(),
        })?;

        match self.body {
            Value::Object(body) => Ok(StoredDocument { id, body }),
            other => Err(StoreError::Decode {
                collection,
                detail: format!("document {id} is not an object: {other}"),
            }),
        }
    }
}

/// Document store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn filter_value(filter: &Filter) -> Value {
    Value::Object(filter.as_document().clone())
}

fn map_err(collection: Collection, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate {
                collection,
                detail: db.message().to_string(),
            };
        }
    }

    tracing::error!(%collection, "Database error: {:?}", err);
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, collection: Collection, doc: Document) -> StoreResult<DocumentId> {
        let id = DocumentId::generate();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, doc_id, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection.name())
        .bind(id.as_str())
        .bind(Value::Object(doc))
        .execute(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        Ok(id)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT doc_id, body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY seq ASC
            LIMIT 1
            "#,
        )
        .bind(collection.name())
        .bind(filter_value(filter))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        row.map(|r| r.into_document(collection)).transpose()
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<StoredDocument>> {
        // LIMIT NULL is LIMIT ALL
        let limit = limit.map(|l| l as i64);

        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT doc_id, body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY seq ASC
            LIMIT $3
            "#,
        )
        .bind(collection.name())
        .bind(filter_value(filter))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        rows.into_iter()
            .map(|r| r.into_document(collection))
            .collect()
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &DocumentId,
    ) -> StoreResult<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT doc_id, body
            FROM documents
            WHERE collection = $1 AND doc_id = $2
            "#,
        )
        .bind(collection.name())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        row.map(|r| r.into_document(collection)).transpose()
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &DocumentId,
        doc: Document,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = $3
            WHERE collection = $1 AND doc_id = $2
            "#,
        )
        .bind(collection.name())
        .bind(id.as_str())
        .bind(Value::Object(doc))
        .execute(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, collection: Collection, id: &DocumentId) -> StoreResult<u64> {
        let result = sqlx::query(r#"DELETE FROM documents WHERE collection = $1 AND doc_id = $2"#)
            .bind(collection.name())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_err(collection, e))?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE seq = (
                SELECT seq FROM documents
                WHERE collection = $1 AND body @> $2
                ORDER BY seq ASC
                LIMIT 1
            )
            "#,
        )
        .bind(collection.name())
        .bind(filter_value(filter))
        .execute(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        Ok(result.rows_affected())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let result: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM documents WHERE collection = $1 AND body @> $2"#,
        )
        .bind(collection.name())
        .bind(filter_value(filter))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        Ok(result.0 as u64)
    }

    async fn next_sequence(&self, collection: Collection) -> StoreResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sequences (collection, value)
            VALUES ($1, 1)
            ON CONFLICT (collection) DO UPDATE SET value = sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(collection.name())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(collection, e))?;

        Ok(result.0)
    }
}
