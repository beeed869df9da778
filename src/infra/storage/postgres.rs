//! PostgreSQL document store implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{
    AppError, DatabaseError, DocumentStore, KycDocument, KycDocumentMetadata, NewKycDocument,
    SubjectId,
};

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Document store backed by the `kyc_documents` table
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Create a new store with custom pool configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new store with default pool configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Migration(e.to_string())))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_metadata(row: &sqlx::postgres::PgRow) -> Result<KycDocumentMetadata, AppError> {
        let subject_id: String = row.try_get("subject_id")?;
        Ok(KycDocumentMetadata {
            subject_id: SubjectId::new(subject_id)?,
            content_type: row.try_get("content_type")?,
            file_name: row.try_get("file_name")?,
            size_bytes: row.try_get("size_bytes")?,
            sha256: row.try_get("sha256")?,
            uploaded_at: row.try_get("uploaded_at")?,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self), fields(subject = %subject))]
    async fn get_document(&self, subject: &SubjectId) -> Result<Option<KycDocument>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT subject_id, content_type, file_name, size_bytes, sha256, uploaded_at, content
            FROM kyc_documents
            WHERE subject_id = $1
            "#,
        )
        .bind(subject.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(KycDocument {
                metadata: Self::row_to_metadata(&row)?,
                content: row.try_get("content")?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), fields(subject = %subject))]
    async fn get_metadata(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<KycDocumentMetadata>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT subject_id, content_type, file_name, size_bytes, sha256, uploaded_at
            FROM kyc_documents
            WHERE subject_id = $1
            "#,
        )
        .bind(subject.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_metadata).transpose()
    }

    #[instrument(skip(self, document), fields(subject = %document.subject_id))]
    async fn put_document(
        &self,
        document: &NewKycDocument,
        sha256: &str,
    ) -> Result<KycDocumentMetadata, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO kyc_documents
                (id, subject_id, content_type, file_name, size_bytes, sha256, content, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (subject_id) DO UPDATE SET
                id = EXCLUDED.id,
                content_type = EXCLUDED.content_type,
                file_name = EXCLUDED.file_name,
                size_bytes = EXCLUDED.size_bytes,
                sha256 = EXCLUDED.sha256,
                content = EXCLUDED.content,
                uploaded_at = EXCLUDED.uploaded_at
            RETURNING subject_id, content_type, file_name, size_bytes, sha256, uploaded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(document.subject_id.as_str())
        .bind(&document.content_type)
        .bind(document.resolved_file_name())
        .bind(document.content.len() as i64)
        .bind(sha256)
        .bind(&document.content)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_metadata(&row)
    }

    #[instrument(skip(self), fields(subject = %subject))]
    async fn delete_document(&self, subject: &SubjectId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM kyc_documents WHERE subject_id = $1")
            .bind(subject.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
