//! Document repository: versioned PRDs and technical specs of a problem.

use chrono::Utc;

use compozy_core::entities::Document;
use compozy_core::enums::DocumentKind;
use compozy_core::errors::CoreError;
use compozy_core::ids::PREFIX_DOCUMENT;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, opt_text_value, parse_datetime, parse_enum, parse_optional_datetime};
use crate::service::WorkflowService;

const DOCUMENT_COLS: &str = "id, problem_id, kind, version, content, summary, word_count, \
     created_by, is_approved, approved_by, approved_at, change_notes, created_at, updated_at";

/// Input for [`WorkflowService::create_document`].
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub problem_id: String,
    pub kind: DocumentKind,
    pub content: String,
    pub summary: String,
    pub created_by: Option<String>,
    pub change_notes: String,
}

fn row_to_document(row: &libsql::Row) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: row.get(0)?,
        problem_id: row.get(1)?,
        kind: parse_enum(&row.get::<String>(2)?)?,
        version: row.get(3)?,
        content: row.get(4)?,
        summary: row.get(5)?,
        word_count: row.get(6)?,
        created_by: get_opt_string(row, 7)?,
        is_approved: get_bool(row, 8)?,
        approved_by: get_opt_string(row, 9)?,
        approved_at: parse_optional_datetime(get_opt_string(row, 10)?.as_deref())?,
        change_notes: row.get(11)?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
        updated_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

impl WorkflowService {
    /// Store a new version of a document. Versions count 1, 2, 3, … per
    /// problem and kind.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for blank content or an unknown problem.
    pub async fn create_document(&self, new: NewDocument) -> Result<Document, DatabaseError> {
        if new.content.trim().is_empty() {
            return Err(CoreError::validation("document content must not be blank").into());
        }
        self.require_problem(&new.problem_id).await?;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_DOCUMENT).await?;
        let word_count = Document::count_words(&new.content);

        let version = {
            let _guard = self.db().write_guard().await;
            let tx = self.db().conn().transaction().await?;
            let mut rows = tx
                .query(
                    "SELECT COALESCE(MAX(version), 0) + 1 FROM documents WHERE problem_id = ?1 AND kind = ?2",
                    libsql::params![new.problem_id.as_str(), new.kind.as_str()],
                )
                .await?;
            let version = rows
                .next()
                .await?
                .ok_or(DatabaseError::NoResult)?
                .get::<i64>(0)?;
            drop(rows);

            tx.execute(
                "INSERT INTO documents (id, problem_id, kind, version, content, summary, word_count,
                                        created_by, change_notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                libsql::params![
                    id.as_str(),
                    new.problem_id.as_str(),
                    new.kind.as_str(),
                    version,
                    new.content.as_str(),
                    new.summary.as_str(),
                    word_count,
                    opt_text_value(new.created_by.as_deref()),
                    new.change_notes.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            tx.commit().await?;
            version
        };
        tracing::debug!(document_id = %id, kind = %new.kind, version, "document stored");

        Ok(Document {
            id,
            problem_id: new.problem_id,
            kind: new.kind,
            version,
            content: new.content,
            summary: new.summary,
            word_count,
            created_by: new.created_by,
            is_approved: false,
            approved_by: None,
            approved_at: None,
            change_notes: new.change_notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the document does not exist.
    pub async fn get_document(&self, id: &str) -> Result<Document, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {DOCUMENT_COLS} FROM documents WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("document", id))?;
        row_to_document(&row)
    }

    /// Newest version of one document kind.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the problem has no document of `kind`.
    pub async fn latest_document(
        &self,
        problem_id: &str,
        kind: DocumentKind,
    ) -> Result<Document, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {DOCUMENT_COLS} FROM documents WHERE problem_id = ?1 AND kind = ?2
                     ORDER BY version DESC LIMIT 1"
                ),
                libsql::params![problem_id, kind.as_str()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found(kind.as_str(), problem_id))?;
        row_to_document(&row)
    }

    /// Documents of a problem grouped by kind, newest version first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_documents(
        &self,
        problem_id: &str,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<Document>, DatabaseError> {
        let mut rows = match kind {
            Some(kind) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {DOCUMENT_COLS} FROM documents WHERE problem_id = ?1 AND kind = ?2
                             ORDER BY version DESC"
                        ),
                        libsql::params![problem_id, kind.as_str()],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {DOCUMENT_COLS} FROM documents WHERE problem_id = ?1
                             ORDER BY kind, version DESC"
                        ),
                        [problem_id],
                    )
                    .await?
            }
        };
        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            documents.push(row_to_document(&row)?);
        }
        Ok(documents)
    }

    /// Newest version of each kind present on the problem.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_documents(&self, problem_id: &str) -> Result<Vec<Document>, DatabaseError> {
        let mut latest: Vec<Document> = Vec::new();
        for doc in self.list_documents(problem_id, None).await? {
            if latest.last().is_none_or(|prev| prev.kind != doc.kind) {
                latest.push(doc);
            }
        }
        Ok(latest)
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank approver and
    /// `CoreError::NotFound` if the document does not exist.
    pub async fn approve_document(
        &self,
        id: &str,
        approved_by: &str,
    ) -> Result<Document, DatabaseError> {
        if approved_by.trim().is_empty() {
            return Err(CoreError::validation("approver must not be blank").into());
        }
        let now = Utc::now().to_rfc3339();
        let changed = {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "UPDATE documents SET is_approved = 1, approved_by = ?1, approved_at = ?2, updated_at = ?2
                     WHERE id = ?3",
                    libsql::params![approved_by, now, id],
                )
                .await?
        };
        if changed == 0 {
            return Err(CoreError::not_found("document", id).into());
        }
        self.get_document(id).await
    }
}
