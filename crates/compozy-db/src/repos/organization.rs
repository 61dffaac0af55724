//! Organization repository.

use chrono::Utc;

use compozy_core::entities::Organization;
use compozy_core::errors::CoreError;
use compozy_core::ids::PREFIX_ORGANIZATION;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, parse_datetime};
use crate::service::WorkflowService;

const SELECT_COLS: &str = "id, name, slug, description, is_active, created_at, updated_at";

fn row_to_organization(row: &libsql::Row) -> Result<Organization, DatabaseError> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: get_opt_string(row, 3)?,
        is_active: get_bool(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl WorkflowService {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank name, a malformed slug, or
    /// a slug that is already taken.
    pub async fn create_organization(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Organization, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("organization name must not be blank").into());
        }
        if !Organization::is_valid_slug(slug) {
            return Err(CoreError::validation(format!(
                "invalid slug '{slug}': use lowercase letters, digits and hyphens"
            ))
            .into());
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_ORGANIZATION).await?;
        let _guard = self.db().write_guard().await;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO organizations ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)"
                ),
                libsql::params![
                    id.as_str(),
                    name,
                    slug,
                    description,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        tracing::info!(organization_id = %id, slug, "organization created");

        Ok(Organization {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            description: description.map(String::from),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no organization has this id.
    pub async fn get_organization(&self, id: &str) -> Result<Organization, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM organizations WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("organization", id))?;
        row_to_organization(&row)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if no organization has this slug.
    pub async fn get_organization_by_slug(
        &self,
        slug: &str,
    ) -> Result<Organization, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM organizations WHERE slug = ?1"),
                [slug],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("organization", slug))?;
        row_to_organization(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM organizations ORDER BY name"),
                (),
            )
            .await?;
        let mut orgs = Vec::new();
        while let Some(row) = rows.next().await? {
            orgs.push(row_to_organization(&row)?);
        }
        Ok(orgs)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the organization does not exist.
    pub async fn set_organization_active(
        &self,
        id: &str,
        active: bool,
    ) -> Result<Organization, DatabaseError> {
        let changed = {
            let _guard = self.db().write_guard().await;
            self.db()
                .conn()
                .execute(
                    "UPDATE organizations SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![i64::from(active), Utc::now().to_rfc3339(), id],
                )
                .await?
        };
        if changed == 0 {
            return Err(CoreError::not_found("organization", id).into());
        }
        self.get_organization(id).await
    }

    /// Delete an organization with its members, repositories, problems and
    /// everything below them.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the organization does not exist.
    pub async fn delete_organization(&self, id: &str) -> Result<(), DatabaseError> {
        let _guard = self.db().write_guard().await;
        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "DELETE FROM status_transitions WHERE
                (entity_type = 'problem' AND entity_id IN
                    (SELECT id FROM problems WHERE organization_id = ?1))
             OR (entity_type = 'task' AND entity_id IN
                    (SELECT t.id FROM tasks t JOIN problems p ON t.problem_id = p.id
                     WHERE p.organization_id = ?1))
             OR (entity_type = 'execution' AND entity_id IN
                    (SELECT e.id FROM task_executions e
                     JOIN tasks t ON e.task_id = t.id
                     JOIN problems p ON t.problem_id = p.id
                     WHERE p.organization_id = ?1))",
            [id],
        )
        .await?;
        let deleted = tx
            .execute("DELETE FROM organizations WHERE id = ?1", [id])
            .await?;
        if deleted == 0 {
            tx.rollback().await?;
            return Err(CoreError::not_found("organization", id).into());
        }
        tx.commit().await?;
        tracing::info!(organization_id = id, "organization deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use compozy_core::errors::CoreError;

    use crate::error::DatabaseError;
    use crate::test_support::test_service;

    #[tokio::test]
    async fn create_and_lookup_by_slug() {
        let (svc, _) = test_service().await;
        let org = svc
            .create_organization("Acme Labs", "acme-labs", Some("R&D"))
            .await
            .unwrap();
        assert!(org.id.starts_with("org-"));

        let by_slug = svc.get_organization_by_slug("acme-labs").await.unwrap();
        assert_eq!(by_slug, svc.get_organization(&org.id).await.unwrap());
        assert_eq!(by_slug.description.as_deref(), Some("R&D"));
    }

    #[tokio::test]
    async fn duplicate_slug_is_validation_error() {
        let (svc, _) = test_service().await;
        svc.create_organization("Acme", "acme", None).await.unwrap();
        let err = svc
            .create_organization("Acme 2", "acme", None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, DatabaseError::Core(CoreError::Validation(_))),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn blank_name_and_bad_slug_rejected() {
        let (svc, _) = test_service().await;
        assert!(svc.create_organization("  ", "acme", None).await.is_err());
        assert!(svc.create_organization("Acme", "Acme!", None).await.is_err());
        assert!(svc.list_organizations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deactivate_and_delete() {
        let (svc, _) = test_service().await;
        let org = svc.create_organization("Acme", "acme", None).await.unwrap();
        let inactive = svc.set_organization_active(&org.id, false).await.unwrap();
        assert!(!inactive.is_active);

        svc.delete_organization(&org.id).await.unwrap();
        assert!(svc.get_organization(&org.id).await.unwrap_err().is_not_found());
        assert!(svc.delete_organization(&org.id).await.unwrap_err().is_not_found());
    }
}
