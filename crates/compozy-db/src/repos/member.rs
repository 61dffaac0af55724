//! Organization membership and role gates.

use chrono::Utc;

use compozy_core::entities::OrganizationMember;
use compozy_core::enums::MemberRole;
use compozy_core::errors::CoreError;
use compozy_core::ids::PREFIX_MEMBER;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::WorkflowService;

const SELECT_COLS: &str = "id, organization_id, user_id, role, invited_by, joined_at, updated_at";

fn row_to_member(row: &libsql::Row) -> Result<OrganizationMember, DatabaseError> {
    Ok(OrganizationMember {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        user_id: row.get(2)?,
        role: parse_enum(&row.get::<String>(3)?)?,
        invited_by: get_opt_string(row, 4)?,
        joined_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl WorkflowService {
    /// Add `user_id` to an organization.
    ///
    /// When `invited_by` is given, that user must be an admin of the
    /// organization. Only the first member of an empty organization may be
    /// added without an inviter, and that member must be an admin.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an unknown organization, a blank
    /// user id or an existing membership, and `CoreError::PermissionDenied`
    /// when the inviter may not manage members or is missing for a
    /// non-empty organization.
    pub async fn add_member(
        &self,
        organization_id: &str,
        user_id: &str,
        role: MemberRole,
        invited_by: Option<&str>,
    ) -> Result<OrganizationMember, DatabaseError> {
        if user_id.trim().is_empty() {
            return Err(CoreError::validation("user id must not be blank").into());
        }
        self.require_organization(organization_id).await?;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_MEMBER).await?;
        let _guard = self.db().write_guard().await;
        match invited_by {
            Some(inviter) => {
                self.require_role(organization_id, inviter, MemberRole::can_manage_members, "manage members")
                    .await?;
            }
            None if self.member_count(organization_id).await? > 0 => {
                return Err(CoreError::PermissionDenied(format!(
                    "{organization_id} already has members; adding {user_id} needs an admin inviter"
                ))
                .into());
            }
            None if role != MemberRole::Admin => {
                return Err(CoreError::PermissionDenied(format!(
                    "the first member of {organization_id} must be an admin, not {role}"
                ))
                .into());
            }
            None => {}
        }
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO organization_members ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                libsql::params![
                    id.as_str(),
                    organization_id,
                    user_id,
                    role.as_str(),
                    invited_by,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(OrganizationMember {
            id,
            organization_id: organization_id.to_string(),
            user_id: user_id.to_string(),
            role,
            invited_by: invited_by.map(String::from),
            joined_at: now,
            updated_at: now,
        })
    }

    /// Role of `user_id` in the organization, if they are a member.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn member_role(
        &self,
        organization_id: &str,
        user_id: &str,
    ) -> Result<Option<MemberRole>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT role FROM organization_members WHERE organization_id = ?1 AND user_id = ?2",
                libsql::params![organization_id, user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_enum(&row.get::<String>(0)?)?)),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_members(
        &self,
        organization_id: &str,
    ) -> Result<Vec<OrganizationMember>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM organization_members
                     WHERE organization_id = ?1 ORDER BY joined_at, rowid"
                ),
                [organization_id],
            )
            .await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(row_to_member(&row)?);
        }
        Ok(members)
    }

    /// # Errors
    ///
    /// Returns `CoreError::PermissionDenied` unless `acting_user` is an admin
    /// or when the change would demote the last admin, and
    /// `CoreError::NotFound` if `user_id` is not a member.
    pub async fn update_member_role(
        &self,
        organization_id: &str,
        user_id: &str,
        role: MemberRole,
        acting_user: &str,
    ) -> Result<OrganizationMember, DatabaseError> {
        self.require_role(organization_id, acting_user, MemberRole::can_manage_members, "manage members")
            .await?;
        let changed = {
            let _guard = self.db().write_guard().await;
            if role != MemberRole::Admin {
                self.keep_an_admin(organization_id, user_id, "demote").await?;
            }
            self.db()
                .conn()
                .execute(
                    "UPDATE organization_members SET role = ?1, updated_at = ?2
                     WHERE organization_id = ?3 AND user_id = ?4",
                    libsql::params![role.as_str(), Utc::now().to_rfc3339(), organization_id, user_id],
                )
                .await?
        };
        if changed == 0 {
            return Err(CoreError::not_found("member", user_id).into());
        }
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM organization_members
                     WHERE organization_id = ?1 AND user_id = ?2"
                ),
                libsql::params![organization_id, user_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_member(&row)
    }

    /// # Errors
    ///
    /// Returns `CoreError::PermissionDenied` unless `acting_user` is an admin
    /// or when `user_id` is the last admin, and `CoreError::NotFound` if
    /// `user_id` is not a member.
    pub async fn remove_member(
        &self,
        organization_id: &str,
        user_id: &str,
        acting_user: &str,
    ) -> Result<(), DatabaseError> {
        self.require_role(organization_id, acting_user, MemberRole::can_manage_members, "manage members")
            .await?;
        let _guard = self.db().write_guard().await;
        self.keep_an_admin(organization_id, user_id, "remove").await?;
        let deleted = self
            .db()
            .conn()
            .execute(
                "DELETE FROM organization_members WHERE organization_id = ?1 AND user_id = ?2",
                libsql::params![organization_id, user_id],
            )
            .await?;
        if deleted == 0 {
            return Err(CoreError::not_found("member", user_id).into());
        }
        Ok(())
    }

    async fn member_count(&self, organization_id: &str) -> Result<i64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM organization_members WHERE organization_id = ?1",
                [organization_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get(0)?)
    }

    /// Refuse to take admin rights away from the organization's last admin.
    ///
    /// Callers hold the write guard.
    async fn keep_an_admin(
        &self,
        organization_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<(), DatabaseError> {
        if self.member_role(organization_id, user_id).await? != Some(MemberRole::Admin) {
            return Ok(());
        }
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM organization_members WHERE organization_id = ?1 AND role = ?2",
                libsql::params![organization_id, MemberRole::Admin.as_str()],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let admins: i64 = row.get(0)?;
        if admins <= 1 {
            return Err(CoreError::PermissionDenied(format!(
                "cannot {action} {user_id}: they are the last admin of {organization_id}"
            ))
            .into());
        }
        Ok(())
    }

    pub(crate) async fn require_organization(&self, organization_id: &str) -> Result<(), DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT 1 FROM organizations WHERE id = ?1", [organization_id])
            .await?;
        if rows.next().await?.is_none() {
            return Err(CoreError::validation(format!(
                "organization {organization_id} does not exist"
            ))
            .into());
        }
        Ok(())
    }

    /// Fail with `PermissionDenied` unless `user_id`'s role passes `allowed`.
    pub(crate) async fn require_role(
        &self,
        organization_id: &str,
        user_id: &str,
        allowed: fn(MemberRole) -> bool,
        action: &str,
    ) -> Result<MemberRole, DatabaseError> {
        match self.member_role(organization_id, user_id).await? {
            Some(role) if allowed(role) => Ok(role),
            Some(role) => Err(CoreError::PermissionDenied(format!(
                "{user_id} is {role} in {organization_id} and cannot {action}"
            ))
            .into()),
            None => Err(CoreError::PermissionDenied(format!(
                "{user_id} is not a member of {organization_id}"
            ))
            .into()),
        }
    }
}
