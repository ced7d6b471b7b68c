use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use policyhub_core::{
    ComplianceFramework, Policy, PolicySection, PolicyStatus, PolicyVersion, VersionNumber,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::PolicyStore;
use crate::error::{Result, ServiceError};

const POLICY_COLUMNS: &str = r#"
    p.id, p.title, p.description, p.content, p.policy_type, p.status,
    p.version_tenths, p.author_id, p.reviewer_id, p.rejection_reason,
    p.created_at, p.updated_at,
    COALESCE(
        (SELECT array_agg(t.tag ORDER BY t.position) FROM policy_tags t WHERE t.policy_id = p.id),
        '{}'::text[]
    ) AS tags
"#;

#[derive(Debug, sqlx::FromRow)]
struct PolicyRow {
    id: Uuid,
    title: String,
    description: String,
    content: String,
    policy_type: String,
    status: String,
    version_tenths: i32,
    author_id: String,
    reviewer_id: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tags: Vec<String>,
}

impl TryFrom<PolicyRow> for Policy {
    type Error = ServiceError;

    fn try_from(row: PolicyRow) -> Result<Self> {
        let status = PolicyStatus::from_str(&row.status).map_err(|_| {
            ServiceError::Storage(format!("policy {} has unknown status '{}'", row.id, row.status))
        })?;

        Ok(Policy {
            id: row.id,
            title: row.title,
            description: row.description,
            content: row.content,
            policy_type: row.policy_type,
            tags: row.tags,
            status,
            version: version_from_db(row.version_tenths)?,
            author_id: row.author_id,
            reviewer_id: row.reviewer_id,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VersionRow {
    version_id: Uuid,
    policy_id: Uuid,
    version_tenths: i32,
    label: String,
    description: String,
    created_at: DateTime<Utc>,
    edited_by: String,
}

impl TryFrom<VersionRow> for PolicyVersion {
    type Error = ServiceError;

    fn try_from(row: VersionRow) -> Result<Self> {
        Ok(PolicyVersion {
            version_id: row.version_id,
            policy_id: row.policy_id,
            number: version_from_db(row.version_tenths)?,
            label: row.label,
            description: row.description,
            created_at: row.created_at,
            edited_by: row.edited_by,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SectionRow {
    section_number: i32,
    title: String,
    content: String,
    compliance_tags: Vec<String>,
}

impl TryFrom<SectionRow> for PolicySection {
    type Error = ServiceError;

    fn try_from(row: SectionRow) -> Result<Self> {
        let section_number = u32::try_from(row.section_number)
            .map_err(|_| ServiceError::Storage(format!("invalid section number {}", row.section_number)))?;
        Ok(PolicySection::new(section_number, row.title, row.content).with_tags(row.compliance_tags))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FrameworkRow {
    framework_name: String,
    control_id: String,
    keywords: Option<Vec<String>>,
}

impl From<FrameworkRow> for ComplianceFramework {
    fn from(row: FrameworkRow) -> Self {
        ComplianceFramework {
            framework_name: row.framework_name,
            control_id: row.control_id,
            keywords: row.keywords,
        }
    }
}

fn version_from_db(tenths: i32) -> Result<VersionNumber> {
    u32::try_from(tenths)
        .map(VersionNumber::from_tenths)
        .map_err(|_| ServiceError::Storage(format!("invalid stored version {tenths}")))
}

fn version_to_db(version: VersionNumber) -> Result<i32> {
    i32::try_from(version.tenths())
        .map_err(|_| ServiceError::Storage(format!("version {version} out of range")))
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgPolicyStore {
    pool: PgPool,
}

impl PgPolicyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert or update a framework control, keyed by name and control id.
    #[tracing::instrument(skip(self, framework), fields(tag = %framework.tag()))]
    pub async fn upsert_framework(&self, framework: &ComplianceFramework) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO compliance_frameworks (framework_name, control_id, keywords)
            VALUES ($1, $2, $3)
            ON CONFLICT (framework_name, control_id) DO UPDATE SET keywords = EXCLUDED.keywords
            "#,
        )
        .bind(&framework.framework_name)
        .bind(&framework.control_id)
        .bind(&framework.keywords)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn exists(tx: &mut Transaction<'_, Postgres>, policy_id: Uuid) -> Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM policies WHERE id = $1")
            .bind(policy_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_version_in(
        tx: &mut Transaction<'_, Postgres>,
        version: &PolicyVersion,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO policy_versions
                (version_id, policy_id, version_tenths, label, description, created_at, edited_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(version.version_id)
        .bind(version.policy_id)
        .bind(version_to_db(version.number)?)
        .bind(&version.label)
        .bind(&version.description)
        .bind(version.created_at)
        .bind(&version.edited_by)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    #[tracing::instrument(skip(self, policy), fields(policy_id = %policy.id))]
    async fn insert_policy(&self, policy: &Policy) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO policies
                (id, title, description, content, policy_type, status, version_tenths,
                 author_id, reviewer_id, rejection_reason, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(policy.id)
        .bind(&policy.title)
        .bind(&policy.description)
        .bind(&policy.content)
        .bind(&policy.policy_type)
        .bind(policy.status.as_str())
        .bind(version_to_db(policy.version)?)
        .bind(&policy.author_id)
        .bind(&policy.reviewer_id)
        .bind(&policy.rejection_reason)
        .bind(policy.created_at)
        .bind(policy.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!("policy row inserted");
        Ok(())
    }

    async fn get_policy(&self, policy_id: Uuid) -> Result<Policy> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies p WHERE p.id = $1"
        ))
        .bind(policy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::PolicyNotFound(policy_id))?;

        row.try_into()
    }

    async fn list_policies(&self, status: Option<PolicyStatus>) -> Result<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(&format!(
            r#"
            SELECT {POLICY_COLUMNS} FROM policies p
            WHERE $1::text IS NULL OR p.status = $1
            ORDER BY p.created_at DESC, p.id
            "#
        ))
        .bind(status.map(PolicyStatus::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Policy::try_from).collect()
    }

    #[tracing::instrument(skip(self, version), fields(policy_id = %version.policy_id, version = %version.number))]
    async fn insert_version(&self, version: &PolicyVersion) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_version_in(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_versions(&self, policy_id: Uuid) -> Result<Vec<PolicyVersion>> {
        let rows = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT version_id, policy_id, version_tenths, label, description, created_at, edited_by
            FROM policy_versions
            WHERE policy_id = $1
            ORDER BY created_at DESC, version_tenths DESC
            "#,
        )
        .bind(policy_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PolicyVersion::try_from).collect()
    }

    #[tracing::instrument(skip(self, policy, version), fields(policy_id = %policy.id, expected = %expected, version = %version.number))]
    async fn commit_update(
        &self,
        policy: &Policy,
        expected: VersionNumber,
        version: &PolicyVersion,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE policies
            SET title = $2, description = $3, content = $4, policy_type = $5,
                version_tenths = $6, updated_at = $7
            WHERE id = $1 AND version_tenths = $8
            "#,
        )
        .bind(policy.id)
        .bind(&policy.title)
        .bind(&policy.description)
        .bind(&policy.content)
        .bind(&policy.policy_type)
        .bind(version_to_db(policy.version)?)
        .bind(policy.updated_at)
        .bind(version_to_db(expected)?)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists = Self::exists(&mut tx, policy.id).await?;
            tx.rollback().await?;
            return Err(if exists {
                ServiceError::VersionConflict {
                    policy_id: policy.id,
                    expected,
                }
            } else {
                ServiceError::PolicyNotFound(policy.id)
            });
        }

        Self::insert_version_in(&mut tx, version).await?;
        tx.commit().await?;

        tracing::info!("policy update committed");
        Ok(())
    }

    #[tracing::instrument(skip(self, policy), fields(policy_id = %policy.id, status = %policy.status))]
    async fn update_status(&self, policy: &Policy, expected: PolicyStatus) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE policies
            SET status = $2, reviewer_id = $3, rejection_reason = $4, updated_at = $5
            WHERE id = $1 AND status = $6
            "#,
        )
        .bind(policy.id)
        .bind(policy.status.as_str())
        .bind(&policy.reviewer_id)
        .bind(&policy.rejection_reason)
        .bind(policy.updated_at)
        .bind(expected.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists = Self::exists(&mut tx, policy.id).await?;
            tx.rollback().await?;
            return Err(if exists {
                ServiceError::StatusConflict {
                    policy_id: policy.id,
                    expected,
                }
            } else {
                ServiceError::PolicyNotFound(policy.id)
            });
        }

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, tags), fields(count = tags.len()))]
    async fn link_tags(&self, policy_id: Uuid, tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if !Self::exists(&mut tx, policy_id).await? {
            return Err(ServiceError::PolicyNotFound(policy_id));
        }

        sqlx::query("DELETE FROM policy_tags WHERE policy_id = $1")
            .bind(policy_id)
            .execute(&mut *tx)
            .await?;

        for (position, tag) in (0_i32..).zip(tags) {
            sqlx::query(
                r#"
                INSERT INTO policy_tags (policy_id, tag, position)
                VALUES ($1, $2, $3)
                ON CONFLICT (policy_id, tag) DO NOTHING
                "#,
            )
            .bind(policy_id)
            .bind(tag)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, sections), fields(count = sections.len()))]
    async fn replace_sections(&self, policy_id: Uuid, sections: &[PolicySection]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if !Self::exists(&mut tx, policy_id).await? {
            return Err(ServiceError::PolicyNotFound(policy_id));
        }

        sqlx::query("DELETE FROM policy_sections WHERE policy_id = $1")
            .bind(policy_id)
            .execute(&mut *tx)
            .await?;

        for section in sections {
            let section_number = i32::try_from(section.section_number).map_err(|_| {
                ServiceError::Storage(format!("section number {} out of range", section.section_number))
            })?;
            sqlx::query(
                r#"
                INSERT INTO policy_sections (policy_id, section_number, title, content, compliance_tags)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(policy_id)
            .bind(section_number)
            .bind(&section.title)
            .bind(&section.content)
            .bind(&section.compliance_tags)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_sections(&self, policy_id: Uuid) -> Result<Vec<PolicySection>> {
        let rows = sqlx::query_as::<_, SectionRow>(
            r#"
            SELECT section_number, title, content, compliance_tags
            FROM policy_sections
            WHERE policy_id = $1
            ORDER BY section_number
            "#,
        )
        .bind(policy_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PolicySection::try_from).collect()
    }

    async fn list_frameworks(&self) -> Result<Vec<ComplianceFramework>> {
        let rows = sqlx::query_as::<_, FrameworkRow>(
            r#"
            SELECT framework_name, control_id, keywords
            FROM compliance_frameworks
            ORDER BY framework_name, control_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ComplianceFramework::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_policy(&self, policy_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM policies WHERE id = $1")
            .bind(policy_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::PolicyNotFound(policy_id));
        }
        tracing::info!("policy deleted");
        Ok(())
    }
}
