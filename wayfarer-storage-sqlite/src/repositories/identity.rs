use crate::{from_timestamp, repositories::map_sqlx_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use wayfarer_core::{
    Error, Identity, IdentityId, IdentityRepository, NewIdentity, error::StorageError,
};

#[derive(Debug, sqlx::FromRow)]
struct SqliteIdentity {
    id: String,
    email: String,
    name: Option<String>,
    email_verified_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteIdentity> for Identity {
    type Error = Error;

    fn try_from(row: SqliteIdentity) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: IdentityId::from(row.id),
            email: row.email,
            name: row.name,
            email_verified_at: row.email_verified_at.map(from_timestamp).transpose()?,
            created_at: from_timestamp(row.created_at)?,
            updated_at: from_timestamp(row.updated_at)?,
        })
    }
}

const IDENTITY_COLUMNS: &str = "id, email, name, email_verified_at, created_at, updated_at";

pub struct SqliteIdentityRepository {
    pool: SqlitePool,
}

impl SqliteIdentityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for SqliteIdentityRepository {
    async fn create(&self, identity: NewIdentity) -> Result<Identity, Error> {
        let now = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, SqliteIdentity>(&format!(
            r#"
            INSERT INTO identities (id, email, name, email_verified_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING {IDENTITY_COLUMNS}
            "#
        ))
        .bind(identity.id.as_str())
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(identity.email_verified_at.map(|dt| dt.timestamp_millis()))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create identity", e))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, Error> {
        sqlx::query_as::<_, SqliteIdentity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find identity by id", e))?
        .map(Identity::try_from)
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, Error> {
        sqlx::query_as::<_, SqliteIdentity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find identity by email", e))?
        .map(Identity::try_from)
        .transpose()
    }

    async fn mark_verified(&self, id: &IdentityId, at: DateTime<Utc>) -> Result<(), Error> {
        let result = sqlx::query(
            "UPDATE identities SET email_verified_at = ?1, updated_at = ?1 WHERE id = ?2",
        )
        .bind(at.timestamp_millis())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("mark identity verified", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: &IdentityId, hash: &str) -> Result<(), Error> {
        let result =
            sqlx::query("UPDATE identities SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(hash)
                .bind(Utc::now().timestamp_millis())
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update password hash", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }
        Ok(())
    }

    async fn get_password_hash(&self, id: &IdentityId) -> Result<Option<String>, Error> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password_hash FROM identities WHERE id = ?1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("get password hash", e))?;

        Ok(hash.flatten())
    }
}
