//! PostgreSQL store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{ClientStore, SessionStore, StoreError, UserStore};
use crate::ids;
use crate::models::auth::{Client, NewUser, Role, Session, User};

/// Production store: all three store traits over one connection pool.
#[derive(Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    external_auth_id: String,
    name: String,
    email: String,
    phone_number: Option<String>,
    profile_url: Option<String>,
    email_verified: bool,
    verified_by_admin: bool,
    roles: Vec<String>,
    permissions: String,
    session_ref: Option<String>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, StoreError> {
        Ok(User {
            id: self.id,
            external_auth_id: self.external_auth_id,
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            profile_url: self.profile_url,
            email_verified: self.email_verified,
            verified_by_admin: self.verified_by_admin,
            roles: self.roles.iter().filter_map(|r| Role::parse(r)).collect(),
            permissions: parse_permissions(&self.permissions)?,
            session_ref: self.session_ref,
        })
    }
}

/// Decode the `permissions` JSONB column. A row that fails to decode is
/// surfaced as corrupt, never silently treated as an empty grant list.
fn parse_permissions(raw: &str) -> Result<Vec<crate::models::auth::Permission>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(format!("user permissions: {e}")))
}

const SELECT_USER: &str = "SELECT id::text, external_auth_id, name, email, phone_number, \
     profile_url, email_verified, verified_by_admin, roles, permissions::text, \
     session_ref::text \
     FROM users";

#[async_trait]
impl UserStore for PgAuthStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let roles: Vec<String> = new_user.roles.iter().map(|r| r.as_str().to_string()).collect();
        let permissions = serde_json::to_string(&new_user.permissions)
            .map_err(|e| StoreError::Corrupt(format!("permissions encoding: {e}")))?;
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, external_auth_id, name, email, phone_number, roles, permissions) \
             VALUES ($1::uuid, $2, $3, $4, $5, $6, $7::jsonb) \
             RETURNING id::text, external_auth_id, name, email, phone_number, profile_url, \
                       email_verified, verified_by_admin, roles, permissions::text, session_ref::text",
        )
        .bind(ids::row_id())
        .bind(&new_user.external_auth_id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.phone_number)
        .bind(&roles)
        .bind(&permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("user with email {} already exists", new_user.email))
            }
            _ => StoreError::Database(e),
        })?;
        row.try_into_user()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("{SELECT_USER} WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::try_into_user).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("{SELECT_USER} WHERE id = $1::uuid");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::try_into_user).transpose()
    }

    async fn exists_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR phone_number = $2)",
        )
        .bind(email)
        .bind(phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn attach_session(
        &self,
        user_id: &str,
        session_row_id: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET session_ref = $2::uuid WHERE id = $1::uuid")
            .bind(user_id)
            .bind(session_row_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientStore for PgAuthStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, bool)>(
            "SELECT id::text, name, key, enabled FROM clients WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, name, key, enabled)| Client {
            id,
            name,
            key,
            enabled,
        }))
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    client_id: String,
    user_id: String,
    session_id: String,
    token_id: String,
    refresh_token_id: String,
    user_agent: Option<String>,
    ipv4: Option<String>,
    token_expire: i64,
    refresh_token_expire: i64,
    expire: i64,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            id: self.id,
            client_id: self.client_id,
            user_id: self.user_id,
            session_id: self.session_id,
            token_id: self.token_id,
            refresh_token_id: self.refresh_token_id,
            user_agent: self.user_agent,
            ipv4: self.ipv4,
            token_expire_secs: self.token_expire,
            refresh_token_expire_secs: self.refresh_token_expire,
            session_expire_secs: self.expire,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl SessionStore for PgAuthStore {
    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (id, client_id, user_id, session_id, token_id, \
             refresh_token_id, user_agent, ipv4, token_expire, refresh_token_expire, \
             expire, created_at) \
             VALUES ($1::uuid, $2::uuid, $3::uuid, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&session.id)
        .bind(&session.client_id)
        .bind(&session.user_id)
        .bind(&session.session_id)
        .bind(&session.token_id)
        .bind(&session.refresh_token_id)
        .bind(&session.user_agent)
        .bind(&session.ipv4)
        .bind(session.token_expire_secs)
        .bind(session.refresh_token_expire_secs)
        .bind(session.session_expire_secs)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        // Expiry is enforced on read; a periodic sweep removes dead rows.
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id::text, client_id::text, user_id::text, session_id, token_id, \
                    refresh_token_id, user_agent, ipv4, token_expire, \
                    refresh_token_expire, expire, created_at \
             FROM sessions \
             WHERE session_id = $1 \
               AND created_at + make_interval(secs => expire::double precision) > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SessionRow::into_session))
    }

    async fn delete_by_session_id(&self, session_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Permission;

    #[test]
    fn malformed_permissions_column_is_an_error_not_an_empty_grant() {
        let err = parse_permissions("{not json").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));

        let parsed = parse_permissions(r#"[{"feature":"DEFAULT_USER","access":3}]"#).unwrap();
        assert_eq!(vec![Permission::default_user()], parsed);
    }
}
