//! PostgreSQL identity store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | duplicate username or role name |
//! | Database (foreign key violation) | `23503` | `NotFound` | user references a role that was removed |
//! | Database (other) | Any other | `Backend` | |
//! | PoolClosed / Io / other | N/A | `Backend` | connectivity |
//!
//! Multi-statement writes (`save_user`, `save_role`) run in one transaction.
//! Nothing spans calls: a read followed by a write is last-writer-wins.

use std::sync::Arc;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use warden_auth::permissions;
use warden_auth::{HashedPassword, IdentityStore, Permission, Role, RoleName, StoreError, User};
use warden_core::{RoleId, UserId};

const SCHEMA: &str = include_str!("../migrations/0001_identity.sql");

const SELECT_USERS: &str = r#"
    SELECT
        u.id,
        u.username,
        u.password_hash,
        u.email,
        COALESCE(array_agg(r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

const SELECT_ROLES: &str = r#"
    SELECT
        r.id,
        r.name,
        COALESCE(array_agg(rp.permission) FILTER (WHERE rp.permission IS NOT NULL), '{}') AS permissions
    FROM roles r
    LEFT JOIN role_permissions rp ON rp.role_id = r.id
"#;

/// Postgres-backed [`IdentityStore`].
///
/// Tables: `users`, `roles`, `role_permissions`, `user_roles` (see
/// `migrations/0001_identity.sql`).
#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: Arc<PgPool>,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema. Safe to run on every start.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn fetch_user(&self, clause: &str, bind: UserLookup<'_>) -> Result<Option<User>, StoreError> {
        let sql = format!("{SELECT_USERS} WHERE {clause} GROUP BY u.id");
        let query = sqlx::query(&sql);
        let query = match bind {
            UserLookup::Id(id) => query.bind(*id.as_uuid()),
            UserLookup::Username(name) => query.bind(name),
        };
        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.map(|r| user_from_row(&r)).transpose()
    }

    async fn fetch_role(&self, clause: &str, bind: RoleLookup<'_>) -> Result<Option<Role>, StoreError> {
        let sql = format!("{SELECT_ROLES} WHERE {clause} GROUP BY r.id");
        let query = sqlx::query(&sql);
        let query = match bind {
            RoleLookup::Id(id) => query.bind(*id.as_uuid()),
            RoleLookup::Name(name) => query.bind(name),
        };
        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_role", e))?;
        row.map(|r| role_from_row(&r)).transpose()
    }
}

enum UserLookup<'a> {
    Id(UserId),
    Username(&'a str),
}

enum RoleLookup<'a> {
    Id(RoleId),
    Name(&'a str),
}

#[async_trait::async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.fetch_user("u.username = $1", UserLookup::Username(username)).await
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.fetch_user("u.id = $1", UserLookup::Id(id)).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1) AS present")
            .bind(username)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists_by_username", e))?;
        row.try_get("present")
            .map_err(|e| map_sqlx_error("exists_by_username", e))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("{SELECT_USERS} GROUP BY u.id ORDER BY u.id");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn save_user(&self, user: User) -> Result<User, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET
                username = EXCLUDED.username,
                password_hash = EXCLUDED.password_hash,
                email = EXCLUDED.email,
                updated_at = NOW()
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(user.password.as_str())
        .bind(&user.email)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_user", e))?;

        replace_user_roles(&mut tx, &user).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn delete_user_by_id(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        self.fetch_role("r.name = $1", RoleLookup::Name(name)).await
    }

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        self.fetch_role("r.id = $1", RoleLookup::Id(id)).await
    }

    async fn find_all_roles(&self) -> Result<Vec<Role>, StoreError> {
        let sql = format!("{SELECT_ROLES} GROUP BY r.id ORDER BY r.id");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_all_roles", e))?;
        rows.iter().map(role_from_row).collect()
    }

    #[instrument(skip(self, role), fields(role = %role.name), err)]
    async fn save_role(&self, role: Role) -> Result<Role, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id)
            DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(role.name.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_role", e))?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("save_role", e))?;

        let codes: Vec<&str> = role.permissions.iter().map(Permission::as_str).collect();
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission)
            SELECT $1, code FROM UNNEST($2::text[]) AS code
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(codes)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_role", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(role)
    }
}

/// Rewrite the `user_roles` rows of `user`. Fails with `NotFound` when a role
/// name has no record.
async fn replace_user_roles(tx: &mut Transaction<'_, Postgres>, user: &User) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user.id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("save_user_roles", e))?;

    let names: Vec<&str> = user.roles.iter().map(RoleName::as_str).collect();
    let inserted = sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        SELECT $1, id FROM roles WHERE name = ANY($2::text[])
        "#,
    )
    .bind(user.id.as_uuid())
    .bind(names.as_slice())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("save_user_roles", e))?
    .rows_affected();

    if inserted != names.len() as u64 {
        return Err(StoreError::NotFound(format!(
            "one or more roles do not exist: {}",
            names.join(", ")
        )));
    }
    Ok(())
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let decode = |e| map_sqlx_error("decode_user", e);
    let roles: Vec<String> = row.try_get("roles").map_err(decode)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(decode)?),
        username: row.try_get("username").map_err(decode)?,
        password: HashedPassword::from_stored(row.try_get::<String, _>("password_hash").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        roles: roles.into_iter().map(RoleName::from).collect(),
    })
}

fn role_from_row(row: &PgRow) -> Result<Role, StoreError> {
    let decode = |e| map_sqlx_error("decode_role", e);
    let name: String = row.try_get("name").map_err(decode)?;
    let codes: Vec<String> = row.try_get("permissions").map_err(decode)?;

    let mut perms = std::collections::BTreeSet::new();
    for code in codes {
        match permissions::lookup(&code) {
            Some(p) => {
                perms.insert(p);
            }
            None => tracing::warn!(role = %name, code = %code, "ignoring stored permission outside the catalog"),
        }
    }

    Ok(Role {
        id: RoleId::from_uuid(row.try_get("id").map_err(decode)?),
        name: RoleName::from(name),
        permissions: perms,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        other => StoreError::Backend(format!("{} failed: {}", operation, other)),
    }
}
