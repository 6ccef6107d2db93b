//! User repository.
//!
//! Owns all reads and writes for the users table. Registration also creates
//! the user's cart; the two inserts are one transactional unit so a partial
//! failure cannot leave a user without a cart.

use std::sync::Arc;

use sea_query::{Expr, Order, PostgresQueryBuilder, Query};
use sqlx::{FromRow, PgPool, Row};
use tracing::{debug, info};

use crate::auth::CredentialHasher;
use crate::error::{map_insert_err, Result, StoreError};
use crate::fields::{build_set_clause, FieldUpdates, SqlValue};
use crate::models::{NewUser, User};
use crate::schema::Users;

/// Columns returned for every user projection. The password hash is never
/// projected.
const USER_COLUMNS: &str = "username, first_name, last_name, email, is_admin, created_at";

/// Logical field -> physical column allow-list for partial updates.
///
/// `password` is a credential on this path, not an updatable column, and
/// `username`/`email` are immutable through it.
const UPDATABLE: &[(&str, &str)] = &[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
];

/// Repository for user rows.
#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserRepo {
    pub fn new(pool: PgPool, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { pool, hasher }
    }

    /// Check a username/password pair and return the user on success.
    ///
    /// A missing user and a wrong password are indistinguishable to the
    /// caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS}, password FROM users WHERE username = $1");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(StoreError::Unauthorized("invalid username/password".into()));
        };

        let stored: String = row.get("password");
        if !self.hasher.verify(password, &stored)? {
            return Err(StoreError::Unauthorized("invalid username/password".into()));
        }

        Ok(User::from_row(&row)?)
    }

    /// Register a user and create its cart, atomically.
    pub async fn create(&self, new: NewUser) -> Result<User> {
        let precheck = Query::select()
            .column(Users::Username)
            .from(Users::Table)
            .and_where(Expr::col(Users::Username).eq(new.username.as_str()))
            .to_string(PostgresQueryBuilder);

        if sqlx::query(&precheck)
            .fetch_optional(&self.pool)
            .await?
            .is_some()
        {
            return Err(StoreError::duplicate("user", &new.username));
        }

        let hashed = self.hasher.hash(&new.password)?;

        let mut tx = self.pool.begin().await?;

        let insert = format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&insert)
            .bind(&new.username)
            .bind(&hashed)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(new.is_admin)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_insert_err(e, "user", &new.username))?;

        sqlx::query("INSERT INTO carts (username) VALUES ($1)")
            .bind(&new.username)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_insert_err(e, "cart", &new.username))?;

        tx.commit().await?;

        info!(username = %user.username, "registered user");
        Ok(user)
    }

    /// All users, ordered by username.
    pub async fn find_all(&self) -> Result<Vec<User>> {
        let sql = Query::select()
            .columns([
                Users::Username,
                Users::FirstName,
                Users::LastName,
                Users::Email,
                Users::IsAdmin,
                Users::CreatedAt,
            ])
            .from(Users::Table)
            .order_by(Users::Username, Order::Asc)
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get(&self, username: &str) -> Result<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", username))
    }

    /// Apply a partial update gated by the caller's current password.
    ///
    /// `updates` must carry a `password` field matching the stored hash; it
    /// authorizes the change and is stripped before the `SET` clause is
    /// built (password rotation is a separate concern, not this path).
    /// `isAdmin`, when present, is coerced to a strict boolean.
    pub async fn update(&self, username: &str, mut updates: FieldUpdates) -> Result<User> {
        let supplied = take_credential(&mut updates)?;

        let row = sqlx::query("SELECT password FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", username))?;
        let stored: String = row.get("password");
        check_credential(self.hasher.as_ref(), &supplied, &stored)?;

        coerce_is_admin(&mut updates);

        let set = build_set_clause(&updates, UPDATABLE)?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {USER_COLUMNS}",
            set.fragment,
            set.next_index()
        );

        let mut query = sqlx::query_as::<_, User>(&sql);
        for value in set.binds {
            query = query.bind(value);
        }

        let updated = query
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", username))?;

        debug!(username, "updated user");
        Ok(updated)
    }

    pub async fn remove(&self, username: &str) -> Result<()> {
        let sql = Query::delete()
            .from_table(Users::Table)
            .and_where(Expr::col(Users::Username).eq(username))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", username));
        }

        info!(username, "removed user");
        Ok(())
    }
}

/// Pull the authorizing `password` credential out of the update set.
fn take_credential(updates: &mut FieldUpdates) -> Result<String> {
    match updates.remove("password") {
        Some(SqlValue::Text(password)) => Ok(password),
        Some(_) => Err(StoreError::InvalidUpdate("password must be a string".into())),
        None => Err(StoreError::InvalidUpdate(
            "password required to make updates".into(),
        )),
    }
}

fn check_credential(
    hasher: &dyn CredentialHasher,
    supplied: &str,
    stored_hash: &str,
) -> Result<()> {
    if hasher.verify(supplied, stored_hash)? {
        Ok(())
    } else {
        Err(StoreError::Unauthorized("invalid password".into()))
    }
}

/// Coerce a pending `isAdmin` value to a strict boolean, in place.
fn coerce_is_admin(updates: &mut FieldUpdates) {
    if let Some(value) = updates.get("isAdmin") {
        let as_bool = value.truthy();
        updates.insert("isAdmin", SqlValue::Bool(as_bool));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Equality-based hasher so tests do not pay Argon2 cost.
    struct PlainHasher;

    impl CredentialHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String> {
            Ok(format!("plain:{password}"))
        }

        fn verify(&self, password: &str, stored_hash: &str) -> Result<bool> {
            Ok(stored_hash == format!("plain:{password}"))
        }
    }

    #[test]
    fn test_update_without_password_is_invalid() {
        let mut updates = FieldUpdates::new().set("firstName", "X");
        let err = take_credential(&mut updates).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUpdate);
    }

    #[test]
    fn test_credential_is_stripped_from_updates() {
        let mut updates = FieldUpdates::new()
            .set("password", "hunter2")
            .set("firstName", "X");
        let supplied = take_credential(&mut updates).unwrap();
        assert_eq!(supplied, "hunter2");
        assert!(!updates.contains("password"));
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn test_non_text_credential_is_invalid() {
        let mut updates = FieldUpdates::new().set("password", 42);
        let err = take_credential(&mut updates).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUpdate);
    }

    #[test]
    fn test_wrong_password_is_unauthorized() {
        let stored = PlainHasher.hash("hunter2").unwrap();
        let err = check_credential(&PlainHasher, "wrong", &stored).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(check_credential(&PlainHasher, "hunter2", &stored).is_ok());
    }

    #[test]
    fn test_is_admin_string_persists_as_boolean() {
        let mut updates = FieldUpdates::new()
            .set("firstName", "X")
            .set("isAdmin", "true");
        coerce_is_admin(&mut updates);
        assert_eq!(updates.get("isAdmin"), Some(&SqlValue::Bool(true)));

        // coercion keeps the field's position
        let set = build_set_clause(&updates, UPDATABLE).unwrap();
        assert_eq!(set.fragment, "\"first_name\" = $1, \"is_admin\" = $2");
        assert_eq!(set.binds[1], SqlValue::Bool(true));
    }

    #[test]
    fn test_update_statement_places_key_after_binds() {
        let mut updates = FieldUpdates::new()
            .set("password", "hunter2")
            .set("firstName", "X")
            .set("lastName", "Y");
        take_credential(&mut updates).unwrap();
        let set = build_set_clause(&updates, UPDATABLE).unwrap();
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {USER_COLUMNS}",
            set.fragment,
            set.next_index()
        );
        assert!(sql.contains("\"first_name\" = $1, \"last_name\" = $2"));
        assert!(sql.contains("WHERE username = $3"));
    }

    #[test]
    fn test_password_is_not_an_updatable_column() {
        // even if a second password-like field sneaks past the credential
        // strip, the allow-list rejects it
        let updates = FieldUpdates::new().set("password", "x");
        assert!(build_set_clause(&updates, UPDATABLE).is_err());
    }
}
