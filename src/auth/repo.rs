use sqlx::PgPool;
use uuid::Uuid;

pub use crate::auth::repo_types::User;

impl User {
    /// Find a user by email. No side effects.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, otp, otp_verified, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create an unverified user with hashed password and issued code.
    ///
    /// Returns the raw `sqlx::Error` so callers can map a unique violation
    /// on `email` to a duplicate-registration failure. The constraint, not
    /// the caller's pre-check, is what settles a concurrent race.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        otp: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, otp, otp_verified)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, name, email, password_hash, otp, otp_verified, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(otp)
        .fetch_one(db)
        .await
    }

    /// Flip `otp_verified` to true. The flow never flips it back.
    pub async fn mark_verified(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET otp_verified = TRUE WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// True when the error is the `users.email` unique constraint firing.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
