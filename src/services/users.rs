use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::user::User};

/// Minimal identities for people a trip is shared with, keyed by email.
#[derive(Clone)]
pub struct UserDirectory {
    db: DbPool,
}

impl UserDirectory {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, uuid, email, display_name, created_at FROM users WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Returns the user registered under `email`, creating one if needed.
    /// `email` must already be normalised.
    pub async fn resolve_or_create(&self, email: &str) -> Result<User, AppError> {
        if let Some(user) = self.find_by_email(email).await? {
            return Ok(user);
        }
        let uuid = Uuid::new_v4().to_string();
        let display_name = email.split('@').next().unwrap_or(email).to_string();
        let inserted = sqlx::query(
            r#"INSERT INTO users (uuid, email, display_name, created_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(email) DO NOTHING"#,
        )
        .bind(&uuid)
        .bind(email)
        .bind(&display_name)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        if inserted.rows_affected() > 0 {
            info!("created user {uuid} for {email}");
        }
        self.find_by_email(email).await?.ok_or(AppError::NotFound)
    }
}

/// Trims and lower-cases an email address, rejecting obviously malformed ones.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AppError::Validation(format!("invalid email address {raw:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_validates_emails() {
        assert_eq!(normalize_email("  A@X.com ").unwrap(), "a@x.com");
        for bad in ["", "nobody", "a@b", "@x.com", "a@@x.com", "a b@x.com", "a@x."] {
            assert!(normalize_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
