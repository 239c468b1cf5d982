use crate::{auth::password::hash_password, config::Config, model::role::Role};
use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::{error, info};

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Creates the configured admin account on first start.
/// Errors are logged, never fatal.
pub async fn bootstrap_admin(pool: &MySqlPool, config: &Config) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return;
    };

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await;

    match existing {
        Ok(n) if n > 0 => return,
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Admin bootstrap lookup failed");
            return;
        }
    }

    let hashed = match hash_password(password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Admin bootstrap could not hash password");
            return;
        }
    };

    let result = sqlx::query("INSERT INTO users (role, name, email, password_hash) VALUES (?, ?, ?, ?)")
        .bind(Role::Admin.as_ref())
        .bind(&config.admin_name)
        .bind(email)
        .bind(hashed)
        .execute(pool)
        .await;

    match result {
        Ok(_) => info!(email = %email, "Bootstrap admin created"),
        Err(e) => error!(error = %e, "Admin bootstrap insert failed"),
    }
}
