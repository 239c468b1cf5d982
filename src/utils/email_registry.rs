//! Fast "is this email registered?" lookups in front of the `users` table.
//!
//! A cuckoo filter answers the common negative case without touching the
//! database; a moka cache remembers recently seen addresses as taken.
//! Anything the filter cannot rule out falls through to SQL.

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{info, warn};

const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMAIL_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

static TAKEN_CACHE: Lazy<Cache<String, ()>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86_400))
        .build()
});

pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn filter_might_contain(email: &String) -> bool {
    match EMAIL_FILTER.read() {
        Ok(filter) => filter.contains(email),
        // a poisoned filter cannot rule anything out
        Err(_) => true,
    }
}

fn filter_add(emails: &[String]) {
    match EMAIL_FILTER.write() {
        Ok(mut filter) => {
            for email in emails {
                filter.add(email);
            }
        }
        Err(_) => warn!("Email filter lock poisoned, skipping insert"),
    }
}

/// Record a freshly registered address.
pub async fn mark_taken(email: &str) {
    let email = normalize(email);
    filter_add(std::slice::from_ref(&email));
    TAKEN_CACHE.insert(email, ()).await;
}

/// true => the address is free to register
pub async fn is_available(email: &str, pool: &MySqlPool) -> Result<bool, sqlx::Error> {
    let email = normalize(email);

    if !filter_might_contain(&email) {
        return Ok(true);
    }

    if TAKEN_CACHE.contains_key(&email) {
        return Ok(false);
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(pool)
        .await?
        > 0;

    if exists {
        TAKEN_CACHE.insert(email, ()).await;
    }

    Ok(!exists)
}

/// Stream every registered email into the filter, in batches.
pub async fn warmup(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
        batch.push(normalize(&email));
        total += 1;

        if batch.len() == batch_size {
            filter_add(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        filter_add(&batch);
    }

    info!(total, "Email registry warmup complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize("  Asha@Example.COM "), "asha@example.com");
    }

    #[actix_web::test]
    async fn marked_addresses_are_remembered() {
        mark_taken("Registry.Test@Example.com").await;
        assert!(filter_might_contain(&"registry.test@example.com".to_string()));
        assert!(TAKEN_CACHE.contains_key("registry.test@example.com"));
    }
}
