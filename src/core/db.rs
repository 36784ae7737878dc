use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::core::errors::ApiError;

/// Opens (creating if needed) the shared SQLite database.
pub async fn connect_sqlite(db_path: &Path) -> Result<SqlitePool, ApiError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| {
            ApiError::internal(format!(
                "Failed to open database {}: {}",
                db_path.display(),
                e
            ))
        })
}

/// Fixed-width RFC 3339 so that text ordering in SQL is chronological.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::internal(format!("Invalid stored timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
pub(crate) async fn temp_pool() -> SqlitePool {
    let tmp = std::env::temp_dir().join(format!("docent-test-{}.db", uuid::Uuid::new_v4()));
    connect_sqlite(&tmp).await.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexicographically() {
        let earlier = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(parse_timestamp(&format_timestamp(later)).unwrap(), later);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
