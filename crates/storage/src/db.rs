use chrono::{DateTime, SecondsFormat, Utc};
use salesreport_core::{DistributionRecord, ReportingPeriod};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    tracing::debug!(path = %path.display(), "distribution log ready");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS distributions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            report_path TEXT NOT NULL,
            stored_path TEXT NOT NULL UNIQUE,
            destination TEXT NOT NULL,
            sender TEXT NOT NULL,
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            sent_at TEXT NOT NULL,
            source_month TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only: rows may be added but never changed or removed.
    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS distributions_no_update
        BEFORE UPDATE ON distributions
        BEGIN
            SELECT RAISE(ABORT, 'distribution log is append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS distributions_no_delete
        BEFORE DELETE ON distributions
        BEGIN
            SELECT RAISE(ABORT, 'distribution log is append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// A distribution about to be logged; the database assigns the id.
#[derive(Debug, Clone)]
pub struct NewDistribution {
    pub report_path: PathBuf,
    pub stored_path: PathBuf,
    pub destination: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub source_month: ReportingPeriod,
}

pub async fn insert_distribution(
    pool: &DbPool,
    entry: NewDistribution,
) -> Result<DistributionRecord, StorageError> {
    let result = sqlx::query(
        "INSERT INTO distributions (report_path, stored_path, destination, sender, subject, body, sent_at, source_month) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(entry.report_path.to_string_lossy().into_owned())
    .bind(entry.stored_path.to_string_lossy().into_owned())
    .bind(&entry.destination)
    .bind(&entry.sender)
    .bind(&entry.subject)
    .bind(&entry.body)
    .bind(entry.sent_at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    .bind(entry.source_month.to_string())
    .execute(pool)
    .await?;

    Ok(DistributionRecord {
        id: result.last_insert_rowid(),
        report_path: entry.report_path,
        stored_path: entry.stored_path,
        destination: entry.destination,
        sender: entry.sender,
        subject: entry.subject,
        body: entry.body,
        sent_at: entry.sent_at,
        source_month: entry.source_month,
    })
}

type DistributionRow = (i64, String, String, String, String, String, String, String, String);

/// Every logged distribution, oldest first.
pub async fn list_distributions(pool: &DbPool) -> Result<Vec<DistributionRecord>, StorageError> {
    let rows = sqlx::query_as::<_, DistributionRow>(
        "SELECT id, report_path, stored_path, destination, sender, subject, body, sent_at, source_month FROM distributions ORDER BY id"
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_record).collect()
}

fn row_to_record(r: DistributionRow) -> Result<DistributionRecord, StorageError> {
    let id = r.0;
    let sent_at = DateTime::parse_from_rfc3339(&r.7)
        .map_err(|e| StorageError::Corrupt {
            id,
            reason: format!("sent_at '{}': {e}", r.7),
        })?
        .with_timezone(&Utc);
    let source_month: ReportingPeriod = r.8.parse().map_err(|e| StorageError::Corrupt {
        id,
        reason: format!("{e}"),
    })?;

    Ok(DistributionRecord {
        id,
        report_path: PathBuf::from(r.1),
        stored_path: PathBuf::from(r.2),
        destination: r.3,
        sender: r.4,
        subject: r.5,
        body: r.6,
        sent_at,
        source_month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(n: u32) -> NewDistribution {
        NewDistribution {
            report_path: PathBuf::from("/reports/sales_report_2024-01.pdf"),
            stored_path: PathBuf::from(format!("/outbox/{n}_sales_report_2024-01.pdf")),
            destination: "boss@example.com".into(),
            sender: "reports@example.com".into(),
            subject: "Monthly Sales Report".into(),
            body: "Please find attached.".into(),
            sent_at: Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, n).unwrap(),
            source_month: ReportingPeriod::new(2024, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn creates_database_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("distribution.db");
        let _pool = create_db(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn appends_and_lists_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("log.db")).await.unwrap();

        let first = insert_distribution(&pool, entry(1)).await.unwrap();
        let second = insert_distribution(&pool, entry(2)).await.unwrap();
        assert!(second.id > first.id);

        let listed = list_distributions(&pool).await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn empty_log_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("log.db")).await.unwrap();
        assert!(list_distributions(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rows_cannot_be_modified() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("log.db")).await.unwrap();
        insert_distribution(&pool, entry(1)).await.unwrap();

        assert!(sqlx::query("UPDATE distributions SET destination = 'x'")
            .execute(&pool)
            .await
            .is_err());
        assert!(sqlx::query("DELETE FROM distributions").execute(&pool).await.is_err());
        assert_eq!(list_distributions(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reopening_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.db");
        {
            let pool = create_db(&path).await.unwrap();
            insert_distribution(&pool, entry(1)).await.unwrap();
            pool.close().await;
        }
        let pool = create_db(&path).await.unwrap();
        assert_eq!(list_distributions(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_stored_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("log.db")).await.unwrap();
        insert_distribution(&pool, entry(1)).await.unwrap();
        let err = insert_distribution(&pool, entry(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::Database(_)));
        assert_eq!(err.kind(), salesreport_core::ErrorKind::StorageError);
    }
}
