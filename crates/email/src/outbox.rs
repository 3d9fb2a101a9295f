use chrono::{DateTime, Utc};
use salesreport_core::digest::{sha256_bytes, to_hex};
use salesreport_core::{DistributionRecord, MailSettings, Report};
use salesreport_storage::{
    create_db, insert_distribution, list_distributions, DbPool, NewDistribution, StorageError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata written beside each outbox copy, readable without the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: String,
    pub sent_at: DateTime<Utc>,
    pub source_month: String,
    pub sha256: String,
}

pub struct SimulatedMailer {
    pool: DbPool,
    sent_dir: PathBuf,
    mail: MailSettings,
}

impl SimulatedMailer {
    pub fn new(pool: DbPool, sent_dir: impl Into<PathBuf>, mail: MailSettings) -> Self {
        Self {
            pool,
            sent_dir: sent_dir.into(),
            mail,
        }
    }

    /// Open (or create) the distribution log at `database`.
    pub async fn open(
        database: &Path,
        sent_dir: impl Into<PathBuf>,
        mail: MailSettings,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(create_db(database).await?, sent_dir, mail))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn sent_dir(&self) -> &Path {
        &self.sent_dir
    }

    /// Copy the report into the outbox, then append a log row. Either both
    /// happen or neither is left behind.
    pub async fn send(&self, report: &Report) -> Result<DistributionRecord, StorageError> {
        if !tokio::fs::try_exists(&report.path).await.unwrap_or(false) {
            return Err(StorageError::MissingReport(report.path.clone()));
        }
        tokio::fs::create_dir_all(&self.sent_dir)
            .await
            .map_err(|e| StorageError::io(&self.sent_dir, e))?;

        let sent_at = Utc::now();
        let stored_name = format!(
            "{}_{}_{}",
            sent_at.format("%Y-%m-%d_%H-%M-%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8],
            report.file_name()
        );
        let stored_path = self.sent_dir.join(&stored_name);
        let envelope_path = stored_path.with_extension("json");

        let copied = self
            .stage_copy(report, &stored_path, &envelope_path, &stored_name, sent_at)
            .await;
        if let Err(e) = copied {
            discard(&[stored_path.as_path(), envelope_path.as_path()]).await;
            return Err(e);
        }

        let entry = NewDistribution {
            report_path: report.path.clone(),
            stored_path: stored_path.clone(),
            destination: self.mail.recipient.clone(),
            sender: self.mail.sender.clone(),
            subject: self.mail.subject.clone(),
            body: self.mail.body.clone(),
            sent_at,
            source_month: report.period,
        };
        match insert_distribution(&self.pool, entry).await {
            Ok(record) => {
                tracing::info!(
                    id = record.id,
                    to = %record.destination,
                    stored = %stored_path.display(),
                    "report sent"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "distribution log append failed, removing outbox copy");
                discard(&[stored_path.as_path(), envelope_path.as_path()]).await;
                Err(e)
            }
        }
    }

    async fn stage_copy(
        &self,
        report: &Report,
        stored_path: &Path,
        envelope_path: &Path,
        stored_name: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        tokio::fs::copy(&report.path, stored_path)
            .await
            .map_err(|e| StorageError::io(stored_path, e))?;

        let copy = tokio::fs::read(stored_path)
            .await
            .map_err(|e| StorageError::io(stored_path, e))?;
        let digest = to_hex(&sha256_bytes(&copy));
        if !report.sha256.is_empty() && digest != report.sha256 {
            return Err(StorageError::CopyMismatch(report.path.clone()));
        }

        let envelope = Envelope {
            from: self.mail.sender.clone(),
            to: self.mail.recipient.clone(),
            subject: self.mail.subject.clone(),
            body: self.mail.body.clone(),
            attachment: stored_name.to_string(),
            sent_at,
            source_month: report.period.to_string(),
            sha256: digest,
        };
        let json = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| StorageError::io(envelope_path, std::io::Error::other(e)))?;
        tokio::fs::write(envelope_path, json)
            .await
            .map_err(|e| StorageError::io(envelope_path, e))
    }

    pub async fn list_sent(&self) -> Result<Vec<DistributionRecord>, StorageError> {
        list_distributions(&self.pool).await
    }
}

async fn discard(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "could not remove outbox file");
            }
        }
    }
}
