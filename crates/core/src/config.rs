use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Envelope fields attached to every simulated send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            sender: "reports@example.com".to_string(),
            recipient: "boss@example.com".to_string(),
            subject: "Monthly Sales Report".to_string(),
            body: "Please find attached.".to_string(),
        }
    }
}

/// Where a pipeline instance reads and writes. Every path is explicit so two
/// instances pointed at different roots never share state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Input samples offered by `samples`.
    pub samples_dir: PathBuf,
    pub reports_dir: PathBuf,
    /// Outbox holding copies of "sent" reports.
    pub sent_dir: PathBuf,
    /// SQLite file backing the distribution log.
    pub database: PathBuf,
    pub mail: MailSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            samples_dir: PathBuf::from("sample_data"),
            reports_dir: PathBuf::from("generated_reports"),
            sent_dir: PathBuf::from("sent_emails"),
            database: PathBuf::from("distribution.db"),
            mail: MailSettings::default(),
        }
    }
}

impl Settings {
    /// Default layout rooted at `data_dir`.
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Settings::default().resolved_against(data_dir)
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// Read a TOML file; relative paths inside it resolve against `data_dir`.
    pub fn load(path: &Path, data_dir: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Settings::from_toml(&content)?.resolved_against(data_dir))
    }

    pub fn resolved_against(mut self, root: &Path) -> Self {
        for p in [
            &mut self.samples_dir,
            &mut self.reports_dir,
            &mut self.sent_dir,
            &mut self.database,
        ] {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_under_data_dir() {
        let s = Settings::for_data_dir(Path::new("/data"));
        assert_eq!(s.reports_dir, PathBuf::from("/data/generated_reports"));
        assert_eq!(s.sent_dir, PathBuf::from("/data/sent_emails"));
        assert_eq!(s.database, PathBuf::from("/data/distribution.db"));
        assert_eq!(s.mail.recipient, "boss@example.com");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let s = Settings::from_toml(
            r#"
            reports_dir = "/srv/reports"

            [mail]
            recipient = "sales@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(s.reports_dir, PathBuf::from("/srv/reports"));
        assert_eq!(s.sent_dir, PathBuf::from("sent_emails"));
        assert_eq!(s.mail.recipient, "sales@example.com");
        assert_eq!(s.mail.subject, "Monthly Sales Report");
    }

    #[test]
    fn absolute_paths_survive_resolution() {
        let s = Settings::from_toml("reports_dir = \"/srv/reports\"")
            .unwrap()
            .resolved_against(Path::new("/data"));
        assert_eq!(s.reports_dir, PathBuf::from("/srv/reports"));
        assert_eq!(s.database, PathBuf::from("/data/distribution.db"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salesreport.toml");
        std::fs::write(&path, "sent_dir = \"outbox\"\n").unwrap();
        let s = Settings::load(&path, dir.path()).unwrap();
        assert_eq!(s.sent_dir, dir.path().join("outbox"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            Settings::from_toml("reports_dir = ["),
            Err(ConfigError::Parse(_))
        ));
    }
}
