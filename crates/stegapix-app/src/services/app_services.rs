// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — resolves the data directory, loads settings, and
// builds the concrete search, fetch, store and publish backends the CLI
// commands run on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use stegapix_core::AppConfig;
use stegapix_core::config::PublishConfig;
use stegapix_core::error::Result;
use stegapix_core::types::{PublishedArtifact, SearchCursor};
use stegapix_publish::{
    Announcer, DirectoryPublisher, HostAndAnnounce, ImgurHost, LogAnnouncer, Publisher,
    WebhookAnnouncer,
};
use stegapix_search::{GoogleImageSearch, HttpFetcher};
use stegapix_store::SqliteStore;

use super::data_dir;
use super::orchestrator::Orchestrator;
use super::settings;

/// SQLite database filename inside the data directory.
const DB_FILE: &str = "stegapix.db";

/// What `status` prints.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub seen_urls: u64,
    pub cursors: Vec<SearchCursor>,
    pub recent_artifacts: Vec<PublishedArtifact>,
}

/// Settings plus where they and the database live.
pub struct AppServices {
    data_dir: PathBuf,
    config_path: PathBuf,
    config: AppConfig,
}

impl AppServices {
    /// Resolve directories and load the config. Call once per command.
    pub fn init(data_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let dir = data_dir::data_dir(data_dir)?;
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| settings::default_config_path(&dir));
        let config = settings::load_config(&config_path)?;
        info!(data_dir = %dir.display(), config = %config_path.display(), "services initialised");
        Ok(Self {
            data_dir: dir,
            config_path,
            config,
        })
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(self.data_dir.join(DB_FILE))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.http_timeout_secs)
    }

    /// Build the publisher selected by `publish.mode`.
    pub fn build_publisher(&self) -> Result<Box<dyn Publisher>> {
        match &self.config.publish {
            PublishConfig::Directory { path } => {
                let dir = if path.is_absolute() {
                    path.clone()
                } else {
                    self.data_dir.join(path)
                };
                Ok(Box::new(DirectoryPublisher::new(dir)?))
            }
            PublishConfig::Imgur {
                client_id,
                endpoint,
                announce_webhook,
            } => {
                let host = ImgurHost::new(endpoint, client_id, self.timeout())?;
                let announcer: Box<dyn Announcer> = match announce_webhook {
                    Some(url) => Box::new(WebhookAnnouncer::new(url, self.timeout())?),
                    None => Box::new(LogAnnouncer),
                };
                Ok(Box::new(HostAndAnnounce::new(host, announcer)))
            }
        }
    }

    /// Run one publishing cycle against the real backends.
    pub fn run_cycle(&self) -> Result<PublishedArtifact> {
        self.config.validate()?;
        let search = GoogleImageSearch::new(self.config.search.clone(), self.timeout())?;
        let fetcher = HttpFetcher::new(self.timeout())?;
        let publisher = self.build_publisher()?;
        let work_dir = data_dir::data_subdir(&self.data_dir, "work")?;

        let orchestrator = Orchestrator::new(
            &self.config,
            work_dir,
            search,
            fetcher,
            self.open_store()?,
            publisher,
        )?;
        orchestrator.run_one_publishing_cycle()
    }

    /// Summarise what the store holds.
    pub fn status(&self, limit: u32) -> Result<StatusReport> {
        let store = self.open_store()?;
        Ok(StatusReport {
            data_dir: self.data_dir.clone(),
            config_path: self.config_path.clone(),
            seen_urls: store.seen_count()?,
            cursors: store.cursors()?,
            recent_artifacts: store.recent_artifacts(limit)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use stegapix_store::DuplicateStore;

    use super::*;

    #[test]
    fn init_uses_defaults_without_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let services = AppServices::init(Some(tmp.path()), None).unwrap();
        assert_eq!(services.config_path, tmp.path().join("stegapix.json"));
        assert_eq!(services.config.lsb_bits, 2);
    }

    #[test]
    fn directory_publisher_resolves_against_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let services = AppServices::init(Some(tmp.path()), None).unwrap();
        let publisher = services.build_publisher().unwrap();

        let id = publisher.publish(b"bytes").unwrap();
        assert!(tmp.path().join("published").join(format!("{id}.png")).is_file());
    }

    #[test]
    fn imgur_without_client_id_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut services = AppServices::init(Some(tmp.path()), None).unwrap();
        services.config_mut().publish = PublishConfig::Imgur {
            client_id: String::new(),
            endpoint: "https://api.imgur.com".into(),
            announce_webhook: None,
        };
        assert!(services.build_publisher().is_err());
    }

    #[test]
    fn status_report_serializes() {
        let tmp = tempfile::tempdir().unwrap();
        let services = AppServices::init(Some(tmp.path()), None).unwrap();
        let json = serde_json::to_value(services.status(1).unwrap()).unwrap();
        assert_eq!(json["seen_urls"], 0);
        assert!(json["cursors"].as_array().unwrap().is_empty());
        assert!(json["recent_artifacts"].as_array().unwrap().is_empty());
    }

    #[test]
    fn status_reports_store_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let services = AppServices::init(Some(tmp.path()), None).unwrap();
        {
            let store = services.open_store().unwrap();
            store.mark_seen(&["a", "b"]).unwrap();
            store.set_cursor("snow", 4).unwrap();
        }
        let report = services.status(5).unwrap();
        assert_eq!(report.seen_urls, 2);
        assert_eq!(report.config_path, tmp.path().join("stegapix.json"));
        assert_eq!(report.cursors, vec![SearchCursor::at("snow", 4)]);
        assert!(report.recent_artifacts.is_empty());
    }
}
