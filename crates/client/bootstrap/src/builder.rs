//! Builds the runtime, sources and diagnostics used by hosts.
use std::sync::Arc;

use anyhow::{Context, Result};
use runtime::{ContestantSource, Runtime, TransitionLog};

use crate::config::ClientConfig;
use crate::roster::RosterSource;
use crate::settings::FileSettings;

/// Builder that assembles a runtime from a [`ClientConfig`].
pub struct SessionBuilder {
    config: ClientConfig,
    source: Option<Arc<dyn ContestantSource>>,
}

impl SessionBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            source: None,
        }
    }

    /// Provide a custom contestant source instead of the roster.
    pub fn contestant_source(mut self, source: impl ContestantSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub async fn build(self) -> Result<SessionSetup> {
        let source = match self.source {
            Some(source) => source,
            None => Arc::new(self.roster()?),
        };

        let settings = match &self.config.settings_path {
            Some(path) => FileSettings::new(path),
            None => FileSettings::none(),
        };
        tracing::info!(
            settings = ?settings.path(),
            auto_select = %self.config.auto_select,
            "building battle runtime"
        );

        let log = Arc::new(TransitionLog::new());
        let runtime = Runtime::builder()
            .config(self.config.to_runtime_config())
            .shared_contestant_source(source)
            .settings(settings)
            .diagnostics(log.clone())
            .build()
            .await
            .context("failed to build battle runtime")?;

        Ok(SessionSetup {
            config: self.config,
            runtime,
            log,
        })
    }

    fn roster(&self) -> Result<RosterSource> {
        let roster = match &self.config.roster_path {
            Some(path) => RosterSource::from_file(path, self.config.seed)?,
            None => RosterSource::builtin(self.config.seed)?,
        };
        tracing::debug!(cards = roster.len(), "roster loaded");
        Ok(roster)
    }
}

pub struct SessionSetup {
    pub config: ClientConfig,
    pub runtime: Runtime,
    pub log: Arc<TransitionLog>,
}
