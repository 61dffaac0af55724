use std::sync::Arc;

use anyhow::Context;
use compozy_config::CompozyConfig;
use compozy_core::events::WorkflowEvent;
use compozy_db::events::RecordingListener;
use compozy_db::service::WorkflowService;

use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: WorkflowService,
    pub config: CompozyConfig,
    actor: Option<String>,
    recorder: Option<Arc<RecordingListener>>,
}

impl AppContext {
    /// Open the configured store and attach the listeners requested by flags.
    pub async fn init(config: CompozyConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let mut service = WorkflowService::from_config(&config)
            .await
            .context("failed to initialize compozy-db service")?;

        let recorder = if flags.show_events {
            let recorder = Arc::new(RecordingListener::named("cli"));
            service.subscribe(recorder.clone());
            Some(recorder)
        } else {
            None
        };

        let actor = flags
            .actor
            .as_deref()
            .map(str::trim)
            .filter(|actor| !actor.is_empty())
            .or_else(|| config.general.actor())
            .map(String::from);

        Ok(Self {
            service,
            config,
            actor,
            recorder,
        })
    }

    /// Acting user: `--actor`, then `general.default_actor`.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Events captured during this invocation. Empty without `--show-events`.
    #[must_use]
    pub fn recorded_events(&self) -> Vec<WorkflowEvent> {
        self.recorder
            .as_ref()
            .map(|recorder| recorder.events())
            .unwrap_or_default()
    }

    /// Print captured events to stderr, one JSON object per line.
    pub fn flush_events(&self) -> anyhow::Result<()> {
        for event in self.recorded_events() {
            eprintln!("{}", serde_json::to_string(&event)?);
        }
        Ok(())
    }
}
