//! Application entry point — Read For Me.
//!
//! # Startup sequence
//!
//! 1. Parse the command line.
//! 2. Initialise logging.
//! 3. Load [`AppConfig`] from disk (default on first run), then apply
//!    environment and `.env` overrides.
//! 4. `serve` runs the proxy; every other command opens client storage and
//!    talks to the proxy (or directly to the hosted endpoints when a user
//!    key is set).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use read_for_me::{
    app::{render, status_line, write_audio},
    backend::{ApiConnector, ProxyBackend},
    cli::{CliArgs, Command, KeyAction},
    config::{AppConfig, AppPaths},
    payload::ResultPayload,
    pipeline::{new_shared_state, Orchestrator, SubmitError},
    server,
    share::SharePayload,
    store::{JsonFileStore, KeyValueStore},
};

// ---------------------------------------------------------------------------
// Client commands
// ---------------------------------------------------------------------------

struct Client {
    config: AppConfig,
    proxy: Arc<ProxyBackend>,
    orchestrator: Orchestrator,
}

impl Client {
    fn open(config: AppConfig) -> Result<Self> {
        let paths = AppPaths::new();
        let store: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileStore::open(&paths.storage_file)
                .with_context(|| format!("failed to open {}", paths.storage_file.display()))?,
        );
        let proxy = Arc::new(ProxyBackend::from_config(&config.service));
        let orchestrator = Orchestrator::new(
            new_shared_state(),
            store,
            config.budget.ceiling,
            proxy.clone(),
            Arc::new(ApiConnector::new(&config)),
        );
        Ok(Self {
            config,
            proxy,
            orchestrator,
        })
    }

    fn share_link(&self, id: &str) -> String {
        format!("{}/s/{id}", self.config.service.base_url.trim_end_matches('/'))
    }

    async fn share(&self, payload: &ResultPayload) -> Result<()> {
        let id = self
            .proxy
            .save_share(&SharePayload::from(payload))
            .await
            .context("failed to save share")?;
        println!("share: {}", self.share_link(&id));
        Ok(())
    }

    async fn convert(
        &self,
        text: &str,
        audio: Option<&std::path::Path>,
        share: bool,
    ) -> Result<()> {
        let payload = match self.orchestrator.submit(text).await {
            Ok(payload) => payload,
            Err(e) => {
                if e == SubmitError::QuotaExceeded || e == SubmitError::InvalidCredential {
                    eprintln!("hint: read-for-me key set <your-api-key>");
                }
                bail!(e);
            }
        };

        // Let a cache hit finish fetching its audio before reporting.
        self.orchestrator.wait_for_background().await;
        let state = self.orchestrator.state();
        let (payload, status) = {
            let st = state.lock().unwrap();
            (st.current.clone().unwrap_or(payload), status_line(&st))
        };
        log::debug!("pipeline: {status}");

        print!("{}", render(&payload));

        if let Some(path) = audio {
            if write_audio(&payload, path)? {
                println!("audio saved to {}", path.display());
            } else {
                eprintln!("no audio to save");
            }
        }
        if share {
            self.share(&payload).await?;
        }
        Ok(())
    }

    async fn share_cached(&self, text: &str) -> Result<()> {
        let Some(payload) = self.orchestrator.cache().get(text.trim()) else {
            bail!("no cached result for that text; run `read-for-me convert` first");
        };
        self.share(&payload).await
    }

    async fn share_load(&self, id: &str) -> Result<()> {
        match self.proxy.load_share(id).await? {
            Some(share) => print!("{}", render(&ResultPayload::from(share))),
            None => bail!("Share not found."),
        }
        Ok(())
    }

    fn key(&self, action: KeyAction) -> Result<()> {
        match action {
            KeyAction::Set { key } => {
                self.orchestrator.set_credential(&key)?;
                println!("API key saved; requests now go direct.");
            }
            KeyAction::Clear => {
                self.orchestrator.clear_credential()?;
                println!("API key cleared.");
            }
        }
        Ok(())
    }

    fn usage(&self, reset: bool) {
        let budget = self.orchestrator.budget();
        if reset {
            budget.reset();
        }
        println!(
            "service usage: {} / {} tokens ({} remaining){}",
            budget.used(),
            budget.ceiling(),
            budget.remaining(),
            if self.orchestrator.has_credential() {
                "; own key set, not counted"
            } else {
                ""
            }
        );
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // 1. Logging
    let filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    // 2. Configuration
    let loaded = match &args.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let config = loaded
        .unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        })
        .with_env(Some(args.env_file.as_path()));

    // 3. Commands
    match args.command {
        Command::Serve => server::serve(&config).await,
        Command::Convert { text, audio, share } => {
            Client::open(config)?
                .convert(&text, audio.as_deref(), share)
                .await
        }
        Command::ShareSave { text } => Client::open(config)?.share_cached(&text).await,
        Command::ShareLoad { id } => Client::open(config)?.share_load(&id).await,
        Command::Key { action } => Client::open(config)?.key(action),
        Command::Usage { reset } => {
            Client::open(config)?.usage(reset);
            Ok(())
        }
    }
}
