//! Command line front end: watch one application, list launcher apps, or
//! print the stage table.

use anyhow::{Context, Result};
use applauncher::config::{StageScheme, TrackerConfig};
use applauncher::core::StageClassification;
use applauncher::events::LoggingEventSink;
use applauncher::observability::{init_tracing, LogFormat, LoggingConfig};
use applauncher::source::{ApplicationSource, HttpApplicationSource};
use applauncher::tracker::{ChannelNavigator, PollOutcome, PollingSession, ProgressViewModel};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "applauncher",
    version,
    about = "Follow application provisioning through its stages"
)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the launcher API
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Stage scheme: environment_vars or environment_json
    #[arg(long, global = true)]
    pub scheme: Option<StageScheme>,

    /// Delay between fetches, e.g. 5s or 1500ms
    #[arg(long, global = true)]
    pub poll_interval: Option<humantime::Duration>,

    /// Log filter directives; RUST_LOG is used when unset
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Follow one application until provisioning finishes
    Watch {
        /// Application GUID
        app_id: String,

        /// Print each snapshot as JSON instead of the stage listing
        #[arg(long)]
        json: bool,
    },
    /// List applications managed by the launcher
    List,
    /// Print the configured stage table
    Stages,
}

impl Cli {
    fn logging(&self) -> LoggingConfig {
        let mut logging = LoggingConfig::default();
        if let Some(level) = &self.log_level {
            logging = logging.with_level(level.clone());
        }
        if self.json_logs {
            logging = logging.with_format(LogFormat::Json);
        }
        logging
    }

    /// Resolves the configuration: file, then environment, then flags.
    fn tracker_config(&self) -> Result<TrackerConfig> {
        self.tracker_config_from(|key| std::env::var(key).ok())
    }

    fn tracker_config_from<F>(&self, env: F) -> Result<TrackerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => TrackerConfig::default(),
        };
        config = config
            .apply_env_from(env)
            .context("invalid configuration in environment")?;
        if let Some(scheme) = self.scheme {
            config = config.with_scheme(scheme);
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(interval) = self.poll_interval {
            config = config.with_poll_interval(interval.into());
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(&cli.logging()).context("failed to initialize logging")?;
    let config = Arc::new(cli.tracker_config()?);

    match cli.command {
        Command::Watch { app_id, json } => watch(config, app_id, json).await,
        Command::List => list(&config).await,
        Command::Stages => {
            print_stages(&config);
            Ok(())
        }
    }
}

async fn watch(config: Arc<TrackerConfig>, app_id: String, json: bool) -> Result<()> {
    let source = Arc::new(HttpApplicationSource::new(&config).context("invalid API URL")?);
    let (navigator, mut routes) = ChannelNavigator::channel();
    let mut session = PollingSession::builder(app_id, config, source)
        .with_navigator(Arc::new(navigator))
        .with_event_sink(Arc::new(LoggingEventSink::debug()))
        .start()
        .context("failed to start polling session")?;
    let mut view = session.view_model();

    println!("Tracking {}", session.route());
    loop {
        tokio::select! {
            changed = view.changed() => {
                if !changed {
                    break;
                }
                if json {
                    println!("{}", serde_json::to_string(&*view.snapshot())?);
                } else {
                    print_progress(&view);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                session.stop("interrupted");
                break;
            }
        }
    }

    match session.wait().await? {
        PollOutcome::Terminal => {
            if let Ok(route) = routes.try_recv() {
                println!("Provisioning finished, continue at {route}");
            }
        }
        PollOutcome::Cancelled => println!("Stopped before provisioning finished"),
    }
    Ok(())
}

async fn list(config: &TrackerConfig) -> Result<()> {
    let source = HttpApplicationSource::new(config).context("invalid API URL")?;
    let apps = source
        .list_applications()
        .await
        .context("failed to list applications")?;

    for app in apps.iter().filter(|a| a.is_launcher_app(&config.metadata_key)) {
        let state = app
            .state(&config.metadata_key, &config.state_field)
            .unwrap_or("-");
        println!("{}\t{}\t{}", app.guid, app.name, state);
    }
    Ok(())
}

fn print_stages(config: &TrackerConfig) {
    for stage in &config.stages {
        println!("{:>2}  {}", stage.ordinal, stage.name);
    }
    if let Some(marker) = &config.terminal_marker {
        println!("terminal marker: {marker}");
    }
}

fn marker(classification: StageClassification) -> &'static str {
    match classification {
        StageClassification::Completed => "[x]",
        StageClassification::Current => "[>]",
        StageClassification::Pending => "[ ]",
    }
}

fn print_progress(view: &ProgressViewModel) {
    let snapshot = view.snapshot();
    println!(
        "-- state: {} (fetch #{})",
        snapshot.state().unwrap_or("unknown"),
        snapshot.sequence()
    );
    for row in view.stages() {
        println!("{} {}", marker(row.classification), row.name);
    }
}
