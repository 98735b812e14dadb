use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use slotwatch_core::config::{self, Config};
use slotwatch_core::{AlertDecision, Deployment};
use slotwatch_monitor::checks;
use slotwatch_monitor::markup::Selector;
use slotwatch_monitor::{HttpRenderer, MessageSettings, Monitor};
use slotwatch_notify::{DeliveryResult, Dispatcher};

/// Reservation slot monitor.
///
/// Scans the configured calendar pages once, posts a digest to the report
/// channel, and raises an alert when actionable slots are open.
#[derive(Parser, Debug)]
#[command(name = "slotwatch", version, about = "Reservation slot monitor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan all targets once and notify (default).
    Run {
        /// Deployment file with states, selectors, policy and targets.
        #[arg(long, env = "SLOTWATCH_TARGETS")]
        targets: Option<PathBuf>,

        /// Print the digest and alert instead of sending them.
        #[arg(long, env = "SLOTWATCH_DRY_RUN")]
        dry_run: bool,
    },
    /// Send a test message to the report channel.
    TestNotify,
    /// Send an alert built from sample data to the alert channel.
    TestAlert {
        /// Deployment file whose policy is applied to the sample data.
        #[arg(long, env = "SLOTWATCH_TARGETS")]
        targets: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    config::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let messages = MessageSettings::from(&config.notify);

    match cli.command.unwrap_or(Command::Run {
        targets: None,
        dry_run: false,
    }) {
        Command::Run { targets, dry_run } => {
            let deployment = load_deployment(&config, targets)?;
            run(&config, deployment, messages, dry_run).await
        }
        Command::TestNotify => {
            let dispatcher = Dispatcher::from_config(&config.notify);
            let result = checks::test_notify(&dispatcher, &messages).await;
            Ok(exit_for(&result))
        }
        Command::TestAlert { targets } => {
            // Without a deployment file the default policy applies.
            let policy = match load_deployment(&config, targets) {
                Ok(deployment) => deployment.policy,
                Err(e) => {
                    info!(error = %e, "using default alert policy");
                    Default::default()
                }
            };
            let dispatcher = Dispatcher::from_config(&config.notify);
            let result =
                checks::test_alert(&dispatcher, &messages, &policy, &config.monitor.now())
                    .await
                    .context("failed to build sample statistics")?;
            match result {
                Some(result) => Ok(exit_for(&result)),
                None => {
                    info!(policy = %policy.name, "policy found nothing to alert on");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
    }
}

async fn run(
    config: &Config,
    deployment: Deployment,
    messages: MessageSettings,
    dry_run: bool,
) -> Result<ExitCode> {
    let renderer = HttpRenderer::new(Duration::from_secs(config.monitor.page_timeout_secs))
        .context("failed to start page renderer")?;
    let dispatcher = if dry_run {
        info!("dry run: notifications are printed, not sent");
        Dispatcher::empty()
    } else {
        Dispatcher::from_config(&config.notify)
    };

    let monitor = Monitor::new(renderer, deployment, dispatcher, messages);
    let outcome = monitor.run(config.monitor.now()).await;

    if dry_run {
        if let Some(digest) = &outcome.digest {
            println!("{digest}");
        }
        if let Some(AlertDecision::Alert { message, .. }) = &outcome.decision {
            println!("\n{message}");
        }
        if let Some(failure) = &outcome.failure {
            println!("{}: {}", failure.kind, failure.message);
        }
    }

    if let Some(failure) = &outcome.failure {
        error!(kind = %failure.kind, "run finished with a failure");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn load_deployment(config: &Config, targets: Option<PathBuf>) -> Result<Deployment> {
    let path = targets.unwrap_or_else(|| config.monitor.targets_path.clone());
    let deployment = Deployment::load(&path)
        .with_context(|| format!("failed to load deployment from {}", path.display()))?;

    for spec in deployment.states.iter() {
        spec.selector
            .parse::<Selector>()
            .with_context(|| format!("invalid selector for state {}", spec.state))?;
    }
    deployment
        .label_selector
        .parse::<Selector>()
        .context("invalid label_selector")?;

    info!(
        path = %path.display(),
        states = deployment.states.len(),
        targets = deployment.targets.len(),
        policy = %deployment.policy.name,
        "deployment loaded"
    );
    Ok(deployment)
}

fn exit_for(result: &DeliveryResult) -> ExitCode {
    match result {
        DeliveryResult::Delivered => ExitCode::SUCCESS,
        DeliveryResult::Skipped => {
            info!("channel not configured, nothing sent");
            ExitCode::SUCCESS
        }
        DeliveryResult::Failed(reason) => {
            error!(reason = %reason, "test delivery failed");
            ExitCode::FAILURE
        }
    }
}
