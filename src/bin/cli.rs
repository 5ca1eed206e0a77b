//! Pastewatch CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pastewatch::{
    config::load_all,
    error::Result,
    pipeline::{self, ControllerSettings, PipelineOptions},
    rules,
    services::{ConsoleNotifier, Notifier, PastebinFeed, WebhookNotifier},
};
use tokio_util::sync::CancellationToken;

/// Pastewatch - Paste Feed Keyword Monitor
#[derive(Parser, Debug)]
#[command(
    name = "pastewatch",
    version,
    about = "Watches a public paste feed for keywords and IP ranges"
)]

struct Cli {
    /// Config file to use
    #[arg(short, long, global = true, default_value = "pastewatch.toml")]
    config: PathBuf,

    /// Print debug output
    #[arg(short, long, global = true, visible_alias = "verbose")]
    debug: bool,

    /// Do not send alerts, print them instead
    #[arg(long, global = true)]
    test: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the feed until interrupted
    Run,

    /// Validate the configuration and compile the rules
    Validate,

    /// Match the configured rules against a local file
    Check {
        /// File to scan
        file: PathBuf,
    },
}

/// Initialize logging based on the debug flag.
fn init_logging(debug: bool) {
    use std::io::Write;

    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(cli).await {
        if e.is_fatal() {
            log::error!("Startup failed: {e}");
        } else {
            log::error!("{e}");
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (config, rule_set) = load_all(&cli.config)?;
    log::info!(
        "Loaded {} rules from {}",
        rule_set.len(),
        cli.config.display()
    );

    match cli.command {
        Command::Run => {
            log::info!("Starting Pastebin Scraper");
            let timeout = config.timeout()?;
            let feed = Arc::new(PastebinFeed::new(config.feed.clone(), timeout)?);

            let notifier: Arc<dyn Notifier> = match &config.notification.webhook_url {
                Some(url) if !cli.test => Arc::new(WebhookNotifier::new(
                    url.clone(),
                    &config.feed.user_agent,
                    timeout,
                )?),
                _ => Arc::new(ConsoleNotifier),
            };
            log::info!("Delivering alerts via {}", notifier.name());

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        log::info!("Interrupt received, shutting down...");
                        cancel.cancel();
                    }
                }
            });

            let options = PipelineOptions {
                settings: ControllerSettings::from(&config),
                channel_capacity: config.channel_capacity,
                mail_on_error: config.mail_on_error,
            };
            let summary =
                pipeline::run_pipeline(feed, notifier, Arc::new(rule_set), options, cancel).await?;

            log::info!(
                "Delivered {} alerts, handled {} errors",
                summary.alerts_delivered,
                summary.errors_handled
            );
        }

        Command::Validate => {
            log::info!("✓ Config OK ({} rules)", rule_set.len());
            for rule in rule_set.iter() {
                log::debug!("rule {:?} ({} exceptions)", rule.id, rule.exceptions.len());
            }
        }

        Command::Check { file } => {
            let body = tokio::fs::read_to_string(&file).await?;
            let result = rules::evaluate(&body, &rule_set);

            if !result.any_match() {
                log::info!("No rule matched {}", file.display());
                return Ok(());
            }
            for (rule, text) in &result.matches {
                println!("{rule}: {text}");
            }
        }
    }

    Ok(())
}
