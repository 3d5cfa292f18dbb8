mod cli;
mod deleter;
mod error;
mod models;
mod output;
mod registry;
mod selector;

use std::io;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, DeleteArgs};
use deleter::{CancelFlag, DeletePool};
use models::DeletionReport;
use registry::{Registry, RegistryClient};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but some deletions failed.
async fn run(cli: Cli) -> Result<bool> {
    let client = RegistryClient::new(&cli.url, cli.insecure, Duration::from_secs(cli.timeout))?;
    client
        .version_check()
        .await
        .context("Registry version check failed")?;
    debug!("Registry at {} speaks the V2 API", client.base_url());

    match cli.command {
        Command::Images { n } => {
            let repos = client.list_repositories(n).await?;
            output::print_listing(&repos, "repositories");
            Ok(true)
        }
        Command::Tags { image } => {
            let tags = client.list_tags(&image).await?;
            output::print_listing(&tags, "tags");
            Ok(true)
        }
        Command::Delete(args) => {
            let cancel = CancelFlag::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing in-flight deletions");
                    on_interrupt.cancel();
                }
            });

            let registry: Arc<dyn Registry> = Arc::new(client);
            let confirmed = |question: &str| {
                output::confirm(question, &mut io::stdin().lock(), &mut io::stdout())
            };
            match run_delete(registry, &args, cancel, confirmed).await? {
                Some(report) => {
                    output::print_report(&report);
                    Ok(report.failed() == 0)
                }
                None => Ok(true),
            }
        }
    }
}

/// Select the tags to delete, then delete them unless this is a dry run or the user declines.
/// Returns `None` when nothing was deleted on purpose.
async fn run_delete<C>(
    registry: Arc<dyn Registry>,
    args: &DeleteArgs,
    cancel: CancelFlag,
    confirm: C,
) -> Result<Option<DeletionReport>>
where
    C: FnOnce(&str) -> io::Result<bool>,
{
    let tags = registry.list_tags(&args.image).await?;
    let to_delete = select_tags(tags, args);
    info!("Selected {} tags of {}", to_delete.len(), args.image);

    if args.dry_run {
        output::print_dry_run(&args.image, &to_delete)?;
        return Ok(None);
    }

    if !args.yes && !confirm("Are you sure to delete these tags? (maybe try --dry-run first)")? {
        eprintln!("Canceled.");
        return Ok(None);
    }

    let pool = DeletePool::new(usize::from(args.concurrency)).with_cancel(cancel);
    info!("Deleting {} tags with {} workers", to_delete.len(), pool.concurrency());
    let image = args.image.clone();
    let report = pool
        .delete(&args.image, to_delete, move |tag| {
            let registry = Arc::clone(&registry);
            let image = image.clone();
            async move { registry.resolve_digest_and_delete(&image, &tag).await }
        })
        .await;
    Ok(Some(report))
}

fn select_tags(tags: Vec<String>, args: &DeleteArgs) -> Vec<String> {
    match &args.tag {
        Some(pattern) => selector::select(&tags, pattern, args.keep, args.unversioned.into()),
        None => {
            if args.keep > 0 {
                warn!("--keep only applies together with --tag, deleting every tag");
            }
            tags
        }
    }
}
