mod grab;
mod init;
mod latest;
mod list;
mod show;
mod update;

pub use grab::cmd_grab;
pub use init::cmd_init;
pub use latest::{LatestArgs, cmd_latest};
pub use list::cmd_list;
pub use show::cmd_show;
pub use update::{cmd_update, cmd_update_all};

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::transmission::RpcConfig;
use crate::clients::{CatalogClient, EztvClient, TransmissionClient};
use crate::config::Config;
use crate::services::{DispatchMode, Dispatcher, Reconciler, ShowUpdater};

fn catalog_client(config: &Config) -> anyhow::Result<Arc<dyn CatalogClient>> {
    let client = EztvClient::new(
        &config.catalog.base_url,
        Duration::from_secs(u64::from(config.catalog.request_timeout_seconds)),
    )?;
    Ok(Arc::new(client))
}

/// Connects to Transmission unless this is a dry run.
async fn dispatcher(config: &Config, dry_run: bool) -> anyhow::Result<Dispatcher> {
    if dry_run {
        return Ok(Dispatcher::new(DispatchMode::DryRun));
    }

    let client = TransmissionClient::connect(RpcConfig {
        base_url: config.transmission.url.clone(),
        username: config.transmission.user.clone(),
        password: config.transmission.effective_password(),
    })
    .await
    .context("Failed to connect to Transmission")?;

    Ok(Dispatcher::new(DispatchMode::Live(Arc::new(client))))
}

fn reconciler(config: &Config) -> Reconciler {
    Reconciler::new(config.quality.selector())
}

async fn show_updater(
    config: &Config,
    catalog: Arc<dyn CatalogClient>,
    dry_run: bool,
) -> anyhow::Result<ShowUpdater> {
    Ok(ShowUpdater::new(
        catalog,
        reconciler(config),
        dispatcher(config, dry_run).await?,
        config.general.max_concurrent_updates,
    ))
}

fn print_dispatch(report: &crate::services::DispatchReport, quiet: bool) {
    use crate::services::DispatchOutcome;

    for record in &report.records {
        let ep = &record.episode;
        match &record.outcome {
            DispatchOutcome::Queued(result) => {
                if !quiet {
                    println!(
                        "Added {} S{:02}E{:02} (id {}) into {}",
                        ep.show_title,
                        ep.season,
                        ep.episode,
                        result.id,
                        record.target_dir.display()
                    );
                }
            }
            DispatchOutcome::Failed(e) => {
                println!(
                    "ERROR: adding {} S{:02}E{:02}: {e}",
                    ep.show_title, ep.season, ep.episode
                );
            }
            DispatchOutcome::Skipped => {
                println!(
                    "Would add {} S{:02}E{:02} into {}",
                    ep.show_title,
                    ep.season,
                    ep.episode,
                    record.target_dir.display()
                );
            }
        }
    }
}
