//! Update command handlers

use anyhow::Context;
use tracing::warn;

use crate::cli::AppContext;
use crate::config::TrackedShowEntry;
use crate::services::{ShowReport, lookup};

fn print_report(report: &ShowReport, quiet: bool) {
    if !quiet {
        let downloaded = report.reconciliation.downloaded;
        match report.reconciliation.watermark {
            Some((season, episode)) => println!(
                "{}: {downloaded} downloaded, latest S{season:02}E{episode:02}, {} to add",
                report.show.title,
                report.reconciliation.to_acquire.len()
            ),
            None => println!(
                "{}: nothing downloaded yet, {} to add",
                report.show.title,
                report.reconciliation.to_acquire.len()
            ),
        }
    }
    super::print_dispatch(&report.dispatch, quiet);
}

/// Resolves, tracks and updates a single show, saving the config unless this
/// is a dry run.
pub(super) async fn update_one(
    ctx: &mut AppContext,
    pattern: &str,
    include_all: bool,
) -> anyhow::Result<ShowReport> {
    let catalog = super::catalog_client(&ctx.config)?;
    let resolved = lookup::resolve(pattern, &ctx.config, catalog.as_ref()).await?;
    let updater = super::show_updater(&ctx.config, catalog, ctx.dry_run).await?;

    if !resolved.tracked {
        ctx.config
            .track_show(TrackedShowEntry::new(&resolved.show.title, &resolved.show.url));
    }

    let base_dir = ctx.config.base_dir_for(&resolved.show.url);
    let report = updater
        .update_show(resolved.show, &base_dir, include_all)
        .await?;

    ctx.config
        .persist(&ctx.config_path, ctx.dry_run)
        .context("Failed to save tracked shows")?;
    Ok(report)
}

pub async fn cmd_update(
    ctx: &mut AppContext,
    pattern: &str,
    include_all: bool,
) -> anyhow::Result<()> {
    let report = update_one(ctx, pattern, include_all).await?;
    print_report(&report, ctx.quiet);
    Ok(())
}

pub async fn cmd_update_all(ctx: &AppContext, include_all: bool) -> anyhow::Result<()> {
    if ctx.config.shows.is_empty() {
        println!("No shows saved");
        return Ok(());
    }

    let catalog = super::catalog_client(&ctx.config)?;
    let updater = super::show_updater(&ctx.config, catalog, ctx.dry_run).await?;

    let entries = ctx
        .config
        .shows
        .iter()
        .map(|entry| (entry.clone(), entry.base_dir(&ctx.config.data)))
        .collect();
    let summary = updater.update_all(entries, include_all).await;

    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(report) => print_report(report, ctx.quiet),
            Err(e) => println!("ERROR: updating {}: {e}", outcome.title),
        }
    }

    println!(
        "{} shows updated, {} failed; {} episodes added, {} failed",
        summary.outcomes.len() - summary.failed_shows(),
        summary.failed_shows(),
        summary.queued(),
        summary.failed_dispatches()
    );

    if summary.failed_shows() > 0 {
        warn!(failed = summary.failed_shows(), "Some shows could not be updated");
    }

    ctx.config
        .persist(&ctx.config_path, ctx.dry_run)
        .context("Failed to save tracked shows")?;
    Ok(())
}
