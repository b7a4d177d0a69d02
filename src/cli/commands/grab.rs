use anyhow::bail;

use crate::cli::AppContext;
use crate::services::lookup;

pub async fn cmd_grab(ctx: &AppContext, pattern: &str, index: usize) -> anyhow::Result<()> {
    let catalog = super::catalog_client(&ctx.config)?;
    let resolved = lookup::resolve(pattern, &ctx.config, catalog.as_ref()).await?;

    let Some(episode) = resolved.show.episodes.get(index).cloned() else {
        bail!(
            "{} has {} episodes, index {index} is out of range",
            resolved.show.title,
            resolved.show.episodes.len()
        );
    };

    let dispatcher = super::dispatcher(&ctx.config, ctx.dry_run).await?;
    let base_dir = ctx.config.base_dir_for(&resolved.show.url);
    let report = dispatcher.dispatch(vec![episode], &base_dir).await;
    super::print_dispatch(&report, ctx.quiet);

    if report.is_clean() {
        Ok(())
    } else {
        bail!("Failed to add episode {index} of {}", resolved.show.title)
    }
}
