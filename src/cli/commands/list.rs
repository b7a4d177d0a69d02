//! List command handler

use crate::cli::AppContext;

pub async fn cmd_list(ctx: &AppContext, all: bool) -> anyhow::Result<()> {
    if ctx.config.shows.is_empty() && !all {
        println!("No shows saved");
        return Ok(());
    }

    for show in &ctx.config.shows {
        println!("l {:<40} {}", show.title, show.url);
    }

    if all {
        let catalog = super::catalog_client(&ctx.config)?;
        for show in catalog.list_shows().await? {
            println!("r {:<40} {}", show.title, show.url);
        }
    }

    Ok(())
}
