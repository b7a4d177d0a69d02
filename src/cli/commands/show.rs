//! Show command handler

use crate::cli::AppContext;
use crate::models::Show;
use crate::services::{lookup, update};

/// Show block followed by one line per episode, `d ` marking downloaded ones.
/// Quiet output is empty.
fn render_show(show: &Show, quiet: bool) -> String {
    if quiet {
        return String::new();
    }

    let mut out = format!("{show}\n\n");
    for episode in &show.episodes {
        let mark = if episode.downloaded { "d " } else { "  " };
        out.push_str(&format!("{mark}{episode}\n"));
    }
    out
}

fn print_show(show: &Show, quiet: bool) {
    print!("{}", render_show(show, quiet));
}

pub async fn cmd_show(
    ctx: &mut AppContext,
    pattern: &str,
    update_show: bool,
    include_all: bool,
) -> anyhow::Result<()> {
    if update_show {
        let report = super::update::update_one(ctx, pattern, include_all).await?;
        print_show(&report.show, ctx.quiet);
        super::print_dispatch(&report.dispatch, ctx.quiet);
        return Ok(());
    }

    let catalog = super::catalog_client(&ctx.config)?;
    let resolved = lookup::resolve(pattern, &ctx.config, catalog.as_ref()).await?;
    let base_dir = ctx.config.base_dir_for(&resolved.show.url);

    let (show, _) = update::reconcile_show(
        &super::reconciler(&ctx.config),
        resolved.show,
        base_dir,
        include_all,
    )
    .await?;
    print_show(&show, ctx.quiet);

    Ok(())
}
