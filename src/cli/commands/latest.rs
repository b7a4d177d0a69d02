//! Latest releases command handler

use anyhow::Context;
use regex::RegexBuilder;

use crate::cli::AppContext;
use crate::models::Listing;
use crate::services::{ListingFilter, last_matching};

pub struct LatestArgs {
    pub n: usize,
    pub title: Option<String>,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub m: usize,
    pub long: bool,
}

pub async fn cmd_latest(ctx: &AppContext, args: LatestArgs) -> anyhow::Result<()> {
    let catalog = super::catalog_client(&ctx.config)?;

    let filtered = args.title.is_some() || args.season.is_some() || args.episode.is_some();
    let listings: Vec<Listing> = if filtered {
        let pattern = args.title.as_deref().unwrap_or("");
        let title = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid title pattern: {pattern}"))?;
        let filter = ListingFilter {
            title,
            season: args.season,
            episode: args.episode,
        };
        last_matching(catalog.as_ref(), args.m, &filter).await?
    } else {
        catalog.latest_listings(args.n).await?
    };

    for listing in &listings {
        if args.long {
            println!("{}", listing.long_display());
            println!();
        } else {
            println!("{listing}");
        }
    }

    Ok(())
}
