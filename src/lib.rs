pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod library;
pub mod models;
pub mod parser;
pub mod quality;
pub mod services;

use std::path::PathBuf;

use cli::{AppContext, Cli, Commands, LatestArgs};
pub use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config, quiet: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if quiet {
        "warn"
    } else {
        config.general.log_level.as_str()
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

pub async fn run(cli: Cli, config_path: PathBuf, config: Config) -> anyhow::Result<()> {
    init_logging(&config, cli.quiet);
    info!("{}", Config::source_message(&config_path));

    let mut ctx = AppContext {
        config,
        config_path,
        quiet: cli.quiet,
        dry_run: cli.dry_run,
    };

    if !matches!(cli.command, Commands::Init) {
        ctx.config.validate()?;
    }

    match cli.command {
        Commands::List { all } => cli::cmd_list(&ctx, all).await,

        Commands::Show {
            pattern,
            update,
            all,
        } => cli::cmd_show(&mut ctx, &pattern, update, all).await,

        Commands::Update { pattern, all } => cli::cmd_update(&mut ctx, &pattern, all).await,

        Commands::UpdateAll { all } => cli::cmd_update_all(&ctx, all).await,

        Commands::Latest {
            n,
            title,
            season,
            episode,
            m,
            long,
        } => {
            let args = LatestArgs {
                n,
                title,
                season,
                episode,
                m,
                long,
            };
            cli::cmd_latest(&ctx, args).await
        }

        Commands::Grab { pattern, index } => cli::cmd_grab(&ctx, &pattern, index).await,

        Commands::Init => cli::cmd_init(&ctx),
    }
}
