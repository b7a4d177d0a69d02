use crate::cli::AppContext;
use crate::config::Config;

pub fn cmd_init(ctx: &AppContext) -> anyhow::Result<()> {
    if Config::create_default_if_missing(&ctx.config_path)? {
        println!("Created config file: {}", ctx.config_path.display());
    } else {
        println!("Config file already exists: {}", ctx.config_path.display());
    }
    Ok(())
}
