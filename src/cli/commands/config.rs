use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::config::config;
use crate::session::store::get_config_dir;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the effective configuration")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();

    match cmd {
        ConfigCommands::Show => {
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(config)?);
                }
                OutputFormat::Text => {
                    println!("Environment: {:?}", config.environment);
                    println!("API base URL: {}", config.api.base_url);
                    println!("API timeout: {}s", config.api.timeout_secs);
                    println!("User agent: {}", config.api.user_agent);
                    println!("Refresh margin: {}s", config.session.refresh_margin_secs);
                    println!("Refresh interval: {}s", config.session.refresh_interval_secs);
                    match get_config_dir() {
                        Ok(dir) => println!("Session directory: {}", dir.display()),
                        Err(e) => println!("Session directory: unavailable ({})", e),
                    }
                    println!("Recover on save: {}", config.mapping.recover_on_save);
                    println!("Mapping debug logging: {}", config.mapping.debug_logging);
                }
            }
            Ok(())
        }
    }
}
