use clap::Parser;
use sr_console::cli::{Cli, OutputFormat};
use sr_console::cli::utils::output_error;
use sr_console::error::ClientError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let default_level = if sr_console::is_production!() { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = sr_console::cli::run(cli).await {
        match output_format {
            OutputFormat::Json => {
                let code = e.downcast_ref::<ClientError>().map(|c| c.error_code());
                output_error(&output_format, &e.to_string(), code)?;
            }
            OutputFormat::Text => match std::env::var("CLI_VERBOSE").as_deref() {
                Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
                _ => eprintln!("Error: {e}"),
            },
        }
        std::process::exit(1);
    }

    Ok(())
}
