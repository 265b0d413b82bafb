use std::io::{BufRead, Write};
use std::time::Duration;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::error::ClientError;
use crate::session::spawn_refresher;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the SR backend")]
    Login {
        #[arg(help = "User id")]
        user_id: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Clear the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Refresh authentication token")]
    Refresh,

    #[command(about = "Keep the session fresh in the background until interrupted")]
    Keepalive,
}

/// Terminal echo switched off for as long as the guard lives
#[cfg(unix)]
struct EchoOff {
    original: nix::sys::termios::Termios,
}

#[cfg(unix)]
impl EchoOff {
    /// `None` when stdin is not a terminal
    fn new() -> Option<Self> {
        use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg};

        let stdin = std::io::stdin();
        let original = tcgetattr(&stdin).ok()?;
        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        tcsetattr(&stdin, SetArg::TCSANOW, &silent).ok()?;
        Some(Self { original })
    }
}

#[cfg(unix)]
impl Drop for EchoOff {
    fn drop(&mut self) {
        use nix::sys::termios::{tcsetattr, SetArg};

        if let Err(e) = tcsetattr(std::io::stdin(), SetArg::TCSANOW, &self.original) {
            tracing::warn!("could not restore terminal echo: {}", e);
        }
    }
}

fn read_line_trimmed(reader: &mut impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(unix)]
fn with_echo_off<T>(read: impl FnOnce() -> T) -> T {
    let guard = EchoOff::new();
    let out = read();
    if guard.is_some() {
        drop(guard);
        eprintln!();
    }
    out
}

#[cfg(not(unix))]
fn with_echo_off<T>(read: impl FnOnce() -> T) -> T {
    read()
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    with_echo_off(|| read_line_trimmed(&mut std::io::stdin().lock()))
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;

    match cmd {
        AuthCommands::Login { user_id, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let session = client.login(&user_id, &password).await?;
            output_success(
                &output_format,
                &format!("Logged in as {}", user_id),
                Some(json!({
                    "user_id": session.user_id,
                    "role_code": session.role_code,
                    "expires_at": session.expires_at,
                })),
            )
        }
        AuthCommands::Logout => {
            client.logout().await?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let Some(session) = client.session().await? else {
                let data = json!({ "authenticated": false });
                return output_success(&output_format, "Not logged in", Some(data));
            };

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "authenticated": true,
                        "expired": session.is_expired(),
                        "user_id": session.user_id,
                        "role_code": session.role_code,
                        "expires_at": session.expires_at,
                        "can_refresh": session.refresh_token.is_some(),
                        "server": client.base_url().as_str(),
                    }))?);
                }
                OutputFormat::Text => {
                    println!("Server: {}", client.base_url());
                    println!("User: {}", session.user_id.as_deref().unwrap_or("-"));
                    println!("Role: {}", session.role_code.as_deref().unwrap_or("-"));
                    match session.expires_at {
                        Some(at) if session.is_expired() => println!("Token: expired at {}", at),
                        Some(at) => println!("Token: valid until {}", at),
                        None => println!("Token: expiry unknown"),
                    }
                }
            }
            Ok(())
        }
        AuthCommands::Refresh => {
            let session = client.refresh().await?;
            output_success(
                &output_format,
                "Token refreshed",
                Some(json!({ "expires_at": session.expires_at })),
            )
        }
        AuthCommands::Keepalive => {
            if client.session().await?.is_none() {
                return Err(ClientError::NotAuthenticated.into());
            }

            let settings = &config().session;
            let mut handle = spawn_refresher(
                client.clone(),
                Duration::from_secs(settings.refresh_interval_secs),
                chrono::Duration::seconds(settings.refresh_margin_secs),
            );
            eprintln!("Keeping session alive, press Ctrl-C to stop");

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    handle.abort();
                    output_success(&output_format, "Stopped", None)
                }
                _ = &mut handle => {
                    Err(ClientError::SessionExpired.into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_password_line_drops_line_ending_only() {
        let mut input = Cursor::new("s3cret pass \r\nnext line\n");
        assert_eq!(read_line_trimmed(&mut input).unwrap(), "s3cret pass ");
        assert_eq!(read_line_trimmed(&mut input).unwrap(), "next line");
        assert_eq!(read_line_trimmed(&mut input).unwrap(), "");
    }
}
