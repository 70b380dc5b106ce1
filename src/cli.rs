//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

/// Command-line client for a coursehub learning-platform backend.
#[derive(Debug, Parser)]
#[command(name = "coursehub", version)]
pub struct Args {
    /// Path to config file (default: ./coursehub.toml or
    /// ~/.config/coursehub/coursehub.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override API base URL.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and persist a credential pair (password is prompted).
    Login { email: String },
    /// Create an account (password is prompted).
    Register { name: String, email: String },
    /// Show stored-credential health.
    Status,
    /// Force a token refresh now.
    Refresh,
    /// Sign out and clear stored credentials.
    Logout,
    /// Probe the backend health endpoint.
    Health,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn login_parses_email_argument() {
        let args = Args::parse_from(["coursehub", "login", "ada@example.com"]);
        match args.command {
            Command::Login { email } => assert_eq!(email, "ada@example.com"),
            other => panic!("expected login command, got: {other:?}"),
        }
    }

    #[test]
    fn global_flags_combine_with_subcommands() {
        let args = Args::parse_from([
            "coursehub",
            "--config",
            "custom.toml",
            "--base-url",
            "https://api.campus.example",
            "status",
        ]);
        assert_eq!(args.config.as_deref(), Some("custom.toml"));
        assert_eq!(args.base_url.as_deref(), Some("https://api.campus.example"));
        assert!(matches!(args.command, Command::Status));
    }

    #[test]
    fn register_takes_name_and_email() {
        let args = Args::parse_from(["coursehub", "register", "Ada", "ada@example.com"]);
        match args.command {
            Command::Register { name, email } => {
                assert_eq!(name, "Ada");
                assert_eq!(email, "ada@example.com");
            }
            other => panic!("expected register command, got: {other:?}"),
        }
    }
}
