use std::path::PathBuf;
use std::time::Duration;

use buildwatch_engine::ServiceConfig;
use clap::{Args, Parser, Subcommand};

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "buildwatch",
    version,
    about = "Watch CI builds and get notified when they finish"
)]
pub struct Cli {
    /// Directory for job state and logs [default: platform data directory]
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal, global = true)]
    pub log: LogDestination,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll tracked builds; reads more locators, `list`, `remove <job>`, `reload` and `quit` from stdin
    Watch(WatchArgs),
    /// Start tracking builds without polling them now
    Add {
        #[arg(required = true)]
        locators: Vec<String>,
    },
    /// Stop tracking a build, by id or locator
    Remove { job: String },
    /// Show tracked builds
    List,
    /// Show or change the server settings
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Build locators to add before polling starts
    pub locators: Vec<String>,

    /// Seconds between poll cycles
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// Seconds before a single status query is abandoned
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Do not announce finished builds aloud
    #[arg(long)]
    pub no_speech: bool,

    /// Log finished builds instead of showing desktop notifications
    #[arg(long)]
    pub quiet_notifications: bool,
}

impl WatchArgs {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            poll_interval: Duration::from_secs(self.interval_secs),
            request_timeout: Duration::from_secs(self.timeout_secs),
            speak: !self.no_speech,
            ..ServiceConfig::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Server base URL, e.g. https://ci.example.com
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    /// Password or API token (prefer --password-stdin)
    #[arg(long, conflicts_with = "password_stdin")]
    pub password: Option<String>,

    /// Read the password or API token from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

impl ConfigArgs {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.username.is_none() && self.password.is_none() && !self.password_stdin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_defaults_match_service_defaults() {
        let cli = Cli::try_parse_from(["buildwatch", "watch", "job/app/1"]).unwrap();
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.locators, vec!["job/app/1".to_string()]);
        let config = args.service_config();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert!(config.speak);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Cli::try_parse_from(["buildwatch", "watch", "--interval-secs", "0"]).is_err());
    }

    #[test]
    fn password_sources_conflict() {
        assert!(Cli::try_parse_from([
            "buildwatch",
            "config",
            "--password",
            "x",
            "--password-stdin"
        ])
        .is_err());
    }
}
