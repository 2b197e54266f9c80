pub mod check;
pub mod list;

use std::path::PathBuf;
use std::time::Duration;

use checkip_common::config::{Config, OutputFormat, default_cache_dir, DEFAULT_MAX_AGE};
use checkip_common::network::target::Target;
use clap::{ArgAction, Parser};

#[derive(Parser)]
#[command(name = "checkip")]
#[command(version)]
#[command(about = "Find out everything about an IP address.")]
pub struct CommandLine {
    /// IP address or hostname to check
    #[arg(required_unless_present = "list")]
    pub target: Option<Target>,

    /// Run only these checks (repeatable, or comma separated)
    #[arg(short, long = "check", value_name = "ID", value_delimiter = ',')]
    pub checks: Vec<String>,

    /// List the available checks and exit
    #[arg(short, long)]
    pub list: bool,

    /// Print one JSON document per check
    #[arg(short, long)]
    pub json: bool,

    /// Where downloaded datasets are cached
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Re-download datasets older than this many hours
    #[arg(long, value_name = "HOURS")]
    pub max_age: Option<u64>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print check results
    #[arg(short, long)]
    pub quiet: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_dir),
            max_age: self
                .max_age
                .map(|hours| Duration::from_secs(hours * 60 * 60))
                .unwrap_or(DEFAULT_MAX_AGE),
            format: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            quiet: self.quiet || self.json,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
