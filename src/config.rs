use std::path::{Path, PathBuf};

use clap::Parser;

pub const DATA_DIR_NAME: &str = "data";
pub const DEFAULT_ROSTER_FILE: &str = "roster.xlsx";

#[derive(Debug, Parser)]
#[command(name = "mentormarksd", version, about = "Project group marks sidecar")]
pub struct Cli {
    /// Workspace folder; data and roster paths default relative to it
    #[arg(long, env = "MENTORMARKS_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Folder holding groups.json and marks.json
    #[arg(long, env = "MENTORMARKS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Spreadsheet roster used by roster.import
    #[arg(long, env = "MENTORMARKS_ROSTER")]
    pub roster: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workspace: PathBuf,
    pub data_dir: PathBuf,
    pub roster_path: PathBuf,
}

impl Config {
    pub fn for_workspace(workspace: &Path) -> Self {
        Config {
            workspace: workspace.to_path_buf(),
            data_dir: workspace.join(DATA_DIR_NAME),
            roster_path: workspace.join(DEFAULT_ROSTER_FILE),
        }
    }

    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let workspace = match &cli.workspace {
            Some(p) => p.clone(),
            None => std::env::current_dir()?,
        };
        let mut config = Config::for_workspace(&workspace);
        if let Some(dir) = &cli.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(roster) = &cli.roster {
            config.roster_path = roster.clone();
        }
        Ok(config)
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}
