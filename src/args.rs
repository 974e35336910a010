//! Command line arguments.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::consts::file_paths;
use crate::world::Dimension;

#[derive(Parser, Debug)]
#[command(
    name = "nopal",
    version,
    about = "Encodes chunks for Minecraft Bedrock clients of several protocol versions"
)]
pub struct Args {
    /// Path of the JSON config file, created with defaults if missing
    #[arg(long, default_value = file_paths::CONFIG)]
    pub config: PathBuf,

    /// Overrides the data directory from the config file
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Overrides the number of encoding workers from the config file
    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the block mappings of every protocol and report their sizes
    Check,
    /// Generate a superflat chunk and encode it for the given client protocols
    Encode {
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        x: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        z: i32,
        #[arg(long, value_enum, default_value_t = DimensionArg::Overworld)]
        dimension: DimensionArg,
        /// Protocol ids of the viewers, repeated ids are encoded once
        #[arg(long, num_args = 1.., default_values_t = [crate::consts::minecraft::PROTOCOL_VERSION])]
        protocols: Vec<u32>,
        /// Directory to write the compressed batches to
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Seconds to wait for each batch
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DimensionArg {
    Overworld,
    Nether,
    End,
}

impl From<DimensionArg> for Dimension {
    fn from(dimension: DimensionArg) -> Self {
        match dimension {
            DimensionArg::Overworld => Dimension::Overworld,
            DimensionArg::Nether => Dimension::Nether,
            DimensionArg::End => Dimension::End,
        }
    }
}

pub fn init() -> Args {
    Args::parse()
}
