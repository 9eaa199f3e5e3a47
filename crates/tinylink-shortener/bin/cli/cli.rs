use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORAGE_BACKEND_ENV: &str = "TINYLINK_STORAGE_BACKEND";
pub const DATA_DIR_ENV: &str = "TINYLINK_DATA_DIR";
pub const MYSQL_DSN_ENV: &str = "TINYLINK_MYSQL_DSN";
pub const GENERATOR_ENV: &str = "TINYLINK_GENERATOR";
pub const CODE_LENGTH_ENV: &str = "TINYLINK_CODE_LENGTH";
pub const GENERATOR_PREFIX_ENV: &str = "TINYLINK_GENERATOR_PREFIX";
pub const GENERATOR_PADDING_ENV: &str = "TINYLINK_GENERATOR_PADDING";
pub const GENERATOR_START_ENV: &str = "TINYLINK_GENERATOR_START";
pub const BASE_URL_ENV: &str = "TINYLINK_BASE_URL";

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "file")]
    File,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::File => write!(f, "file"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    #[value(name = "random")]
    Random,
    #[value(name = "sequential")]
    Sequential,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tinylink", about = "Shorten URLs and inspect their clicks")]
pub struct CLI {
    #[arg(
        long,
        global = true,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::File
    )]
    pub storage: StorageBackendArg,

    /// Directory holding urls.json and analytics.json for the file backend.
    #[arg(
        long,
        global = true,
        env = DATA_DIR_ENV,
        default_value = DEFAULT_DATA_DIR
    )]
    pub data_dir: PathBuf,

    #[arg(
        long,
        global = true,
        env = MYSQL_DSN_ENV,
        required_if_eq("storage", "mysql")
    )]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        global = true,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorArg::Random
    )]
    pub generator: GeneratorArg,

    /// Length of random codes.
    #[arg(long, global = true, env = CODE_LENGTH_ENV, default_value_t = 6)]
    pub code_length: usize,

    #[arg(
        long = "prefix",
        global = true,
        env = GENERATOR_PREFIX_ENV,
        default_value = ""
    )]
    pub generator_prefix: String,

    /// Minimum number of digits in sequential codes.
    #[arg(
        long = "padding",
        global = true,
        env = GENERATOR_PADDING_ENV,
        default_value_t = 3
    )]
    pub generator_padding: usize,

    /// First counter value of the sequential generator. The counter is not
    /// persisted between runs; start past the codes issued earlier.
    #[arg(
        long = "start",
        global = true,
        env = GENERATOR_START_ENV,
        default_value_t = 1
    )]
    pub generator_start: u64,

    /// Print full short URLs under this base instead of bare codes.
    #[arg(long, global = true, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten a URL and print its code.
    Shorten {
        url: String,
        /// Expire the code this many seconds from now.
        #[arg(long)]
        expires_in: Option<u64>,
        /// Attach metadata; values are parsed as JSON, falling back to strings.
        #[arg(
            long = "meta",
            value_name = "KEY=VALUE",
            value_parser = parse_key_value
        )]
        metadata: Vec<(String, Value)>,
        /// Normalize the URL before shortening it.
        #[arg(long)]
        normalize: bool,
    },
    /// Print the URL behind a code, recording a click unless --no-track.
    Expand {
        code: String,
        #[arg(long)]
        no_track: bool,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        user_agent: Option<String>,
        #[arg(long)]
        referrer: Option<String>,
    },
    /// Print the stored record as JSON.
    Info { code: String },
    /// Print the record with its clicks as JSON.
    Stats { code: String },
    /// Replace the metadata of a code.
    SetMeta {
        code: String,
        #[arg(
            value_name = "KEY=VALUE",
            value_parser = parse_key_value,
            required = true
        )]
        metadata: Vec<(String, Value)>,
    },
    /// Delete a code and its clicks.
    Delete { code: String },
    /// Print the normalized form of a URL.
    Normalize { url: String },
}

/// Parses `KEY=VALUE`, reading VALUE as JSON when it is valid JSON.
pub fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
