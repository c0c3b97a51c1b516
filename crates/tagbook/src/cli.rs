use std::path::PathBuf;

use clap::Parser;

/// Tagbook: per-user transaction items and item groups over a local JSON API.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Directory holding the `user_data_<n>.db` partition files.
    /// If omitted, all data is in-memory only.
    #[arg(long, env = "TAGBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Number of user data partitions. Users map to `uid % partitions`, so
    /// this must not change once data exists.
    #[arg(long, default_value = "1", env = "TAGBOOK_PARTITIONS")]
    pub partitions: usize,

    /// Node id (0-15) encoded into every generated row id.
    #[arg(long, default_value = "0", env = "TAGBOOK_NODE_ID")]
    pub node_id: u8,

    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "3090")]
    pub port: u16,
}
