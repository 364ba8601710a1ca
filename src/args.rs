use clap::Parser;
use std::path::PathBuf;

/// PDU: a parallel disk usage analyzer
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to scan (default: current)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Number of scan workers (0: one per CPU)
    #[arg(short = 'c', long, default_value_t = 0)]
    pub concurrency: usize,

    /// Group files smaller than this many MB into one entry (0: never group)
    #[arg(short = 't', long, value_name = "MB", default_value_t = 1)]
    pub threshold: u64,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log debug events (requires --log-file)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
