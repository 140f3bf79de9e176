//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pan123_protocol::{DuplicatePolicy, ExistingFilePolicy};

/// 123pan cloud drive client.
#[derive(Debug, Parser)]
#[command(name = "pan123", version, about)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/pan123/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enter the folder at this listing index before running the command.
    /// Repeat to descend further.
    #[arg(long = "cd", value_name = "INDEX", global = true, value_parser = index_parser())]
    pub cd: Vec<u64>,

    /// Print the raw `{code, message, data}` outcome as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the token.
    Login {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the token. `--forget` also drops the stored credentials.
    Logout {
        #[arg(long)]
        forget: bool,
    },
    /// Show the signed-in account.
    Whoami,
    /// List the current directory.
    Ls {
        /// Load every page instead of the first one.
        #[arg(long)]
        all: bool,
    },
    /// Create a folder in the current directory.
    Mkdir { name: String },
    /// Upload a local file into the current directory.
    Upload {
        path: PathBuf,
        /// Remote name (defaults to the local file name).
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        policy: UploadPolicyArgs,
    },
    /// Download the entry at INDEX (files or whole folders).
    Download {
        #[arg(value_parser = index_parser())]
        index: u64,
        /// Local directory to save into.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[command(flatten)]
        policy: DownloadPolicyArgs,
    },
    /// Print the direct download link of the entry at INDEX.
    Link {
        #[arg(value_parser = index_parser())]
        index: u64,
    },
    /// Move the entry at INDEX to the recycle bin.
    Rm {
        #[arg(value_parser = index_parser())]
        index: u64,
    },
    /// Share the entries at the given indices.
    Share {
        #[arg(required = true, value_parser = index_parser())]
        indices: Vec<u64>,
        /// Extraction code; the share is public without one.
        #[arg(long, default_value = "")]
        password: String,
    },
    /// List the recycle bin.
    Recycle,
    /// Restore a file from the recycle bin by id.
    Restore { file_id: i64 },
    /// Switch the request protocol (android or web).
    Protocol { name: String },
}

#[derive(Debug, Clone, Copy, Args)]
#[group(multiple = false)]
pub struct UploadPolicyArgs {
    /// Replace a file with the same name.
    #[arg(long)]
    pub overwrite: bool,
    /// Keep both files; the server renames the new one.
    #[arg(long)]
    pub keep_both: bool,
}

impl UploadPolicyArgs {
    pub fn policy(self) -> DuplicatePolicy {
        if self.overwrite {
            DuplicatePolicy::Overwrite
        } else if self.keep_both {
            DuplicatePolicy::KeepBoth
        } else {
            DuplicatePolicy::Reject
        }
    }
}

#[derive(Debug, Clone, Copy, Args)]
#[group(multiple = false)]
pub struct DownloadPolicyArgs {
    /// Replace local files that already exist.
    #[arg(long)]
    pub overwrite: bool,
    /// Leave existing local files alone.
    #[arg(long)]
    pub skip_existing: bool,
}

impl DownloadPolicyArgs {
    pub fn policy(self) -> ExistingFilePolicy {
        if self.overwrite {
            ExistingFilePolicy::Overwrite
        } else if self.skip_existing {
            ExistingFilePolicy::Skip
        } else {
            ExistingFilePolicy::Conflict
        }
    }
}

/// Listing indices are shown starting at 1.
fn index_parser() -> clap::builder::RangedU64ValueParser<u64> {
    clap::value_parser!(u64).range(1..)
}

/// Converts a displayed index to a position in the loaded listing.
pub fn slot(index: u64) -> usize {
    index.saturating_sub(1) as usize
}
