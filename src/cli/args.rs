use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "ulimi")]
#[command(about = "Offline sync queue and local record store for the ULIMI farm dashboard")]
#[command(long_about = "ulimi - offline sync for ULIMI 2.0

Farm, task, order and marketplace changes are queued locally and reconciled
with the remote API once it is reachable. This tool inspects and drives that
queue against the local store in ~/.ulimi.

QUICK START:
  ulimi seed                                  Write sample farm data
  ulimi add update farm farm1 --data '{\"name\":\"North Field\"}'
  ulimi status                                Pending / failed counts
  ulimi sync                                  Reconcile now
  ulimi watch                                 Sync on reconnect and on a timer

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results (defaults to the configured one)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Data directory (defaults to ~/.ulimi)
    #[arg(long, env = "ULIMI_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Treat the remote as unreachable
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show sync status
    ///
    /// Connectivity, last successful sync, pending and failed counts.
    Status,

    /// List queued operations
    ///
    /// Shows every operation in queue order, failed ones included.
    #[command(alias = "ls")]
    List {
        /// Only show operations with this status (pending, in_flight, failed)
        #[arg(long, short = 's')]
        status: Option<String>,
    },

    /// Queue a mutation
    ///
    /// # Examples
    ///
    ///   ulimi add create task task9 --data '{"title":"Spray beans"}'
    ///   ulimi add delete order order3
    Add {
        /// Operation type: create, update or delete
        operation: String,

        /// Entity: farm, task, order, inventory, marketplace_item, user_profile
        entity: String,

        /// Identifier of the affected record
        entity_id: String,

        /// JSON payload for the mutation
        #[arg(long)]
        data: Option<String>,
    },

    /// Reconcile pending operations now
    ///
    /// Fails when offline.
    Sync,

    /// Give failed operations a fresh retry budget
    Retry,

    /// Remove failed operations from the queue
    ClearFailed,

    /// Keep syncing: on reconnect and every `sync.interval_secs`
    ///
    /// Runs until interrupted with Ctrl-C.
    Watch,

    /// Write sample farms, tasks, marketplace items and weather
    Seed,

    /// Print the stored value under a key
    Get {
        /// Key without namespace prefix, e.g. farms or sync_queue
        key: String,
    },

    /// List stored keys
    Keys,

    /// Print the effective configuration
    Config,
}
