//! Enrichment job CLI definitions

use clap::Subcommand;
use mechdb::JobStatus;

#[derive(Subcommand)]
pub enum JobsCommand {
    /// List jobs
    List {
        /// Filter by status (pending, processing, done, failed)
        #[arg(long)]
        status: Option<JobStatus>,
    },

    /// Mark the oldest pending jobs as processing and print them as JSON
    Claim {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Record a successful lookup
    Complete {
        id: i64,

        #[arg(long)]
        bv: Option<i64>,

        #[arg(long)]
        pv: Option<i64>,
    },

    /// Record a failed lookup
    Fail {
        id: i64,

        /// Error message
        error: String,
    },
}
