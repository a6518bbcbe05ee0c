use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "brt")]
#[command(version, about = "Build orchestration and CI helpers for buildroot-based firmware trees")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Root of the firmware tree. Defaults to the current directory.
    #[arg(long, global = true)]
    pub tree_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print rebuild targets for packages changed since a git revision
    ChangedTargets {
        /// Diff base (ref, tag, or SHA); work-tree changes only when omitted
        #[arg(long)]
        since: Option<String>,

        /// Print rebuild targets for every package instead of the changed set
        #[arg(long)]
        all: bool,

        /// Ignore the dependency cache and re-scrape the build system
        #[arg(long)]
        refresh: bool,
    },
    /// Inspect the external artifact manifest
    Artifacts {
        #[command(subcommand)]
        command: ArtifactsCommands,
    },
    /// Inspect the build-variants manifest
    Variants {
        #[command(subcommand)]
        command: VariantsCommands,
    },
    /// Inspect or clear the dependency cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Print, store, or verify a file's SHA-256 digest
    Hash {
        file: PathBuf,

        /// Record the digest in the hashes/ sidecar next to the file
        #[arg(long)]
        store: bool,

        /// Compare the digest against the recorded sidecar
        #[arg(long, conflicts_with = "store")]
        verify: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ArtifactsCommands {
    /// List artifact sets, or the artifacts of one set
    List {
        set: Option<String>,
    },
    /// Print the S3 URL of a named artifact
    Url {
        set: String,
        name: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum VariantsCommands {
    /// List variant names, one per line
    List,
    /// Show a variant's resolved properties
    Show { name: String },
}

#[derive(Subcommand, Clone)]
pub enum CacheCommands {
    /// Report the current cache key and whether a matching file exists
    Status,
    /// Remove every cache file with the configured prefix
    Clear,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("brt=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let tree_root = match cli.tree_root.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::ChangedTargets {
            since,
            all,
            refresh,
        } => {
            cmd::cmd_changed_targets(&tree_root, since.as_deref(), *all, *refresh).await?;
        }
        Commands::Artifacts { command } => match command {
            ArtifactsCommands::List { set } => {
                cmd::cmd_artifacts_list(&tree_root, set.as_deref())?;
            }
            ArtifactsCommands::Url { set, name } => {
                cmd::cmd_artifacts_url(&tree_root, set, name)?;
            }
        },
        Commands::Variants { command } => match command {
            VariantsCommands::List => cmd::cmd_variants_list(&tree_root)?,
            VariantsCommands::Show { name } => cmd::cmd_variants_show(&tree_root, name)?,
        },
        Commands::Cache { command } => match command {
            CacheCommands::Status => cmd::cmd_cache_status(&tree_root)?,
            CacheCommands::Clear => cmd::cmd_cache_clear(&tree_root)?,
        },
        Commands::Hash {
            file,
            store,
            verify,
        } => {
            cmd::cmd_hash(file, *store, *verify)?;
        }
    }

    Ok(())
}
