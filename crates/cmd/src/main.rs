use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cmd::commands;
use cmd::common::{open_connector, parse_path, resolve_config};
use diagnostics::log_debug;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "blobfs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store root directory, one sub-directory per container (default: $BLOBFS_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// YAML store configuration; takes precedence over --root
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the children of a directory
    Ls {
        /// Directory path, starting with the container
        dir: String,
        /// Show file sizes
        #[arg(short, long)]
        long: bool,
    },
    /// Show existence and size of a path
    Stat { path: String },
    /// Write a file's content to stdout
    Cat {
        file: String,
        /// First byte to read
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Number of bytes to read, negative for the rest of the file
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        length: i64,
    },
    /// Append a host file (or stdin for '-') as a new blob
    Append {
        file: String,
        /// Host file to read from
        input: String,
    },
    /// Cut a file down to the given length
    Truncate { file: String, length: u64 },
    /// Append one file to another
    Cp { source: String, target: String },
    /// Append one file to another and delete the source
    Mv { source: String, target: String },
    /// Delete a file
    Rm {
        file: String,
        /// Do not fail on a missing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    diagnostics::init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), cli.root)?;
    let connector = open_connector(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match &cli.command {
        Commands::Ls { dir, long } => {
            commands::list_command(&connector, &parse_path(dir)?, *long, &mut out)
        }
        Commands::Stat { path } => commands::stat_command(&connector, &parse_path(path)?, &mut out),
        Commands::Cat {
            file,
            offset,
            length,
        } => commands::cat_command(&connector, &parse_path(file)?, *offset, *length, &mut out),
        Commands::Append { file, input } => {
            let file = parse_path(file)?;
            if input == "-" {
                commands::append_command(&connector, &file, &mut io::stdin().lock(), &mut out)
            } else {
                let mut host = File::open(input)
                    .with_context(|| format!("Failed to open host file {input}"))?;
                commands::append_command(&connector, &file, &mut host, &mut out)
            }
        }
        Commands::Truncate { file, length } => {
            commands::truncate_command(&connector, &parse_path(file)?, *length, &mut out)
        }
        Commands::Cp { source, target } => {
            commands::cp_command(&connector, &parse_path(source)?, &parse_path(target)?, &mut out)
        }
        Commands::Mv { source, target } => {
            commands::mv_command(&connector, &parse_path(source)?, &parse_path(target)?, &mut out)
        }
        Commands::Rm { file, force } => {
            commands::rm_command(&connector, &parse_path(file)?, *force, &mut out)
        }
    };

    out.flush()?;
    let stats = connector.cache_stats();
    log_debug!("Cache hits {hits}, misses {misses}", hits: stats.hits, misses: stats.misses);
    connector.close()?;
    result
}
