//! Clipstore CLI
//!
//! Operator tool for files kept in Clipstore SFTP storage.
//!
//! Usage:
//!   clipstore put original ./me.jpg --path photos/42/:style.jpg
//!   clipstore exists thumb --path photos/42/:style.jpg
//!   clipstore rm photos/42/original.jpg photos/42/thumb.jpg

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipstore_core::storage::{
    SftpOptions, SftpStorage, Ssh2Connector, TemplatePaths, base_name,
};
use clipstore_shared::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "clipstore")]
#[command(about = "Store, fetch and delete attachment files on an SFTP server")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file as one style
    Put {
        /// Style name
        style: String,
        /// Local file to upload
        local: PathBuf,
        /// Root-relative path template, `:style` is substituted
        #[arg(short, long)]
        path: String,
    },
    /// Download one style to a local file
    Get {
        /// Style name
        style: String,
        /// Local destination
        dest: PathBuf,
        /// Root-relative path template, `:style` is substituted
        #[arg(short, long)]
        path: String,
    },
    /// Check whether one style is stored
    Exists {
        /// Style name
        style: String,
        /// Root-relative path template, `:style` is substituted
        #[arg(short, long)]
        path: String,
    },
    /// Delete root-relative paths and prune emptied directories
    Rm {
        /// Paths to delete
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the public URL of one style
    Url {
        /// Style name
        style: String,
        /// Root-relative path template, `:style` is substituted
        #[arg(short, long)]
        path: String,
    },
}

/// Paths for a file the operator asserts is stored.
fn stored(template: &str) -> TemplatePaths {
    TemplatePaths::new(template).with_original_filename(base_name(template))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = SftpOptions::from_settings(&config.sftp)?;
    info!(host = %options.host, root = %options.fs_root, "sftp storage configured");
    let mut storage = SftpStorage::new(options, Ssh2Connector)?;

    match args.command {
        Command::Put { style, local, path } => {
            let mut attachment = stored(&path);
            let remote = storage.remote_path(&attachment, &style)?;
            storage.queue_write(style, local);
            storage.flush_writes(&mut attachment)?;
            println!("{remote}");
        }
        Command::Get { style, dest, path } => {
            if !storage.copy_to_local_file(&stored(&path), &style, &dest) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Exists { style, path } => {
            let found = storage.exists(&stored(&path), &style);
            println!("{found}");
            if !found {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Rm { paths } => {
            for path in paths {
                storage.queue_delete(path);
            }
            let report = storage.flush_deletes()?;
            println!(
                "removed {} missing {} failed {} pruned {}",
                report.removed, report.missing, report.failed, report.pruned_dirs
            );
            if report.failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Url { style, path } => {
            println!("{}", storage.public_url(&stored(&path), &style));
        }
    }

    Ok(ExitCode::SUCCESS)
}
