pub mod auth;
pub mod chunk;
pub mod client;
pub mod destination;
pub mod error;
pub mod load_config;
pub mod progress;
pub mod session;
pub mod transport;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use load_config::load_config;
use progress::{format_progress, Progress, ProgressSink};

pub use client::{SharepointUploader, UploadOptions, UploaderConfig};
pub use error::UploadError;
pub use session::UploadReport;

#[derive(Parser)]
#[clap(
    name = "sp-upload",
    version,
    about = "Upload files to a SharePoint folder via the chunked upload REST API"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload one file to the folder named in the config file
    Upload {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Path to the file to upload
        #[clap(long)]
        file: PathBuf,
        /// Name for the file object at the destination (defaults to the
        /// source file name)
        #[clap(long)]
        file_name: Option<String>,
        /// Folder override below the site, replacing the config URL's folder
        #[clap(long)]
        folder: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Upload {
            config,
            file,
            file_name,
            folder,
        } => {
            let config = load_config(config)?;

            let progress_sink: Option<ProgressSink> = if config.verbose {
                Some(Box::new(|p: &Progress| {
                    println!("Uploaded {}", format_progress(p));
                }))
            } else {
                None
            };

            let uploader = SharepointUploader::new(UploaderConfig {
                url: config.url,
                credentials: config.credentials,
                max_chunk_size: config.max_chunk_size,
                progress_sink,
            })?;

            println!("Upload starting...");
            match uploader
                .upload(&file, UploadOptions { file_name, folder })
                .await
            {
                Ok(report) => {
                    println!("Upload complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Upload failed: {}", e);
                    Err(e.into())
                }
            }
        }
    }
}
