//
// cli.rs
// Modality-Classifier-rs
//
// Defines the CLI surface with Clap and dispatches user-selected commands to the corresponding modules.
//
// Thales Matheus Mendonça Santos - December 2025

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::classify::{OnnxClassifier, DEFAULT_MODEL_PATH};
use crate::{batch, pipeline, web};

/// Command-line interface glue code: defines the available verbs and dispatches to modules.
#[derive(Parser)]
#[command(name = "modality-classifier")]
#[command(about = "Classificador de modalidade MRI/CT em Rust", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP classification server
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
    /// Classify a single DICOM or raster image file
    Classify {
        file: PathBuf,
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
    /// Convert a DICOM file to an 8-bit JPEG
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Classify every supported file under a directory
    Batch {
        #[arg(short, long)]
        directory: PathBuf,
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse the raw CLI arguments once and dispatch to a subcommand handler.
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, model } => web::start_server(&host, port, &model).await?,
        Commands::Classify { file, model } => {
            let classifier = OnnxClassifier::load(&model)?;
            let outcome = pipeline::classify_file(&classifier, &file)?;
            println!("Arquivo: {:?}", file);
            println!("  Classificação: {}", outcome.modality);
            println!("  Score: {:.4}", outcome.score);
        }
        Commands::Convert { input, output } => {
            let target = pipeline::convert_dicom_to_jpeg(&input, output)?;
            println!("Imagem salva em: {:?}", target);
        }
        Commands::Batch { directory, model } => {
            let classifier = OnnxClassifier::load(&model)?;
            batch::classify_directory(&directory, &classifier)?;
        }
    }

    Ok(())
}
