//! Command-line interface for fg-analyzer.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **analyze**: Find the functional groups in a molecule
//! - **catalog**: List, show, search, validate or export the functional group catalog
//! - **serve**: Start the JSON API server
//!
//! ## Usage
//!
//! ```text
//! # Analyze a SMILES string
//! fg-analyzer analyze "CC(=O)Oc1ccccc1C(=O)O"
//!
//! # Analyze a MOL file and save highlight images
//! fg-analyzer analyze aspirin.mol --image-dir images/
//!
//! # Pipe from another tool, JSON output for scripting
//! obabel input.sdf -osmi | fg-analyzer analyze - --format json
//!
//! # Search the catalog
//! fg-analyzer catalog search amine
//!
//! # Start the API server
//! fg-analyzer serve --port 8080 --open
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::store::PatternCatalog;

pub mod analyze;
pub mod catalog;

#[derive(Parser)]
#[command(name = "fg-analyzer")]
#[command(version)]
#[command(about = "Identify functional groups in molecules from SMILES, SMARTS or MOL input")]
#[command(
    long_about = "fg-analyzer matches a molecule against a curated catalog of functional group patterns.\n\nOverlapping matches are resolved deterministically, so nested groups are reported once:\n- Carboxylic acid rather than carbonyl plus hydroxyl\n- Phenol rather than hydroxyl plus benzene ring\n- Every occurrence of a repeated group, such as both hydroxyls of a diol"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the functional groups in a molecule
    Analyze(analyze::AnalyzeArgs),

    /// Inspect the functional group catalog
    Catalog(catalog::CatalogArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Pattern evaluation threads (0 = all cores)
    #[arg(long, default_value = "0")]
    pub threads: usize,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load a custom catalog, or the embedded one
pub(crate) fn load_catalog(path: Option<&PathBuf>, verbose: bool) -> anyhow::Result<PatternCatalog> {
    let catalog = match path {
        Some(path) => PatternCatalog::load_from_file(path)?,
        None => PatternCatalog::load_embedded()?,
    };

    if verbose {
        eprintln!("Loaded catalog with {} functional groups", catalog.len());
        for warning in catalog.load_warnings() {
            eprintln!("  dropped: {warning}");
        }
    }
    Ok(catalog)
}
