use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use crate::cli::{load_catalog, OutputFormat};
use crate::core::types::InputFormat;
use crate::matching::engine::{AnalysisConfig, AnalysisEngine, DEFAULT_PATTERN_TIMEOUT};
use crate::parsing::detect_input_format;
use crate::report::{AnalysisReport, HighlightImage};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Molecule text, a SMILES/SMARTS/MOL file, or '-' for stdin
    #[arg(required = true)]
    pub input: String,

    /// Input notation (auto-detected by default)
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,

    /// Path to custom catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Pattern evaluation threads (0 = all cores)
    #[arg(long, default_value = "0")]
    pub threads: usize,

    /// Time limit per pattern, in milliseconds
    #[arg(long, default_value_t = duration_ms(DEFAULT_PATTERN_TIMEOUT))]
    pub pattern_timeout_ms: u64,

    /// Skip highlight images
    #[arg(long, conflicts_with = "image_dir")]
    pub no_images: bool,

    /// Write highlight images to this directory
    #[arg(long)]
    pub image_dir: Option<PathBuf>,
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Execute analyze subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, the catalog cannot be
/// loaded, or images cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AnalyzeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (text, filename) = read_input(&args.input)?;
    let input_format = args
        .input_format
        .unwrap_or_else(|| detect_input_format(&text, filename.as_deref()));

    let catalog = load_catalog(args.catalog.as_ref(), verbose)?;
    let config = AnalysisConfig {
        pattern_timeout: Duration::from_millis(args.pattern_timeout_ms),
        worker_threads: args.threads,
        render_images: !args.no_images,
        ..AnalysisConfig::default()
    };
    let engine = AnalysisEngine::with_config(Arc::new(catalog), config);

    if verbose {
        eprintln!("Reading input as {input_format}");
    }
    let report = engine.analyze_input(&text, input_format)?;

    if let Some(dir) = &args.image_dir {
        let written = write_images(dir, &report)?;
        if verbose {
            eprintln!("Wrote {written} images to {}", dir.display());
        }
    }

    match format {
        OutputFormat::Text => print_text(&report, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Tsv => print_tsv(&report),
    }

    Ok(())
}

/// Input text and, when it came from a file, the file name
fn read_input(input: &str) -> anyhow::Result<(String, Option<String>)> {
    use std::io::{self, Read};

    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok((buffer, None));
    }

    let path = Path::new(input);
    if path.is_file() {
        let text = std::fs::read_to_string(path)?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        return Ok((text, name));
    }

    Ok((input.to_string(), None))
}

fn print_text(report: &AnalysisReport, verbose: bool) {
    println!(
        "Molecule: {} ({} atoms)",
        report.molecular_formula, report.atom_count
    );

    if report.matches.is_empty() {
        println!("\nNo functional groups found.");
    } else {
        println!(
            "\nFunctional groups ({} groups, {} occurrences):\n",
            report.matches.len(),
            report.total_matches()
        );
        let name_width = report.matches.iter().map(String::len).max().unwrap_or(4).max(4);
        for name in &report.matches {
            let Some(group) = report.groups.get(name) else {
                continue;
            };
            let atoms: Vec<String> = group
                .atom_sets
                .iter()
                .map(|set| format!("{:?}", set.as_slice()))
                .collect();
            println!("  {name:<name_width$}  atoms {}", atoms.join(" "));
            if verbose {
                println!("  {:<name_width$}  {}", "", group.hierarchical_path);
                println!("  {:<name_width$}  reactivity: {}", "", group.reactivity);
            }
        }
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  - {warning}");
        }
    }

    if verbose {
        let info = &report.processing;
        println!(
            "\n{} patterns evaluated, {} skipped, {} raw matches, {} resolved, {}ms",
            info.patterns_evaluated,
            info.patterns_skipped,
            info.raw_matches,
            info.resolved_matches,
            info.elapsed_ms
        );
    }
}

fn print_tsv(report: &AnalysisReport) {
    println!("group\tid\tatoms\tspecificity\thierarchical_path");
    for occurrence in &report.occurrences {
        let (id, path) = report
            .groups
            .get(&occurrence.name)
            .map(|g| (g.id.to_string(), g.hierarchical_path.as_str()))
            .unwrap_or_default();
        let atoms: Vec<String> = occurrence.atoms.iter().map(ToString::to_string).collect();
        println!(
            "{}\t{}\t{}\t{}\t{}",
            occurrence.name,
            id,
            atoms.join(","),
            occurrence.priority.specificity,
            path
        );
    }
}

/// Decode and write every image in the report; returns the number written
fn write_images(dir: &Path, report: &AnalysisReport) -> anyhow::Result<usize> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;

    if let Some(image) = &report.combined_image {
        write_image(dir, "combined", image)?;
        written += 1;
    }
    for (name, image) in &report.individual_images {
        write_image(dir, &file_stem(name), image)?;
        written += 1;
    }
    Ok(written)
}

fn write_image(dir: &Path, stem: &str, image: &HighlightImage) -> anyhow::Result<()> {
    let extension = match image.media_type.as_str() {
        "image/png" => "png",
        _ => "svg",
    };
    let bytes = base64::engine::general_purpose::STANDARD.decode(&image.data)?;
    std::fs::write(dir.join(format!("{stem}.{extension}")), bytes)?;
    Ok(())
}

/// Lowercase file stem with runs of other characters collapsed to `_`
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    stem.trim_matches('_').to_string()
}
