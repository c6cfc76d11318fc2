use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::catalog::store::{PatternCatalog, PatternSource};
use crate::cli::{load_catalog, OutputFormat};
use crate::core::pattern::{GroupSummary, PatternDefinition};

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List the functional groups in the catalog
    List {
        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Filter by category or subcategory (e.g., "Oxygen")
        #[arg(long)]
        category: Option<String>,

        /// Filter by reactivity (e.g., "acidic")
        #[arg(long)]
        reactivity: Option<String>,
    },

    /// Show details of a functional group
    Show {
        /// Group name (e.g., "Carboxylic acid")
        #[arg(required = true)]
        name: String,

        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Search names, descriptions, categories and reactions
    Search {
        #[arg(required = true)]
        term: String,

        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List every category and subcategory
    Categories {
        /// Path to custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Check a catalog file and report unusable entries
    Validate {
        /// Catalog file (JSON, optionally gzip-compressed)
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Export the catalog to a file
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        /// Path to custom catalog file to export (defaults to embedded)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

/// Execute catalog subcommand
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, a group is not found, or
/// the export cannot be written.
pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::List {
            catalog,
            category,
            reactivity,
        } => run_list(
            catalog,
            category.as_deref(),
            reactivity.as_deref(),
            format,
            verbose,
        ),
        CatalogCommands::Show { name, catalog } => run_show(&name, catalog, format, verbose),
        CatalogCommands::Search { term, catalog } => run_search(&term, catalog, format, verbose),
        CatalogCommands::Categories { catalog } => run_categories(catalog, format, verbose),
        CatalogCommands::Validate { file } => run_validate(file, format),
        CatalogCommands::Export { output, catalog } => run_export(output, catalog, verbose),
    }
}

fn run_list(
    catalog_path: Option<PathBuf>,
    category_filter: Option<&str>,
    reactivity_filter: Option<&str>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path.as_ref(), verbose)?;

    let mut filtered: Vec<&PatternDefinition> = match category_filter {
        Some(category) => catalog.groups_by_category(category),
        None => catalog.groups().iter().collect(),
    };
    if let Some(reactivity) = reactivity_filter {
        let needle = reactivity.to_lowercase();
        filtered.retain(|g| g.reactivity.to_lowercase().contains(&needle));
    }

    let summaries: Vec<GroupSummary> = filtered.iter().map(|g| g.summary()).collect();
    print_summaries(
        &format!("Functional Group Catalog ({} groups)", summaries.len()),
        &summaries,
        format,
    )
}

fn run_show(
    name: &str,
    catalog_path: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path.as_ref(), verbose)?;

    let group = catalog
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("Functional group '{}' not found", name))?;

    match format {
        OutputFormat::Text => {
            println!("Functional group: {}\n", group.name);
            println!("ID:          {}", group.id);
            println!("Path:        {}", group.hierarchical_path());
            println!("SMARTS:      {}", group.smarts);
            if let Some(simplified) = &group.simplified {
                println!("Simplified:  {simplified}");
            }
            println!("Specificity: {}", group.rank());
            println!("Generic:     {}", group.generic);
            println!("Reactivity:  {}", group.reactivity);

            if !group.description.is_empty() {
                println!("\nDescription: {}", group.description);
            }
            if !group.examples.is_empty() {
                println!("\nExamples: {}", group.examples.join(", "));
            }
            if !group.common_reactions.is_empty() {
                println!("\nCommon reactions:");
                for reaction in &group.common_reactions {
                    println!("  - {reaction}");
                }
            }
            if let Some(chebi) = &group.chebi_id {
                println!("\nChEBI: {chebi}");
                if let Some(description) = &group.chebi_description {
                    println!("  {description}");
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(group)?);
        }
        OutputFormat::Tsv => {
            println!("field\tvalue");
            println!("id\t{}", group.id);
            println!("name\t{}", group.name);
            println!("smarts\t{}", group.smarts);
            println!("simplified\t{}", group.simplified.as_deref().unwrap_or(""));
            println!("specificity\t{}", group.rank());
            println!("generic\t{}", group.generic);
            println!("reactivity\t{}", group.reactivity);
            println!("hierarchical_path\t{}", group.hierarchical_path());
            println!("chebi_id\t{}", group.chebi_id.as_deref().unwrap_or(""));
        }
    }

    Ok(())
}

fn run_search(
    term: &str,
    catalog_path: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path.as_ref(), verbose)?;
    let results = catalog.search(term);
    print_summaries(
        &format!("Search results for '{term}' ({} groups)", results.len()),
        &results,
        format,
    )
}

fn run_categories(
    catalog_path: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path.as_ref(), verbose)?;
    let categories = catalog.all_categories();

    match format {
        OutputFormat::Text | OutputFormat::Tsv => {
            for category in &categories {
                let count = catalog.groups_by_category(category).len();
                if matches!(format, OutputFormat::Tsv) {
                    println!("{category}\t{count}");
                } else {
                    println!("{category} ({count})");
                }
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "categories": categories }))?
            );
        }
    }
    Ok(())
}

fn run_validate(file: PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = PatternCatalog::load_from_file(&file)?;
    let fallbacks: Vec<&str> = catalog
        .groups()
        .iter()
        .enumerate()
        .filter(|(i, _)| catalog.pattern_source(*i) == PatternSource::Fallback)
        .map(|(_, g)| g.name.as_str())
        .collect();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "valid": catalog.load_warnings().is_empty(),
                "total_groups": catalog.len(),
                "using_simplified": fallbacks,
                "dropped": catalog.load_warnings(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            println!("{}: {} usable functional groups", file.display(), catalog.len());
            for name in &fallbacks {
                println!("  simplified pattern used: {name}");
            }
            for warning in catalog.load_warnings() {
                println!("  dropped: {warning}");
            }
            if catalog.load_warnings().is_empty() {
                println!("Catalog is valid.");
            }
        }
    }

    if catalog.load_warnings().is_empty() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} catalog entries are unusable",
            catalog.load_warnings().len()
        )
    }
}

fn run_export(output: PathBuf, catalog_path: Option<PathBuf>, verbose: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path.as_ref(), verbose)?;
    let json = catalog.to_json()?;
    std::fs::write(&output, json)?;
    println!(
        "Exported {} functional groups to {}",
        catalog.len(),
        output.display()
    );
    Ok(())
}

fn print_summaries(title: &str, groups: &[GroupSummary], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let id_width = groups.iter().map(|g| g.id.0.len()).max().unwrap_or(2).max(2);
            let name_width = groups
                .iter()
                .map(|g| g.name.len().min(30))
                .max()
                .unwrap_or(4)
                .max(4);
            let category_width = groups
                .iter()
                .map(|g| g.categories.join(", ").len().min(30))
                .max()
                .unwrap_or(8)
                .max(8);

            println!("{title}\n");
            println!(
                "{:<id_w$} {:<name_w$} {:<cat_w$} SMARTS",
                "ID",
                "Name",
                "Category",
                id_w = id_width,
                name_w = name_width,
                cat_w = category_width
            );
            println!("{}", "-".repeat(id_width + name_width + category_width + 30));

            for g in groups {
                println!(
                    "{:<id_w$} {:<name_w$} {:<cat_w$} {}",
                    g.id.0,
                    truncate(&g.name, name_width),
                    truncate(&g.categories.join(", "), category_width),
                    g.smarts,
                    id_w = id_width,
                    name_w = name_width,
                    cat_w = category_width
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(groups)?);
        }
        OutputFormat::Tsv => {
            println!("id\tname\tcategories\treactivity\tsmarts");
            for g in groups {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    g.id,
                    g.name,
                    g.categories.join(","),
                    g.reactivity,
                    g.smarts
                );
            }
        }
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ester", 10), "Ester");
        assert_eq!(truncate("Carboxylic acid", 10), "Carboxy...");
    }
}
