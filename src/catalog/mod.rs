//! Functional group catalog storage and search.
//!
//! The catalog holds the pattern definitions used by the analysis engine, with
//! their descriptions, classification and cross-references. An embedded catalog
//! is compiled into the binary, but custom catalogs can also be loaded from JSON
//! files (plain or gzip-compressed).
//!
//! ## Loading
//!
//! Every entry's SMARTS is checked at load. An entry whose primary pattern fails
//! but whose `simplified` pattern parses is kept and evaluated with the simplified
//! pattern; an entry with neither is dropped and reported through
//! [`PatternCatalog::load_warnings`]. Duplicate names are fatal.
//!
//! ## Example
//!
//! ```rust
//! use fg_analyzer::PatternCatalog;
//!
//! let catalog = PatternCatalog::load_embedded().unwrap();
//!
//! let acid = catalog.get("Carboxylic acid").unwrap();
//! println!("{}: {}", acid.name, acid.smarts);
//!
//! for hit in catalog.search("ester") {
//!     println!("{} ({})", hit.name, hit.id);
//! }
//! ```
//!
//! ## Custom Catalogs
//!
//! ```rust,no_run
//! use fg_analyzer::PatternCatalog;
//! use std::path::Path;
//!
//! let catalog = PatternCatalog::load_embedded().unwrap();
//! std::fs::write("my_catalog.json", catalog.to_json().unwrap()).unwrap();
//!
//! let custom = PatternCatalog::load_from_file(Path::new("my_catalog.json")).unwrap();
//! ```

pub mod index;
pub mod store;
