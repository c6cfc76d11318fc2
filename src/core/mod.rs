//! Core data types for functional group analysis.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Molecule`]: Immutable molecular graph with ring perception
//! - [`PatternDefinition`]: A functional group definition from the catalog
//! - [`RawMatch`], [`ResolvedMatch`], [`AtomSet`]: Occurrences before and after overlap resolution
//! - [`GroupId`], [`InputFormat`], [`AnalysisWarning`]: Identifiers and request metadata
//!
//! ## Atom Indices
//!
//! Every atom keeps the zero-based index it was given by the parser. Match atom
//! sets, highlight images and reports all refer to atoms by this index, so a
//! resolved match can always be checked against the input molecule.
//!
//! [`Molecule`]: molecule::Molecule
//! [`PatternDefinition`]: pattern::PatternDefinition
//! [`RawMatch`]: matches::RawMatch
//! [`ResolvedMatch`]: matches::ResolvedMatch
//! [`AtomSet`]: matches::AtomSet
//! [`GroupId`]: types::GroupId
//! [`InputFormat`]: types::InputFormat
//! [`AnalysisWarning`]: types::AnalysisWarning

pub mod element;
pub mod matches;
pub mod molecule;
pub mod pattern;
pub mod types;
