//! JSON API for functional group analysis.
//!
//! This module provides an HTTP interface using Axum. Analyses run on the
//! blocking thread pool so slow molecules do not stall other requests.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! fg-analyzer serve
//!
//! # Custom port and auto-open browser
//! fg-analyzer serve --port 3000 --open
//!
//! # Bind to all interfaces with a custom catalog
//! fg-analyzer serve --address 0.0.0.0 --catalog groups.json
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /` - Service description and endpoint list
//! - `GET /api/health` - Service status and catalog size
//! - `POST /api/analyze` - Analyze a molecule (`{"input": "...", "type": "auto"}`)
//! - `GET /api/functional-groups` - List groups (`?offset=0&limit=50`)
//! - `GET /api/functional-groups/{name}` - One group's full definition
//! - `GET /api/search/{term}` - Search names, descriptions and categories
//! - `GET /api/categories` - All categories and subcategories

pub mod format_detection;
pub mod server;
