//! # structscope: struct layout browser
//!
//! Read-only listing and query engine over a record store of C struct and
//! union declarations, their members and every access to those members.
//!
//! ## Architecture
//!
//! - **[`config`]** - Configuration loading and validation
//! - **[`db`]** - SQLite record store (schema, listings, detail views)
//! - **[`listing`]** - Filter predicates, orderings and bounded pagination
//! - **[`nested`]** - Flattening of anonymous nested aggregates
//! - **[`usage`]** - Unused-member classification
//! - **[`mcp`]** - MCP server exposing the listings as tools (stdio transport via rmcp)

pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod mcp;
pub mod nested;
pub mod usage;
