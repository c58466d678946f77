//! # foodex
//!
//! A batch exporter that turns the OpenFoodFacts TSV product dump into a
//! queryable SQLite database with normalized lookup tables and FTS5
//! full-text search indexes.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌───────────────────┐   ┌─────────────────┐
//! │ TSV dump │──▶│ filter + normalize │──▶│ batched inserts │
//! └──────────┘   └───────────────────┘   └────────┬────────┘
//!                                                 │
//!                                                 ▼
//!                                    ┌─────────────────────────┐
//!                                    │ lookups, pivots, FTS5   │
//!                                    │ (one transaction)       │
//!                                    └─────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! foodex export --csv ~/Downloads/en.openfoodfacts.org.products.csv \
//!               --sqlite ./food.sqlite
//! foodex search "oat" --index food --sqlite ./food.sqlite
//! foodex stats --sqlite ./food.sqlite
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and path expansion |
//! | [`models`] | Core data types |
//! | [`extract`] | Header-indexed field access |
//! | [`filter`] | Row inclusion predicates |
//! | [`normalize`] | Field value cleaning |
//! | [`loader`] | Batched transactional inserts |
//! | [`schema`] | Schema reset and derived-table builder |
//! | [`pipeline`] | The export driver loop |
//! | [`search`] | FTS5 keyword search |
//! | [`stats`] | Database statistics |
//! | [`db`] | Database connection |

pub mod config;
pub mod db;
pub mod extract;
pub mod filter;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod search;
pub mod stats;
