//! Record types and merge logic for browser history extraction.
//!
//! This crate is deliberately free of database dependencies. The SQLite
//! reader (`hist-store-sqlite`) produces the raw records defined here and the
//! CLI consumes the merged [`Visit`]s.

pub mod dedup;
pub mod merge;
pub mod record;

pub use merge::{SiteIndex, merge};
pub use record::{RawSiteMetadata, RawVisit, Visit};
