//! Read-only SQLite reader for Firefox-family `places.sqlite` history stores.
//!
//! A [`SourceReader`] validates a store once per path, then hands out a
//! [`Session`] that owns (or borrows) the connection. Sessions prepare the
//! fixed visit, site-metadata and combined queries; their [`Rows`] are pulled
//! lazily and the connection is released when the session is dropped.

mod decode;
mod reader;
mod rows;
mod schema;
mod source;

pub mod error;

pub use error::{Error, Result};
pub use reader::{PlacesProbe, SchemaProbe, SourceReader, Strategy};
pub use rows::{FromStoreRow, Query, Rows};
pub use source::{Session, Source};
