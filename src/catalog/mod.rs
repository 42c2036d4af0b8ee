//! Game catalog subsystem
//!
//! Loads the list of playable titles from the catalog document once at
//! startup:
//!
//! 1. [`loader`] - opens the source and streams markup events
//! 2. [`parser`] - validates tags and depth, builds records, reports problems
//! 3. [`store`] - holds the committed records for the menu
//!
//! ```text
//! games.xml ──► CatalogLoader ──► CatalogParser ──► CatalogStore
//!               (8 KiB chunks)    (per-record       (read-only after
//!                                  rollback)          startup)
//! ```

pub mod error;
pub mod loader;
pub mod parser;
pub mod record;
pub mod store;

pub use error::{CatalogDiagnostic, LoadError};
pub use loader::{load_catalog, CatalogLoader, CatalogSource, FileSource, MemorySource, CHUNK_SIZE};
pub use parser::{CatalogParser, CatalogTag, ParserState, TagFlags};
pub use record::{GameRecord, DEFAULT_BOX_IMAGE, DEFAULT_YEAR_TEXT, MAX_GENRES, MAX_INFO_LINES};
pub use store::{CatalogCursor, CatalogStore};
