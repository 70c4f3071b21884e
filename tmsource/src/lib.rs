#![cfg_attr(doc, doc = include_str!("../README.md"))]
#![forbid(unsafe_code)]

pub mod args;
pub mod logging;

mod error;
pub use error::{TmSourceError, TmSourceResult};

mod loader;
pub use loader::{DOCUMENT_FILE, DocumentLoader, FsLoader, SCHEME, SourceLocation};

mod pipeline;
pub use pipeline::{ReadySource, SourcePipeline, Stage};

mod registrar;
pub use registrar::{RegisteredSources, TileRegistrar};
