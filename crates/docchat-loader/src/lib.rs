//! Document loading for docchat.
//!
//! A [`LoaderRegistry`] maps file extensions to [`DocumentParser`]s over the
//! closed set of supported formats. [`DocumentLoader`] resolves a path through
//! the registry, reads the file and runs the parser on the blocking pool.

pub mod loader;
pub mod parsers;
pub mod registry;
pub mod table;

pub use loader::DocumentLoader;
pub use registry::{DocumentParser, LoaderRegistry};
