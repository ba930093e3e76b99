//! Core parsing logic for NAV bulletins

pub mod batch;
pub mod error;
pub mod line;
pub mod money;
pub mod parser;
pub mod record;

// Re-export main types for cleaner imports
pub use error::{ParseError, RecordError};
pub use line::{LineKind, classify};
pub use money::NumberPolicy;
pub use parser::{NavParser, Records};
pub use record::{Amc, Category, MutualFund, NavRecord};
