#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod confirmation;
pub mod pipeline;
pub mod report;
pub mod result;
pub mod source;
pub mod unit;

pub use confirmation::{ConfirmationProvider, StaticConfirmation, TerminalConfirmation};
pub use pipeline::{SeedConfig, SeedOptions, SeedPipeline, SeedTuning};
pub use result::{SeedResult, SeedSummary};
pub use source::{LoadError, SeedBundle, SourceLoader};
pub use unit::SeedUnit;
