//! rscript-core
//!
//! Format support and text round-trip algorithms for RScript `.gsc`
//! script containers: the header/string-pool model, the string extractor
//! that produces translator sidecar files, the slot reflow engine that
//! re-inserts translated text into the fixed byte layout, and the engine
//! archive unpacker.

pub mod batch;
pub mod extract;
pub mod format;
pub mod reflow;

pub use extract::{scan_string_pool, StringEntry};
pub use format::{Archive, ScriptContainer, ScriptHeader, Translation};
pub use reflow::{reflow, Strategy};
