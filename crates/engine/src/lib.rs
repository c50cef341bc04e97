//! `opendine-engine`: restaurant identity resolution and table assembly.
//!
//! Pure pipeline crate: receives pre-loaded CSV text and edit directives,
//! returns typed output tables, merge conflicts and run statistics.
//! No CLI or filesystem dependencies.

pub mod address;
pub mod assemble;
pub mod branch;
pub mod config;
pub mod edits;
pub mod error;
pub mod format;
pub mod ids;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod raw;
pub mod resolver;
pub mod schema;
pub mod stats;

pub use config::PipelineConfig;
pub use error::EngineError;
pub use ids::IdGenerator;
pub use model::{InspectionRow, MergeConflict, RestaurantRecord, SidewalkInspectionRecord};
pub use pipeline::{run, RunInput, RunOutput};
pub use raw::{DatasetKind, RawRegistry, RawTable};
pub use schema::{TableName, Tables};
