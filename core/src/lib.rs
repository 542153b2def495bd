//! Branch-level flow analysis for hub-and-spoke sorting decisions.
//!
//! Two read paths over the loaded data:
//!   - the bagging pipeline: threshold bagging → elbow-based optimal
//!     branch selection → optimal / non-optimal flow decomposition;
//!   - the hierarchical query engine: filtered sums over the raw
//!     origin × destination matrix.
//!
//! Every function takes its inputs explicitly and returns a freshly built
//! result. Nothing is cached or mutated between runs.

pub mod bagging;
pub mod config;
pub mod coverage;
pub mod decomposition;
pub mod directory;
pub mod elbow;
pub mod error;
pub mod flow_table;
pub mod ingest;
pub mod matrix;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod selector;
pub mod sorting;
pub mod synthetic;
pub mod types;

pub use error::{BagError, BagResult};
