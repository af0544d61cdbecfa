//! Loading and validation of the cachexia metabolite dataset.
//!
//! Reads the CSV into an immutable [`WorkingTable`]: renamed metabolite
//! columns, parsed labels, and a `time_points` factor derived from the
//! sample identifiers.

mod domain;
mod error;
mod reader;
mod time_points;

pub use domain::{Label, Metabolite, SampleId, TimePoint, WorkingTable};
pub use error::IoError;
pub use reader::{SampleReader, canonical_name};
pub use time_points::{Anchor, TimePointRule, TimePointRules};
