//! The uploaded tracks: model types, path collection and tag parsing.

mod metadata;
mod model;
mod scan;

pub use metadata::{LoftyParser, MetadataError, MetadataOutcome, MetadataParser};
pub use model::*;
pub use scan::collect_audio_paths;
