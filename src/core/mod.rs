//! Product registry, reprojection and pipeline orchestration

pub mod registry;
pub mod reproject;
pub mod pipeline;
pub mod batch;

// Re-export main types
pub use registry::{lookup, products, ProductDefinition};
pub use reproject::{GdalWarpReprojector, Reprojector, Resampling};
pub use pipeline::{geocode, Geocoder, GeocodeOptions, Milestone, NoProgress, Progress, Stage};
pub use batch::{default_output_path, run_batch, BatchJob, BatchReport};
