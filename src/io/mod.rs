//! I/O modules for reading product containers and writing GeoTIFFs

pub mod container;
pub mod loader;
pub mod geotiff;

pub use container::{ContainerReader, GdalContainerReader};
pub use loader::{validate_input, ProductLoader};
pub use geotiff::{validate_output, Compression, GeoTiffWriter, RasterWriter, StagedRaster, WrittenRaster};
