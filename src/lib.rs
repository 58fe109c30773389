//! snowgeo: geocoding for H-SAF snow products
//!
//! Turns HDF5 and GRIB2 snow grids into GeoTIFFs, either in the product's own
//! projection or warped to geographic WGS84. Each product code resolves to a
//! fixed grid geometry in [`core::registry`]; the pipeline in
//! [`core::pipeline`] loads, writes and, when needed, reprojects one file.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    DataFormat, GeoError, GeoResult, GeoTransform, RasterGrid, SourceProjection, TargetCrs,
};

pub use core::{geocode, lookup, products, Geocoder, GeocodeOptions, ProductDefinition};
pub use io::{ContainerReader, GdalContainerReader, GeoTiffWriter, RasterWriter};
