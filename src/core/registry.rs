//! Static table of supported snow products and their fixed grid geometry

use crate::types::{DataFormat, GeoError, GeoResult, GeoTransform, SourceProjection, TargetCrs};
use serde::Serialize;

/// Everything needed to georeference one product's grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDefinition {
    /// Product code, upper case (e.g. "H10")
    pub code: &'static str,
    pub description: &'static str,
    /// Container format the product is distributed in
    pub data_format: DataFormat,
    /// Projection the grid is defined in
    pub source_projection: SourceProjection,
    /// Affine pixel-to-projection mapping after orientation correction
    pub geo_transform: GeoTransform,
    /// Variable holding the snow field inside the container
    pub variable_key: &'static str,
    /// (rows, cols)
    pub expected_shape: (usize, usize),
    /// Raw array must be rotated 180 degrees to match `geo_transform`
    pub requires_vertical_flip: bool,
}

impl ProductDefinition {
    /// Whether producing `target` needs a warp after the native write
    pub fn needs_reprojection(&self, target: TargetCrs) -> bool {
        !self.source_projection.is_geographic() && target.is_geographic()
    }

    pub fn rows(&self) -> usize {
        self.expected_shape.0
    }

    pub fn cols(&self) -> usize {
        self.expected_shape.1
    }
}

/// MSG/SEVIRI pixel size at sub-satellite point (metres)
const SEVIRI_PIXEL: f64 = 3000.4031658172607;

static PRODUCTS: &[ProductDefinition] = &[
    ProductDefinition {
        code: "H10",
        description: "Snow detection (SN-OBS-1), MSG/SEVIRI, Europe window",
        data_format: DataFormat::Hdf5,
        source_projection: SourceProjection::Geostationary,
        geo_transform: GeoTransform {
            top_left_x: 3770007.5181810227,
            pixel_width: -SEVIRI_PIXEL,
            rotation_x: 0.0,
            top_left_y: 2635854.6990046464,
            rotation_y: 0.0,
            pixel_height: SEVIRI_PIXEL,
        },
        variable_key: "SC",
        expected_shape: (916, 1902),
        requires_vertical_flip: true,
    },
    ProductDefinition {
        code: "H11",
        description: "Snow status (dry/wet) by microwave radiometry, Europe, 0.25 deg",
        data_format: DataFormat::Grib2,
        source_projection: SourceProjection::GeographicWgs84,
        geo_transform: GeoTransform {
            top_left_x: -25.125,
            pixel_width: 0.25,
            rotation_x: 0.0,
            top_left_y: 75.125,
            rotation_y: 0.0,
            pixel_height: -0.25,
        },
        variable_key: "rssc",
        expected_shape: (201, 281),
        requires_vertical_flip: false,
    },
    ProductDefinition {
        code: "H12",
        description: "Effective snow cover by VIS/IR radiometry, Europe, 0.01 deg",
        data_format: DataFormat::Grib2,
        source_projection: SourceProjection::GeographicWgs84,
        geo_transform: GeoTransform {
            top_left_x: -25.005,
            pixel_width: 0.01,
            rotation_x: 0.0,
            top_left_y: 75.005,
            rotation_y: 0.0,
            pixel_height: -0.01,
        },
        variable_key: "rssc",
        expected_shape: (5001, 7001),
        requires_vertical_flip: false,
    },
    ProductDefinition {
        code: "H13",
        description: "Snow water equivalent by microwave radiometry, Europe, 0.25 deg",
        data_format: DataFormat::Grib2,
        source_projection: SourceProjection::GeographicWgs84,
        geo_transform: GeoTransform {
            top_left_x: -25.125,
            pixel_width: 0.25,
            rotation_x: 0.0,
            top_left_y: 75.125,
            rotation_y: 0.0,
            pixel_height: -0.25,
        },
        variable_key: "rssc",
        expected_shape: (201, 281),
        requires_vertical_flip: false,
    },
    ProductDefinition {
        code: "H34",
        description: "Snow detection, MSG/SEVIRI full disk",
        data_format: DataFormat::Hdf5,
        source_projection: SourceProjection::Geostationary,
        geo_transform: GeoTransform {
            top_left_x: 5567248.074173927,
            pixel_width: -SEVIRI_PIXEL,
            rotation_x: 0.0,
            top_left_y: -5567248.074173927,
            rotation_y: 0.0,
            pixel_height: SEVIRI_PIXEL,
        },
        variable_key: "SC",
        expected_shape: (3712, 3712),
        requires_vertical_flip: true,
    },
    ProductDefinition {
        code: "H35",
        description: "Effective snow cover, multi-sensor, Northern Hemisphere, 0.01 deg",
        data_format: DataFormat::Grib2,
        source_projection: SourceProjection::GeographicWgs84,
        geo_transform: GeoTransform {
            top_left_x: -179.995,
            pixel_width: 0.01,
            rotation_x: 0.0,
            top_left_y: 89.995,
            rotation_y: 0.0,
            pixel_height: -0.01,
        },
        variable_key: "rssc",
        expected_shape: (8999, 35999),
        requires_vertical_flip: false,
    },
];

/// Every registered product, in code order
pub fn products() -> &'static [ProductDefinition] {
    PRODUCTS
}

/// Resolve a product code (case-insensitive) to its definition
pub fn lookup(code: &str) -> GeoResult<&'static ProductDefinition> {
    let wanted = code.trim();
    PRODUCTS
        .iter()
        .find(|product| product.code.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| GeoError::UnknownProduct(wanted.to_string()))
}

/// Comma-separated list of registered codes, for error messages
pub fn known_codes() -> String {
    PRODUCTS
        .iter()
        .map(|product| product.code)
        .collect::<Vec<_>>()
        .join(", ")
}
