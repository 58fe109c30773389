use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Snow product sample value (class codes fit in a signed 16-bit integer)
pub type Sample = i16;

/// 2D snow product grid (rows x cols)
pub type RasterGrid = Array2<Sample>;

/// Classic geostationary (MSG/SEVIRI) projection on the MSG reference spheroid
pub const GEOS_WKT: &str = r#"PROJCS["unknown",GEOGCS["GCS_unknown",DATUM["D_unknown",SPHEROID["unknown",6378169,295.488065897014]],PRIMEM["Greenwich",0],UNIT["Degree",0.0174532925199433]],PROJECTION["Geostationary_Satellite"],PARAMETER["central_meridian",0],PARAMETER["satellite_height",35785831],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH]]"#;

/// Next-generation geostationary (MTG/FCI) projection on the GRS80 spheroid.
///
/// Spheroid and satellite height follow the EUMETSAT MTG FCI level-1c grid definition.
pub const GEOS_NEXT_GEN_WKT: &str = r#"PROJCS["unknown",GEOGCS["GCS_unknown",DATUM["D_unknown",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["Degree",0.0174532925199433]],PROJECTION["Geostationary_Satellite"],PARAMETER["central_meridian",0],PARAMETER["satellite_height",35786400],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH]]"#;

/// Geographic WGS84 (EPSG:4326)
pub const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

/// North polar Lambert Azimuthal Equal-Area on WGS84, as registered for EPSG:6931 (EASE-Grid 2.0 North)
pub const LAEA_NORTH_WKT: &str = r#"PROJCS["WGS 84 / NSIDC EASE-Grid 2.0 North",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]]],PROJECTION["Lambert_Azimuthal_Equal_Area"],PARAMETER["latitude_of_center",90],PARAMETER["longitude_of_center",0],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","6931"]]"#;

/// Container format a product is distributed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFormat {
    /// HDF5 / netCDF-4 container
    Hdf5,
    /// GRIB edition 2 message file
    Grib2,
}

impl DataFormat {
    /// File extensions accepted for this format (compared case-insensitively)
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            DataFormat::Hdf5 => &["h5", "hdf", "hdf5"],
            DataFormat::Grib2 => &["grib2", "grb2", "grib"],
        }
    }

    /// Whether `path` carries one of this format's extensions
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions()
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::Hdf5 => write!(f, "HDF5"),
            DataFormat::Grib2 => write!(f, "GRIB2"),
        }
    }
}

/// Closed set of projections a product grid can be delivered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceProjection {
    /// MSG full-disk geostationary view
    Geostationary,
    /// MTG full-disk geostationary view
    GeostationaryNextGen,
    /// Regular latitude/longitude grid
    GeographicWgs84,
    /// North polar Lambert Azimuthal Equal-Area
    LaeaPolar,
}

impl SourceProjection {
    /// Projection definition string written into the raster
    pub fn wkt(&self) -> &'static str {
        match self {
            SourceProjection::Geostationary => GEOS_WKT,
            SourceProjection::GeostationaryNextGen => GEOS_NEXT_GEN_WKT,
            SourceProjection::GeographicWgs84 => WGS84_WKT,
            SourceProjection::LaeaPolar => LAEA_NORTH_WKT,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, SourceProjection::GeographicWgs84)
    }
}

impl std::fmt::Display for SourceProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceProjection::Geostationary => write!(f, "GEOS"),
            SourceProjection::GeostationaryNextGen => write!(f, "GEOS-NG"),
            SourceProjection::GeographicWgs84 => write!(f, "WGS84"),
            SourceProjection::LaeaPolar => write!(f, "LAEA-N"),
        }
    }
}

/// Coordinate reference requested for the final output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetCrs {
    /// Geographic WGS84 (EPSG:4326)
    #[default]
    Geographic,
    /// Keep the product's own projection
    Native,
}

impl TargetCrs {
    /// Authority code handed to the warp backend
    pub const GEOGRAPHIC_CODE: &'static str = "EPSG:4326";

    pub fn is_geographic(&self) -> bool {
        matches!(self, TargetCrs::Geographic)
    }
}

impl FromStr for TargetCrs {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "4326" | "EPSG:4326" | "WGS84" => Ok(TargetCrs::Geographic),
            "GEOS" | "NATIVE" => Ok(TargetCrs::Native),
            other => Err(GeoError::InvalidInput(format!(
                "Invalid CRS '{}'. Valid options are: 4326, GEOS",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TargetCrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetCrs::Geographic => write!(f, "4326"),
            TargetCrs::Native => write!(f, "GEOS"),
        }
    }
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Coefficients in GDAL order
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    pub fn from_array(gt: &[f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// Both pixel sizes are finite and non-zero
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
            && self.pixel_width != 0.0
            && self.pixel_height != 0.0
    }

    /// Projected coordinate of a pixel corner
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.top_left_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.top_left_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }
}

/// Error types for product geocoding
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Unknown product code: {0}")]
    UnknownProduct(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch for {product}: expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        product: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Raster write error: {0}")]
    Write(String),

    #[error("Reprojection error: {0}")]
    Reprojection(String),

    #[error("Container read error: {0}")]
    Read(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for geocoding operations
pub type GeoResult<T> = Result<T, GeoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_target_crs_parsing() {
        assert_eq!("4326".parse::<TargetCrs>().unwrap(), TargetCrs::Geographic);
        assert_eq!("epsg:4326".parse::<TargetCrs>().unwrap(), TargetCrs::Geographic);
        assert_eq!("GEOS".parse::<TargetCrs>().unwrap(), TargetCrs::Native);
        assert_eq!(" native ".parse::<TargetCrs>().unwrap(), TargetCrs::Native);
        assert!(matches!(
            "3857".parse::<TargetCrs>(),
            Err(GeoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_format_extensions() {
        assert!(DataFormat::Hdf5.accepts(&PathBuf::from("h10_20240106_day_merged.H5")));
        assert!(DataFormat::Hdf5.accepts(&PathBuf::from("a/b/file.hdf")));
        assert!(!DataFormat::Hdf5.accepts(&PathBuf::from("file.grib2")));
        assert!(DataFormat::Grib2.accepts(&PathBuf::from("h35_20240106_day_merged.grib2")));
        assert!(!DataFormat::Grib2.accepts(&PathBuf::from("no_extension")));
    }

    #[test]
    fn test_geotransform_array_roundtrip() {
        let gt = [3770007.5181810227, -3000.4031658172607, 0.0, 2635854.6990046464, 0.0, 3000.4031658172607];
        let transform = GeoTransform::from_array(&gt);
        assert_eq!(transform.to_array(), gt);
        assert!(transform.is_valid());

        let (x, y) = transform.pixel_to_world(1.0, 2.0);
        assert_eq!(x, gt[0] + gt[1]);
        assert_eq!(y, gt[3] + 2.0 * gt[5]);
    }

    #[test]
    fn test_only_wgs84_is_geographic() {
        assert!(SourceProjection::GeographicWgs84.is_geographic());
        assert!(!SourceProjection::Geostationary.is_geographic());
        assert!(!SourceProjection::GeostationaryNextGen.is_geographic());
        assert!(!SourceProjection::LaeaPolar.is_geographic());
    }
}
