use crate::types::{DataFormat, GeoError, GeoResult, RasterGrid, Sample};
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::path::Path;

/// Reads one named 2D variable out of a scientific-data container
pub trait ContainerReader {
    /// Extract `variable` from the file at `path` as a (rows, cols) grid
    fn read_variable(&self, path: &Path, format: DataFormat, variable: &str) -> GeoResult<RasterGrid>;
}

/// Container reader backed by GDAL's HDF5 and GRIB drivers
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalContainerReader;

impl GdalContainerReader {
    pub fn new() -> Self {
        Self
    }

    /// HDF5 variables are exposed by GDAL as subdatasets
    fn read_hdf5(path: &Path, variable: &str) -> GeoResult<RasterGrid> {
        let container = Dataset::open(path)
            .map_err(|e| GeoError::Read(format!("Failed to open {}: {}", path.display(), e)))?;

        let subdatasets = container.metadata_domain("SUBDATASETS").unwrap_or_default();
        log::debug!("{} exposes {} subdataset entries", path.display(), subdatasets.len());

        let name = find_subdataset(&subdatasets, variable)
            .unwrap_or_else(|| format!("HDF5:\"{}\"://{}", path.display(), variable));
        log::debug!("Opening subdataset {}", name);

        let dataset = Dataset::open(Path::new(&name)).map_err(|e| {
            GeoError::Read(format!(
                "Variable '{}' not found in {}: {}",
                variable,
                path.display(),
                e
            ))
        })?;

        read_band(&dataset, 1)
    }

    /// GRIB messages are exposed by GDAL as bands
    fn read_grib(path: &Path, variable: &str) -> GeoResult<RasterGrid> {
        let dataset = Dataset::open(path)
            .map_err(|e| GeoError::Read(format!("Failed to open {}: {}", path.display(), e)))?;

        let band_count = dataset.raster_count();
        log::debug!("{} holds {} GRIB message(s)", path.display(), band_count);

        for index in 1..=band_count {
            let band = dataset.rasterband(index)?;
            let element = band.metadata_item("GRIB_ELEMENT", "");
            let short_name = band.metadata_item("GRIB_SHORT_NAME", "");
            let description = band.description().ok();

            if band_matches(variable, &[element, short_name, description]) {
                log::debug!("Variable '{}' found in band {}", variable, index);
                return read_band(&dataset, index);
            }
        }

        if band_count == 1 {
            log::warn!(
                "No band of {} is labelled '{}'; using its only band",
                path.display(),
                variable
            );
            return read_band(&dataset, 1);
        }

        Err(GeoError::Read(format!(
            "Variable '{}' not found among {} bands of {}",
            variable,
            band_count,
            path.display()
        )))
    }
}

impl ContainerReader for GdalContainerReader {
    fn read_variable(&self, path: &Path, format: DataFormat, variable: &str) -> GeoResult<RasterGrid> {
        log::info!("Reading {} variable '{}' from {}", format, variable, path.display());

        match format {
            DataFormat::Hdf5 => Self::read_hdf5(path, variable),
            DataFormat::Grib2 => Self::read_grib(path, variable),
        }
    }
}

/// Read a whole band as Int16 samples
fn read_band(dataset: &Dataset, index: isize) -> GeoResult<RasterGrid> {
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(index)?;
    let buffer = band.read_as::<Sample>((0, 0), (width, height), (width, height), None)?;

    Array2::from_shape_vec((height, width), buffer.data)
        .map_err(|e| GeoError::Read(format!("Failed to reshape band {}: {}", index, e)))
}

/// Pick the subdataset name whose variable path ends in `variable`.
///
/// `entries` are `SUBDATASET_n_NAME=...` / `SUBDATASET_n_DESC=...` lines as
/// reported in GDAL's `SUBDATASETS` metadata domain.
pub fn find_subdataset(entries: &[String], variable: &str) -> Option<String> {
    entries
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .filter(|(key, _)| key.ends_with("_NAME"))
        .map(|(_, name)| name)
        .find(|name| {
            let leaf = name.rsplit(|c: char| c == '/' || c == ':').next().unwrap_or(*name);
            leaf.eq_ignore_ascii_case(variable)
        })
        .map(str::to_string)
}

/// Whether any of a band's labels names `variable`
pub fn band_matches(variable: &str, labels: &[Option<String>]) -> bool {
    labels
        .iter()
        .flatten()
        .any(|label| label.trim().eq_ignore_ascii_case(variable))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_subdataset_by_leaf_name() {
        let entries = vec![
            "SUBDATASET_1_NAME=HDF5:\"h10.H5\"://SC".to_string(),
            "SUBDATASET_1_DESC=[916x1902] //SC (8-bit unsigned character)".to_string(),
            "SUBDATASET_2_NAME=HDF5:\"h10.H5\"://SC_Q_Flags".to_string(),
            "SUBDATASET_2_DESC=[916x1902] //SC_Q_Flags (8-bit unsigned character)".to_string(),
        ];

        assert_eq!(
            find_subdataset(&entries, "SC").as_deref(),
            Some("HDF5:\"h10.H5\"://SC")
        );
        assert_eq!(
            find_subdataset(&entries, "sc_q_flags").as_deref(),
            Some("HDF5:\"h10.H5\"://SC_Q_Flags")
        );
        assert_eq!(find_subdataset(&entries, "rssc"), None);
    }

    #[test]
    fn test_find_subdataset_netcdf_style() {
        let entries = vec!["SUBDATASET_1_NAME=NETCDF:\"h34.nc\":SC".to_string()];
        assert_eq!(
            find_subdataset(&entries, "SC").as_deref(),
            Some("NETCDF:\"h34.nc\":SC")
        );
    }

    #[test]
    fn test_band_matches_any_label() {
        assert!(band_matches("rssc", &[None, Some(" RSSC ".to_string()), None]));
        assert!(!band_matches("rssc", &[Some("TMP".to_string()), None]));
        assert!(!band_matches("rssc", &[None, None, None]));
    }

    #[test]
    fn test_missing_container_is_read_error() {
        let reader = GdalContainerReader::new();
        let result = reader.read_variable(Path::new("does_not_exist.H5"), DataFormat::Hdf5, "SC");
        assert!(matches!(result, Err(GeoError::Read(_))));
    }
}
