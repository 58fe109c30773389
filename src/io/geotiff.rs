use crate::core::registry::ProductDefinition;
use crate::types::{GeoError, GeoResult, GeoTransform, RasterGrid, Sample, TargetCrs};
use gdal::raster::{Buffer, RasterCreationOption};
use gdal::DriverManager;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// GeoTIFF compression scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    Lzw,
    Deflate,
    None,
}

impl Compression {
    /// Value of the GTiff `COMPRESS` creation option
    pub fn creation_value(&self) -> Option<&'static str> {
        match self {
            Compression::Lzw => Some("LZW"),
            Compression::Deflate => Some("DEFLATE"),
            Compression::None => None,
        }
    }

    /// `-co` style arguments for the GDAL utilities
    pub fn creation_args(&self) -> Vec<String> {
        match self.creation_value() {
            Some(value) => vec!["-co".to_string(), format!("COMPRESS={}", value)],
            None => Vec::new(),
        }
    }
}

/// PAM sidecar GDAL writes next to a raster when metadata does not fit the format
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".aux.xml");
    PathBuf::from(name)
}

/// A raster under a temporary name.
///
/// The file and its `.aux.xml` sidecar are removed on drop unless
/// [`StagedRaster::persist`] moved them into place first.
#[derive(Debug)]
pub struct StagedRaster {
    path: Option<TempPath>,
}

impl StagedRaster {
    /// Reserve a fresh file name in `dir`
    pub fn create_in(dir: &Path, suffix: &str) -> std::io::Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(".snowgeo-")
            .suffix(suffix)
            .tempfile_in(dir)?
            .into_temp_path();
        // GDAL creates the file itself; only the unique name is kept
        std::fs::remove_file(&path)?;
        log::debug!("Staging raster at {}", path.display());
        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Atomically move the staged raster (and sidecar, if any) to `destination`
    pub fn persist(mut self, destination: &Path) -> std::io::Result<PathBuf> {
        let Some(temp) = self.path.take() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "staged raster already persisted",
            ));
        };

        let staged_sidecar = sidecar_path(&temp);
        let final_sidecar = sidecar_path(destination);

        // Raster first: a failed rename leaves any earlier output and its sidecar untouched
        if let Err(e) = temp.persist(destination) {
            let _ = std::fs::remove_file(&staged_sidecar);
            return Err(e.error);
        }

        if staged_sidecar.exists() {
            std::fs::rename(&staged_sidecar, &final_sidecar)?;
        } else if final_sidecar.exists() {
            // Left over from an earlier output at the same path
            std::fs::remove_file(&final_sidecar)?;
        }
        Ok(destination.to_path_buf())
    }
}

impl Drop for StagedRaster {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            let _ = std::fs::remove_file(sidecar_path(path));
        }
    }
}

/// Directory a destination file lives in
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check that the output can be created: its directory must exist
pub fn validate_output(path: &Path) -> GeoResult<()> {
    if path.file_name().is_none() {
        return Err(GeoError::InvalidInput(format!(
            "Output path {} does not name a file",
            path.display()
        )));
    }
    let dir = parent_dir(path);
    if !dir.is_dir() {
        return Err(GeoError::InvalidInput(format!(
            "Output directory {} does not exist",
            dir.display()
        )));
    }
    Ok(())
}

/// Outcome of writing a product grid
#[derive(Debug)]
pub enum WrittenRaster {
    /// Written to the caller's destination; nothing left to do
    Final(PathBuf),
    /// Written in the native projection, waiting to be reprojected
    Intermediate(StagedRaster),
}

impl WrittenRaster {
    pub fn path(&self) -> &Path {
        match self {
            WrittenRaster::Final(path) => path,
            WrittenRaster::Intermediate(staged) => staged.path(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, WrittenRaster::Final(_))
    }
}

/// Materializes a product grid as a georeferenced raster
pub trait RasterWriter {
    /// Write `grid` for `definition`, choosing a final or intermediate path from `target`
    fn write(
        &self,
        grid: &RasterGrid,
        definition: &ProductDefinition,
        destination: &Path,
        target: TargetCrs,
    ) -> GeoResult<WrittenRaster>;
}

/// Single-band Int16 GeoTIFF writer
#[derive(Debug, Clone, Default)]
pub struct GeoTiffWriter {
    compression: Compression,
    /// Where intermediates go; system temp dir when unset
    scratch_dir: Option<PathBuf>,
}

impl GeoTiffWriter {
    pub fn new(compression: Compression, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            compression,
            scratch_dir,
        }
    }

    fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Write a georeferenced GeoTIFF at `path`
    pub fn write_geotiff(
        &self,
        grid: &RasterGrid,
        transform: &GeoTransform,
        projection_wkt: &str,
        path: &Path,
    ) -> GeoResult<()> {
        log::debug!("Writing GeoTIFF: {}", path.display());

        let driver = DriverManager::get_driver_by_name("GTiff").map_err(write_error)?;
        let (height, width) = grid.dim();

        let options: Vec<RasterCreationOption> = self
            .compression
            .creation_value()
            .map(|value| RasterCreationOption {
                key: "COMPRESS",
                value,
            })
            .into_iter()
            .collect();

        let mut dataset = driver
            .create_with_band_type_with_options::<Sample, _>(
                path,
                width as isize,
                height as isize,
                1,
                &options,
            )
            .map_err(write_error)?;

        dataset
            .set_geo_transform(&transform.to_array())
            .map_err(write_error)?;
        dataset.set_projection(projection_wkt).map_err(write_error)?;

        {
            let mut band = dataset.rasterband(1).map_err(write_error)?;
            let flat_data: Vec<Sample> = grid.iter().copied().collect();
            let buffer = Buffer::new((width, height), flat_data);
            band.write((0, 0), (width, height), &buffer)
                .map_err(write_error)?;
        }

        // Closing the dataset flushes it to disk
        drop(dataset);
        Ok(())
    }
}

impl RasterWriter for GeoTiffWriter {
    fn write(
        &self,
        grid: &RasterGrid,
        definition: &ProductDefinition,
        destination: &Path,
        target: TargetCrs,
    ) -> GeoResult<WrittenRaster> {
        let wkt = definition.source_projection.wkt();

        if definition.needs_reprojection(target) {
            let staged = StagedRaster::create_in(&self.scratch_dir(), ".tif")
                .map_err(|e| GeoError::Write(format!("Failed to create intermediate file: {}", e)))?;
            self.write_geotiff(grid, &definition.geo_transform, wkt, staged.path())?;
            log::info!(
                "Wrote {} intermediate in {} projection",
                definition.code,
                definition.source_projection
            );
            return Ok(WrittenRaster::Intermediate(staged));
        }

        let staged = StagedRaster::create_in(parent_dir(destination), ".tif").map_err(|e| {
            GeoError::Write(format!(
                "Failed to stage output next to {}: {}",
                destination.display(),
                e
            ))
        })?;
        self.write_geotiff(grid, &definition.geo_transform, wkt, staged.path())?;
        let written = staged.persist(destination).map_err(|e| {
            GeoError::Write(format!("Failed to move output to {}: {}", destination.display(), e))
        })?;

        log::info!("Wrote {} to {}", definition.code, written.display());
        Ok(WrittenRaster::Final(written))
    }
}

fn write_error(e: gdal::errors::GdalError) -> GeoError {
    GeoError::Write(e.to_string())
}
