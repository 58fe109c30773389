//! Load -> write -> (reproject) orchestration for a single product file

use crate::core::registry::{self, ProductDefinition};
use crate::core::reproject::{GdalWarpReprojector, Reprojector, Resampling};
use crate::io::container::{ContainerReader, GdalContainerReader};
use crate::io::geotiff::{validate_output, Compression, GeoTiffWriter, RasterWriter, WrittenRaster};
use crate::io::loader::{validate_input, ProductLoader};
use crate::types::{GeoResult, TargetCrs};
use std::path::{Path, PathBuf};

/// Geocoding configuration
#[derive(Debug, Clone, Default)]
pub struct GeocodeOptions {
    /// Output coordinate reference
    pub target_crs: TargetCrs,
    /// Compression of every GeoTIFF written
    pub compression: Compression,
    /// Warp resampling kernel
    pub resampling: Resampling,
    /// Directory for intermediates; system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loading,
    Writing,
    Reprojecting,
    Done,
    Failed,
}

/// Observable progress points of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Loaded,
    Written,
    Finalized,
}

impl Milestone {
    pub const COUNT: u64 = 3;

    pub fn label(&self) -> &'static str {
        match self {
            Milestone::Loaded => "loaded",
            Milestone::Written => "written",
            Milestone::Finalized => "finalized",
        }
    }
}

/// Receives progress milestones; never influences control flow
pub trait Progress {
    fn milestone(&self, milestone: Milestone);
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn milestone(&self, _milestone: Milestone) {}
}

/// Product geocoding pipeline
pub struct Geocoder<R: ContainerReader, W: RasterWriter, P: Reprojector> {
    loader: ProductLoader<R>,
    writer: W,
    reprojector: P,
    stage: Stage,
}

impl Geocoder<GdalContainerReader, GeoTiffWriter, GdalWarpReprojector> {
    /// Pipeline on the GDAL backends
    pub fn with_gdal(options: &GeocodeOptions) -> Self {
        Self::new(
            GdalContainerReader::new(),
            GeoTiffWriter::new(options.compression, options.scratch_dir.clone()),
            GdalWarpReprojector::new(
                options.resampling,
                options.compression,
                options.scratch_dir.clone(),
            ),
        )
    }
}

impl<R: ContainerReader, W: RasterWriter, P: Reprojector> Geocoder<R, W, P> {
    pub fn new(reader: R, writer: W, reprojector: P) -> Self {
        Self {
            loader: ProductLoader::new(reader),
            writer,
            reprojector,
            stage: Stage::Idle,
        }
    }

    /// State reached by the last run
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn reprojector(&self) -> &P {
        &self.reprojector
    }

    /// Geocode `input` as `product_code` into `output` in the `target` CRS.
    ///
    /// Returns the path of the final raster. Errors keep the kind of the
    /// stage that raised them; nothing is left at `output` on failure.
    pub fn project(
        &mut self,
        product_code: &str,
        input: &Path,
        output: &Path,
        target: TargetCrs,
        progress: &dyn Progress,
    ) -> GeoResult<PathBuf> {
        self.stage = Stage::Idle;

        let result = registry::lookup(product_code).and_then(|definition| {
            validate_input(input, definition)?;
            validate_output(output)?;
            self.run(definition, input, output, target, progress)
        });

        match &result {
            Ok(path) => {
                self.stage = Stage::Done;
                log::info!("{} is created", path.display());
            }
            Err(e) => {
                log::debug!("Pipeline failed during {:?}: {}", self.stage, e);
                self.stage = Stage::Failed;
            }
        }
        result
    }

    fn run(
        &mut self,
        definition: &ProductDefinition,
        input: &Path,
        output: &Path,
        target: TargetCrs,
        progress: &dyn Progress,
    ) -> GeoResult<PathBuf> {
        log::info!(
            "Geocoding {} ({}) to {} CRS",
            definition.code,
            input.display(),
            target
        );

        self.stage = Stage::Loading;
        let grid = self.loader.load(input, definition)?;
        progress.milestone(Milestone::Loaded);

        self.stage = Stage::Writing;
        let written = self.writer.write(&grid, definition, output, target)?;
        drop(grid);
        progress.milestone(Milestone::Written);

        let final_path = match written {
            WrittenRaster::Final(path) => path,
            WrittenRaster::Intermediate(staged) => {
                self.stage = Stage::Reprojecting;
                // `staged` is removed when it goes out of scope, on either path
                self.reprojector.reproject(staged.path(), output)?
            }
        };
        progress.milestone(Milestone::Finalized);

        Ok(final_path)
    }
}

/// Geocode one file with the GDAL backends and no progress reporting
pub fn geocode(
    product_code: &str,
    input: &Path,
    output: &Path,
    options: &GeocodeOptions,
) -> GeoResult<PathBuf> {
    Geocoder::with_gdal(options).project(product_code, input, output, options.target_crs, &NoProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataFormat, GeoError, RasterGrid};
    use ndarray::Array2;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct ZeroReader;

    impl ContainerReader for ZeroReader {
        fn read_variable(&self, _path: &Path, format: DataFormat, _variable: &str) -> GeoResult<RasterGrid> {
            let shape = match format {
                DataFormat::Hdf5 => (916, 1902),
                DataFormat::Grib2 => (201, 281),
            };
            Ok(Array2::zeros(shape))
        }
    }

    struct FailingWriter;

    impl RasterWriter for FailingWriter {
        fn write(
            &self,
            _grid: &RasterGrid,
            _definition: &ProductDefinition,
            _destination: &Path,
            _target: TargetCrs,
        ) -> GeoResult<WrittenRaster> {
            Err(GeoError::Write("disk full".to_string()))
        }
    }

    struct UnusedReprojector;

    impl Reprojector for UnusedReprojector {
        fn reproject(&self, _source: &Path, _destination: &Path) -> GeoResult<PathBuf> {
            panic!("reprojection must not run");
        }
    }

    #[derive(Default)]
    struct RecordingProgress(RefCell<Vec<Milestone>>);

    impl Progress for RecordingProgress {
        fn milestone(&self, milestone: Milestone) {
            self.0.borrow_mut().push(milestone);
        }
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_default_options() {
        let options = GeocodeOptions::default();
        assert_eq!(options.target_crs, TargetCrs::Geographic);
        assert_eq!(options.compression, Compression::Lzw);
        assert_eq!(options.resampling, Resampling::Nearest);
        assert!(options.scratch_dir.is_none());
    }

    #[test]
    fn test_write_failure_keeps_kind_and_stage() {
        let dir = TempDir::new().unwrap();
        let input = touch(&dir, "h13.grib2");
        let output = dir.path().join("h13.tif");
        let progress = RecordingProgress::default();

        let mut geocoder = Geocoder::new(ZeroReader, FailingWriter, UnusedReprojector);
        let result = geocoder.project("H13", &input, &output, TargetCrs::Geographic, &progress);

        assert!(matches!(result, Err(GeoError::Write(_))));
        assert_eq!(geocoder.stage(), Stage::Failed);
        assert_eq!(*progress.0.borrow(), vec![Milestone::Loaded]);
        assert!(!output.exists());
    }

    #[test]
    fn test_invalid_input_stops_before_loading() {
        let dir = TempDir::new().unwrap();
        let input = touch(&dir, "h10.grib2");
        let output = dir.path().join("h10.tif");
        let progress = RecordingProgress::default();

        let mut geocoder = Geocoder::new(ZeroReader, FailingWriter, UnusedReprojector);
        let result = geocoder.project("H10", &input, &output, TargetCrs::Geographic, &progress);

        assert!(matches!(result, Err(GeoError::InvalidInput(_))));
        assert!(progress.0.borrow().is_empty());
    }

    #[test]
    fn test_unknown_product_stops_immediately() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("zz9.tif");

        let mut geocoder = Geocoder::new(ZeroReader, FailingWriter, UnusedReprojector);
        let result = geocoder.project("ZZ9", Path::new("missing.H5"), &output, TargetCrs::Geographic, &NoProgress);

        assert!(matches!(result, Err(GeoError::UnknownProduct(_))));
        assert_eq!(geocoder.stage(), Stage::Failed);
        assert!(!output.exists());
    }
}
