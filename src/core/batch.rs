use crate::core::pipeline::{Geocoder, NoProgress};
use crate::core::reproject::Reprojector;
use crate::io::container::ContainerReader;
use crate::io::geotiff::RasterWriter;
use crate::types::{GeoError, TargetCrs};
use std::path::{Path, PathBuf};

/// One file to geocode
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub product: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, GeoError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `<input stem>_projected.tif` inside `output_dir`
pub fn default_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{}_projected.tif", stem))
}

/// Geocode every job in order.
///
/// A failing file is logged and recorded; the remaining files still run.
/// `on_done` is called after each file with its index.
pub fn run_batch<R, W, P>(
    geocoder: &mut Geocoder<R, W, P>,
    jobs: &[BatchJob],
    target: TargetCrs,
    mut on_done: impl FnMut(usize),
) -> BatchReport
where
    R: ContainerReader,
    W: RasterWriter,
    P: Reprojector,
{
    let mut report = BatchReport::default();

    for (index, job) in jobs.iter().enumerate() {
        match geocoder.project(&job.product, &job.input, &job.output, target, &NoProgress) {
            Ok(path) => report.succeeded.push(path),
            Err(e) => {
                log::warn!("Skipping {}: {}", job.input.display(), e);
                report.failed.push((job.input.clone(), e));
            }
        }
        on_done(index);
    }

    log::info!(
        "Batch finished: {} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    report
}
