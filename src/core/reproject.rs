use crate::io::geotiff::{parent_dir, Compression, StagedRaster};
use crate::types::{GeoError, GeoResult, TargetCrs};
use gdal::Dataset;
use serde::{Deserialize, Serialize};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};

/// Resampling kernel used by the warp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resampling {
    /// Keeps class codes intact
    #[default]
    Nearest,
    Bilinear,
    Cubic,
    Mode,
}

impl Resampling {
    /// gdalwarp `-r` keyword
    pub fn gdal_name(&self) -> &'static str {
        match self {
            Resampling::Nearest => "near",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::Mode => "mode",
        }
    }
}

/// Warps a native-projection raster into geographic coordinates
pub trait Reprojector {
    /// Warp `source` to the target CRS and write the result at `destination`
    fn reproject(&self, source: &Path, destination: &Path) -> GeoResult<PathBuf>;
}

/// GDAL warp through an intermediate VRT, finished with a compressed translate
#[derive(Debug, Clone)]
pub struct GdalWarpReprojector {
    target_code: String,
    resampling: Resampling,
    compression: Compression,
    scratch_dir: Option<PathBuf>,
}

impl Default for GdalWarpReprojector {
    fn default() -> Self {
        Self {
            target_code: TargetCrs::GEOGRAPHIC_CODE.to_string(),
            resampling: Resampling::default(),
            compression: Compression::default(),
            scratch_dir: None,
        }
    }
}

impl GdalWarpReprojector {
    pub fn new(resampling: Resampling, compression: Compression, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            resampling,
            compression,
            scratch_dir,
            ..Self::default()
        }
    }

    /// Arguments for the warp into a virtual raster
    pub fn warp_args(&self) -> Vec<String> {
        vec![
            "-of".to_string(),
            "VRT".to_string(),
            "-t_srs".to_string(),
            self.target_code.clone(),
            "-r".to_string(),
            self.resampling.gdal_name().to_string(),
        ]
    }

    /// Arguments for materializing the virtual raster as GeoTIFF
    pub fn translate_args(&self) -> Vec<String> {
        let mut args = vec!["-of".to_string(), "GTiff".to_string()];
        args.extend(self.compression.creation_args());
        args
    }

    fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Reprojector for GdalWarpReprojector {
    fn reproject(&self, source: &Path, destination: &Path) -> GeoResult<PathBuf> {
        log::info!("Warping {} to {}", source.display(), self.target_code);

        let source_ds = Dataset::open(source).map_err(|e| {
            GeoError::Reprojection(format!("Failed to open {}: {}", source.display(), e))
        })?;
        if source_ds.projection().trim().is_empty() {
            return Err(GeoError::Reprojection(format!(
                "{} carries no projection to warp from",
                source.display()
            )));
        }

        let vrt = StagedRaster::create_in(&self.scratch_dir(), ".vrt")
            .map_err(|e| GeoError::Reprojection(format!("Failed to create VRT file: {}", e)))?;
        let warped = gdal_warp(&source_ds, vrt.path(), &self.warp_args())?;
        let (width, height) = warped.raster_size();
        log::debug!("Warped raster is {} x {} pixels", width, height);
        drop(warped);
        drop(source_ds);

        let virtual_ds = Dataset::open(vrt.path()).map_err(|e| {
            GeoError::Reprojection(format!("Failed to reopen {}: {}", vrt.path().display(), e))
        })?;

        let output = StagedRaster::create_in(parent_dir(destination), ".tif").map_err(|e| {
            GeoError::Reprojection(format!(
                "Failed to stage output next to {}: {}",
                destination.display(),
                e
            ))
        })?;
        let translated = gdal_translate(&virtual_ds, output.path(), &self.translate_args())?;
        drop(translated);
        drop(virtual_ds);

        let written = output.persist(destination).map_err(|e| {
            GeoError::Reprojection(format!("Failed to move output to {}: {}", destination.display(), e))
        })?;
        log::info!("Reprojected raster written to {}", written.display());
        Ok(written)
    }
}

/// NULL-terminated argv for the GDAL utility option parsers
struct ArgList {
    _owned: Vec<CString>,
    ptrs: Vec<*mut c_char>,
}

impl ArgList {
    fn new(args: &[String]) -> GeoResult<Self> {
        let owned = args
            .iter()
            .map(|arg| CString::new(arg.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| GeoError::Reprojection(format!("Invalid GDAL argument: {}", e)))?;
        let mut ptrs: Vec<*mut c_char> = owned.iter().map(|arg| arg.as_ptr() as *mut c_char).collect();
        ptrs.push(std::ptr::null_mut());
        Ok(Self { _owned: owned, ptrs })
    }

    fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }
}

fn path_to_cstring(path: &Path) -> GeoResult<CString> {
    CString::new(path.to_string_lossy().as_bytes())
        .map_err(|e| GeoError::Reprojection(format!("Invalid path {}: {}", path.display(), e)))
}

fn last_gdal_error(operation: &str) -> String {
    let message = unsafe {
        let ptr = gdal_sys::CPLGetLastErrorMsg();
        if ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    };
    if message.is_empty() {
        format!("{} failed", operation)
    } else {
        format!("{} failed: {}", operation, message)
    }
}

fn gdal_warp(source: &Dataset, destination: &Path, args: &[String]) -> GeoResult<Dataset> {
    let mut argv = ArgList::new(args)?;
    let dest = path_to_cstring(destination)?;

    unsafe {
        let options = gdal_sys::GDALWarpAppOptionsNew(argv.as_mut_ptr(), std::ptr::null_mut());
        if options.is_null() {
            return Err(GeoError::Reprojection(last_gdal_error("GDALWarpAppOptionsNew")));
        }

        let mut sources = [source.c_dataset()];
        let mut usage_error: c_int = 0;
        let handle = gdal_sys::GDALWarp(
            dest.as_ptr(),
            std::ptr::null_mut(),
            1,
            sources.as_mut_ptr(),
            options,
            &mut usage_error,
        );
        gdal_sys::GDALWarpAppOptionsFree(options);

        if handle.is_null() {
            return Err(GeoError::Reprojection(last_gdal_error("GDALWarp")));
        }
        Ok(Dataset::from_c_dataset(handle))
    }
}

fn gdal_translate(source: &Dataset, destination: &Path, args: &[String]) -> GeoResult<Dataset> {
    let mut argv = ArgList::new(args)?;
    let dest = path_to_cstring(destination)?;

    unsafe {
        let options = gdal_sys::GDALTranslateOptionsNew(argv.as_mut_ptr(), std::ptr::null_mut());
        if options.is_null() {
            return Err(GeoError::Reprojection(last_gdal_error("GDALTranslateOptionsNew")));
        }

        let mut usage_error: c_int = 0;
        let handle = gdal_sys::GDALTranslate(dest.as_ptr(), source.c_dataset(), options, &mut usage_error);
        gdal_sys::GDALTranslateOptionsFree(options);

        if handle.is_null() {
            return Err(GeoError::Reprojection(last_gdal_error("GDALTranslate")));
        }
        Ok(Dataset::from_c_dataset(handle))
    }
}
