use crate::core::registry::ProductDefinition;
use crate::io::container::ContainerReader;
use crate::types::{GeoError, GeoResult, RasterGrid};
use ndarray::s;
use std::path::Path;

/// Check that `path` is an existing file in the product's container format.
///
/// Runs before any container I/O so a bad pairing never opens the file.
pub fn validate_input(path: &Path, definition: &ProductDefinition) -> GeoResult<()> {
    if !path.is_file() {
        return Err(GeoError::InvalidInput(format!(
            "Input file {} does not exist",
            path.display()
        )));
    }

    if !definition.data_format.accepts(path) {
        return Err(GeoError::InvalidInput(format!(
            "{} expects a {} file ({:?}), got {}",
            definition.code,
            definition.data_format,
            definition.data_format.extensions(),
            path.display()
        )));
    }

    Ok(())
}

/// Loads a product grid and brings it into the registry's orientation
pub struct ProductLoader<R: ContainerReader> {
    reader: R,
}

impl<R: ContainerReader> ProductLoader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the product variable, verify its shape and correct its orientation
    pub fn load(&self, path: &Path, definition: &ProductDefinition) -> GeoResult<RasterGrid> {
        let grid = self
            .reader
            .read_variable(path, definition.data_format, definition.variable_key)?;

        log::debug!("Loaded {} grid of shape {:?}", definition.code, grid.dim());
        check_shape(&grid, definition)?;

        if definition.requires_vertical_flip {
            log::debug!("Rotating {} grid by 180 degrees", definition.code);
            Ok(rotate_180(&grid))
        } else {
            Ok(grid)
        }
    }
}

/// Reject grids whose dimensions differ from the product's fixed geometry
pub fn check_shape(grid: &RasterGrid, definition: &ProductDefinition) -> GeoResult<()> {
    let actual = grid.dim();
    if actual != definition.expected_shape {
        return Err(GeoError::ShapeMismatch {
            product: definition.code.to_string(),
            expected: definition.expected_shape,
            actual,
        });
    }
    Ok(())
}

/// Reverse both axes so sensor scan order matches a top-left origin
pub fn rotate_180(grid: &RasterGrid) -> RasterGrid {
    grid.slice(s![..;-1, ..;-1]).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::lookup;
    use crate::types::DataFormat;
    use ndarray::{arr2, Array2};
    use std::cell::Cell;

    struct FixedReader {
        grid: RasterGrid,
        calls: Cell<usize>,
    }

    impl ContainerReader for FixedReader {
        fn read_variable(&self, _path: &Path, _format: DataFormat, _variable: &str) -> GeoResult<RasterGrid> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.grid.clone())
        }
    }

    fn pattern(rows: usize, cols: usize) -> RasterGrid {
        Array2::from_shape_fn((rows, cols), |(r, c)| ((r * 7 + c * 3) % 251) as i16)
    }

    #[test]
    fn test_rotate_180_small_grid() {
        let grid = arr2(&[[1i16, 2, 3], [4, 5, 6]]);
        assert_eq!(rotate_180(&grid), arr2(&[[6i16, 5, 4], [3, 2, 1]]));
    }

    #[test]
    fn test_rotate_180_is_involution() {
        let grid = pattern(37, 53);
        assert_eq!(rotate_180(&rotate_180(&grid)), grid);
    }

    #[test]
    fn test_load_flips_when_required() {
        let h10 = lookup("H10").unwrap();
        let raw = pattern(916, 1902);
        let loader = ProductLoader::new(FixedReader { grid: raw.clone(), calls: Cell::new(0) });

        let grid = loader.load(Path::new("h10.H5"), h10).unwrap();
        assert_eq!(grid.dim(), (916, 1902));
        assert_eq!(grid[[0, 0]], raw[[915, 1901]]);
        assert_eq!(grid[[915, 1901]], raw[[0, 0]]);
    }

    #[test]
    fn test_load_keeps_orientation_when_not_flipped() {
        let h13 = lookup("H13").unwrap();
        let raw = pattern(201, 281);
        let loader = ProductLoader::new(FixedReader { grid: raw.clone(), calls: Cell::new(0) });

        assert_eq!(loader.load(Path::new("h13.grib2"), h13).unwrap(), raw);
    }

    #[test]
    fn test_load_rejects_wrong_shape() {
        let h10 = lookup("H10").unwrap();
        let loader = ProductLoader::new(FixedReader { grid: pattern(916, 1901), calls: Cell::new(0) });

        match loader.load(Path::new("h10.H5"), h10) {
            Err(GeoError::ShapeMismatch { product, expected, actual }) => {
                assert_eq!(product, "H10");
                assert_eq!(expected, (916, 1902));
                assert_eq!(actual, (916, 1901));
            }
            other => panic!("expected ShapeMismatch, got {:?}", other.map(|g| g.dim())),
        }
        assert_eq!(loader.reader.calls.get(), 1);
    }

    #[test]
    fn test_validate_input_checks_existence_and_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let h10 = lookup("H10").unwrap();

        let missing = dir.path().join("missing.H5");
        assert!(matches!(validate_input(&missing, h10), Err(GeoError::InvalidInput(_))));

        let wrong = dir.path().join("h10.grib2");
        std::fs::write(&wrong, b"GRIB").unwrap();
        assert!(matches!(validate_input(&wrong, h10), Err(GeoError::InvalidInput(_))));

        let good = dir.path().join("h10_20240106_day_merged.H5");
        std::fs::write(&good, b"\x89HDF").unwrap();
        assert!(validate_input(&good, h10).is_ok());
    }
}
