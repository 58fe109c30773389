use snowgeo::types::{DataFormat, GeoError, SourceProjection, TargetCrs};
use snowgeo::{lookup, products};

#[test]
fn test_every_product_has_usable_geometry() {
    for product in products() {
        assert!(
            product.geo_transform.is_valid(),
            "{} has a degenerate geotransform",
            product.code
        );
        let (rows, cols) = product.expected_shape;
        assert!(rows > 0 && cols > 0, "{} has an empty shape", product.code);
        assert!(!product.variable_key.is_empty());

        // North-up grids: x grows with columns, y shrinks with rows
        if product.source_projection.is_geographic() {
            assert!(product.geo_transform.pixel_width > 0.0);
            assert!(product.geo_transform.pixel_height < 0.0);
        }
    }
}

#[test]
fn test_format_follows_projection() {
    for product in products() {
        match product.source_projection {
            SourceProjection::Geostationary => {
                assert_eq!(product.data_format, DataFormat::Hdf5, "{}", product.code);
                assert!(product.requires_vertical_flip, "{}", product.code);
                assert_eq!(product.variable_key, "SC");
            }
            SourceProjection::GeographicWgs84 => {
                assert_eq!(product.data_format, DataFormat::Grib2, "{}", product.code);
                assert!(!product.requires_vertical_flip, "{}", product.code);
                assert_eq!(product.variable_key, "rssc");
            }
            other => panic!("{} uses unexpected projection {}", product.code, other),
        }
    }
}

#[test]
fn test_reprojection_decision() {
    let h10 = lookup("H10").expect("H10 registered");
    let h35 = lookup("H35").expect("H35 registered");

    assert!(h10.needs_reprojection(TargetCrs::Geographic));
    assert!(!h10.needs_reprojection(TargetCrs::Native));
    assert!(!h35.needs_reprojection(TargetCrs::Geographic));
    assert!(!h35.needs_reprojection(TargetCrs::Native));
}

#[test]
fn test_h35_covers_northern_hemisphere() {
    let h35 = lookup("h35").expect("H35 registered");
    let gt = h35.geo_transform;

    let (west, north) = gt.pixel_to_world(0.0, 0.0);
    let (east, south) = gt.pixel_to_world(h35.cols() as f64, h35.rows() as f64);
    approx::assert_abs_diff_eq!(west, -179.995, epsilon = 1e-9);
    approx::assert_abs_diff_eq!(north, 89.995, epsilon = 1e-9);
    approx::assert_abs_diff_eq!(east, 179.995, epsilon = 1e-6);
    approx::assert_abs_diff_eq!(south, 0.005, epsilon = 1e-6);
}

#[test]
fn test_unknown_code_is_rejected() {
    match lookup("ZZ9") {
        Err(GeoError::UnknownProduct(code)) => assert_eq!(code, "ZZ9"),
        other => panic!("expected UnknownProduct, got {:?}", other),
    }
}
