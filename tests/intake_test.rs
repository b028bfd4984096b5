use image::{Rgba, RgbaImage};
use retouch_studio::ops::intake::{
    conform_to_output, downscale_plan, downscale_upload, OutputSize, MAX_UPLOAD_EDGE,
};

mod output_size {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(OutputSize::new(0, 100).is_none());
        assert!(OutputSize::new(100, 0).is_none());
        assert!(OutputSize::new(1, 1).is_some());
    }

    #[test]
    fn initialized_from_the_uploads_natural_dimensions() {
        let img = RgbaImage::new(640, 480);
        let size = OutputSize::of_image(&img);
        assert_eq!((size.width, size.height), (640, 480));
    }
}

mod result_conformance {
    use super::*;

    #[test]
    fn generation_results_are_resampled_to_the_output_size() {
        let raster = RgbaImage::new(512, 512);
        let size = OutputSize::new(300, 200).unwrap();
        let out = conform_to_output(raster, size);
        assert_eq!(out.dimensions(), (300, 200));
    }

    #[test]
    fn matching_results_pass_through_untouched() {
        let mut raster = RgbaImage::new(64, 48);
        raster.put_pixel(10, 10, Rgba([1, 2, 3, 4]));
        let size = OutputSize::new(64, 48).unwrap();
        let out = conform_to_output(raster, size);
        assert_eq!(out.dimensions(), (64, 48));
        assert_eq!(*out.get_pixel(10, 10), Rgba([1, 2, 3, 4]));
    }
}

mod oversize_uploads {
    use super::*;

    #[test]
    fn within_threshold_needs_no_plan() {
        assert!(downscale_plan(2048, 1000, MAX_UPLOAD_EDGE).is_none());
        assert!(downscale_plan(100, 2048, MAX_UPLOAD_EDGE).is_none());
    }

    #[test]
    fn landscape_3000x2000_downscales_to_2048_preserving_aspect() {
        let plan = downscale_plan(3000, 2000, 2048).expect("oversize triggers a plan");
        assert_eq!(plan.longer_edge(), 2048);
        assert_eq!(plan.width, 2048);
        // Aspect preserved within ±1px of 2000/3000*2048.
        let expected = 2000.0 / 3000.0 * 2048.0;
        assert!((plan.height as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn portrait_orientation_scales_the_height_edge() {
        let plan = downscale_plan(2000, 3000, 2048).unwrap();
        assert_eq!(plan.height, 2048);
        assert!(plan.width < plan.height);
    }

    #[test]
    fn approved_plan_resizes_the_upload_itself() {
        let img = RgbaImage::new(3000, 2000);
        let plan = downscale_plan(3000, 2000, 2048).unwrap();
        let scaled = downscale_upload(&img, plan);
        assert_eq!(scaled.dimensions(), (plan.width, plan.height));
    }
}
