use eframe::egui::{pos2, vec2, Rect};
use image::{Rgba, RgbaImage};
use retouch_studio::ops::crop::{crop_exact, crop_scaled, rasterize_selection, CropError};
use retouch_studio::view::DisplayMapping;

/// 400x300 native image with a distinct color per quadrant.
fn quadrant_image() -> RgbaImage {
    let mut img = RgbaImage::new(400, 300);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = match (x < 200, y < 150) {
            (true, true) => Rgba([255, 0, 0, 255]),
            (false, true) => Rgba([0, 255, 0, 255]),
            (true, false) => Rgba([0, 0, 255, 255]),
            (false, false) => Rgba([255, 255, 0, 255]),
        };
    }
    img
}

fn mapping(display_w: f32, display_h: f32, dpr: f32) -> DisplayMapping {
    DisplayMapping {
        origin: pos2(40.0, 25.0),
        display_size: vec2(display_w, display_h),
        natural_size: (400, 300),
        pixels_per_point: dpr,
    }
}

mod coordinate_mapping {
    use super::*;

    #[test]
    fn pointer_to_canvas_subtracts_the_origin() {
        let m = mapping(200.0, 150.0, 1.0);
        assert_eq!(m.pointer_to_canvas(pos2(40.0, 25.0)), (0.0, 0.0));
        assert_eq!(m.pointer_to_canvas(pos2(140.0, 100.0)), (100.0, 75.0));
    }

    #[test]
    fn canvas_to_native_scales_and_rounds() {
        // Displayed at half the native size in each dimension.
        let m = mapping(200.0, 150.0, 1.0);
        assert_eq!(m.canvas_to_native((100.0, 75.0)), (200, 150));
        // 50.3 display px * 2 = 100.6 → rounds to 101
        assert_eq!(m.canvas_to_native((50.3, 0.0)), (101, 0));
    }

    #[test]
    fn canvas_to_native_clamps_to_the_pixel_grid() {
        let m = mapping(200.0, 150.0, 1.0);
        assert_eq!(m.canvas_to_native((-5.0, -5.0)), (0, 0));
        assert_eq!(m.canvas_to_native((400.0, 300.0)), (399, 299));
    }

    #[test]
    fn display_px_rounds_fractional_point_sizes() {
        let m = mapping(200.4, 149.6, 1.0);
        assert_eq!(m.display_px(), (200, 150));
    }
}

mod selection_validation {
    use super::*;

    #[test]
    fn zero_width_selection_fails_without_a_raster() {
        let native = quadrant_image();
        let m = mapping(400.0, 300.0, 1.0);
        let sel = Rect::from_min_size(pos2(10.0, 10.0), vec2(0.0, 50.0));
        assert_eq!(rasterize_selection(&native, sel, &m), Err(CropError::ZeroArea));
    }

    #[test]
    fn zero_height_selection_fails_without_a_raster() {
        let native = quadrant_image();
        let m = mapping(400.0, 300.0, 1.0);
        let sel = Rect::from_min_size(pos2(10.0, 10.0), vec2(50.0, 0.0));
        assert_eq!(rasterize_selection(&native, sel, &m), Err(CropError::ZeroArea));
    }

    #[test]
    fn out_of_bounds_source_is_rejected() {
        let native = quadrant_image();
        assert_eq!(
            crop_scaled(&native, 500, 0, 10, 10, 10, 10),
            Err(CropError::OutOfBounds)
        );
    }
}

mod rasterization {
    use super::*;

    #[test]
    fn unity_scale_crop_is_pixel_exact() {
        // Display == native, DPR 1: the copy path must not resample.
        let native = quadrant_image();
        let m = mapping(400.0, 300.0, 1.0);
        let sel = Rect::from_min_size(pos2(150.0, 100.0), vec2(100.0, 100.0));

        let out = rasterize_selection(&native, sel, &m).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        // Top-left of the selection is still the red quadrant…
        assert_eq!(out.get_pixel(0, 0), native.get_pixel(150, 100));
        // …and the quadrant boundaries land where the source had them.
        assert_eq!(out.get_pixel(60, 0), native.get_pixel(210, 100));
        assert_eq!(out.get_pixel(60, 60), native.get_pixel(210, 160));
    }

    #[test]
    fn hidpi_output_is_sized_in_device_pixels() {
        // 2x DPR: destination raster doubles the CSS-pixel selection.
        let native = quadrant_image();
        let m = mapping(200.0, 150.0, 2.0);
        let sel = Rect::from_min_size(pos2(20.0, 30.0), vec2(80.0, 60.0));

        let out = rasterize_selection(&native, sel, &m).unwrap();
        assert_eq!(out.dimensions(), (160, 120));
    }

    #[test]
    fn same_selection_rasterizes_identically_across_display_scales() {
        // A selection covering the same native region must produce the same
        // raster whether the image is displayed at 1:1 or at half size with
        // a 2x device pixel ratio.
        let native = quadrant_image();

        let full = mapping(400.0, 300.0, 1.0);
        let sel_full = Rect::from_min_size(pos2(100.0, 50.0), vec2(200.0, 150.0));
        let out_full = rasterize_selection(&native, sel_full, &full).unwrap();

        let half = mapping(200.0, 150.0, 2.0);
        let sel_half = Rect::from_min_size(pos2(50.0, 25.0), vec2(100.0, 75.0));
        let out_half = rasterize_selection(&native, sel_half, &half).unwrap();

        assert_eq!(out_full.dimensions(), out_half.dimensions());
        assert_eq!(out_full.as_raw(), out_half.as_raw());
    }

    #[test]
    fn exact_crop_overflowing_the_edge_shrinks_instead_of_stretching() {
        let native = quadrant_image();
        // 100x100 requested with only 50x50 left of the image.
        let out = crop_exact(&native, 350, 250, 100, 100).unwrap();
        assert_eq!(out.dimensions(), (50, 50));
        assert_eq!(out.get_pixel(0, 0), native.get_pixel(350, 250));
        assert_eq!(out.get_pixel(49, 49), native.get_pixel(399, 299));
    }

    #[test]
    fn exact_crop_in_bounds_is_copied_verbatim() {
        let native = quadrant_image();
        let out = crop_exact(&native, 190, 140, 20, 20).unwrap();
        assert_eq!(out.dimensions(), (20, 20));
        // Spans all four quadrant boundaries without resampling artifacts.
        assert_eq!(out.get_pixel(0, 0), native.get_pixel(190, 140));
        assert_eq!(out.get_pixel(19, 19), native.get_pixel(209, 159));
    }

    #[test]
    fn exact_crop_starting_outside_the_image_is_rejected() {
        let native = quadrant_image();
        assert_eq!(
            crop_exact(&native, 400, 0, 10, 10),
            Err(CropError::OutOfBounds)
        );
        assert_eq!(crop_exact(&native, 0, 0, 0, 10), Err(CropError::ZeroArea));
    }

    #[test]
    fn source_rect_is_clamped_without_shifting_origin() {
        let native = quadrant_image();
        // 50px wide request starting 10px from the right edge.
        let out = crop_scaled(&native, 390, 0, 50, 50, 10, 50).unwrap();
        assert_eq!(out.dimensions(), (10, 50));
        assert_eq!(out.get_pixel(0, 0), native.get_pixel(390, 0));
    }
}
