use image::{Rgba, RgbaImage};
use retouch_studio::components::masks::{
    CompositeMode, MaskEngine, MaskLayer, MaskRole, EDIT_MARKER,
};

fn engine() -> MaskEngine {
    MaskEngine::new(120, 90)
}

fn alpha_at(engine: &MaskEngine, role: MaskRole, x: u32, y: u32) -> u8 {
    engine.layer(role).pixels().get_pixel(x, y)[3]
}

fn total_alpha(engine: &MaskEngine, role: MaskRole) -> u64 {
    engine
        .layer(role)
        .pixels()
        .pixels()
        .map(|px| px[3] as u64)
        .sum()
}

mod emptiness {
    use super::*;

    #[test]
    fn fresh_engine_has_no_content() {
        let engine = engine();
        assert!(!engine.edit_has_content());
        assert!(!engine.preserve_has_content());
    }

    #[test]
    fn has_content_after_any_stroke() {
        let mut engine = engine();
        engine.begin_stroke(MaskRole::Edit, (60.0, 45.0), 20.0, CompositeMode::Union);
        engine.end_stroke();
        assert!(engine.edit_has_content());
        assert!(!engine.preserve_has_content());
    }

    #[test]
    fn clear_resets_both_flags() {
        let mut engine = engine();
        engine.begin_stroke(MaskRole::Edit, (60.0, 45.0), 20.0, CompositeMode::Union);
        engine.begin_stroke(MaskRole::Preserve, (30.0, 30.0), 20.0, CompositeMode::Union);
        engine.end_stroke();
        engine.clear_all();
        assert!(!engine.edit_has_content());
        assert!(!engine.preserve_has_content());
        assert_eq!(total_alpha(&engine, MaskRole::Edit), 0);
        assert_eq!(total_alpha(&engine, MaskRole::Preserve), 0);
    }

    #[test]
    fn eraser_covering_the_stroke_empties_the_layer() {
        let mut engine = engine();
        engine.begin_stroke(MaskRole::Edit, (60.0, 45.0), 12.0, CompositeMode::Union);
        engine.end_stroke();
        assert!(engine.edit_has_content());

        // Eraser much wider than the painted dab, centered on it.
        engine.begin_stroke(MaskRole::Edit, (60.0, 45.0), 60.0, CompositeMode::Subtract);
        engine.end_stroke();

        assert!(!engine.edit_has_content());
        assert_eq!(total_alpha(&engine, MaskRole::Edit), 0);
    }

    #[test]
    fn alpha_is_the_sole_semantic_channel() {
        let mut layer = MaskLayer::new(16, 16, EDIT_MARKER);
        // Colored pixels with zero alpha are not content.
        let mut colored = RgbaImage::new(16, 16);
        for px in colored.pixels_mut() {
            *px = Rgba([255, 0, 0, 0]);
        }
        layer.replace(&colored);
        assert!(!layer.has_content());
    }
}

mod compositing {
    use super::*;

    #[test]
    fn union_strokes_only_add_coverage() {
        let mut engine = engine();
        engine.extend_stroke(
            MaskRole::Edit,
            (20.0, 45.0),
            (100.0, 45.0),
            16.0,
            CompositeMode::Union,
        );
        engine.end_stroke();
        let first_pass = total_alpha(&engine, MaskRole::Edit);
        assert!(first_pass > 0);

        engine.extend_stroke(
            MaskRole::Edit,
            (20.0, 45.0),
            (100.0, 45.0),
            16.0,
            CompositeMode::Union,
        );
        engine.end_stroke();
        let second_pass = total_alpha(&engine, MaskRole::Edit);
        assert!(second_pass >= first_pass);

        // Interior alpha is capped at the marker opacity, never beyond.
        assert_eq!(alpha_at(&engine, MaskRole::Edit, 60, 45), EDIT_MARKER[3]);
    }

    #[test]
    fn eraser_hits_both_layers_regardless_of_what_painted_them() {
        let mut engine = engine();
        engine.begin_stroke(MaskRole::Edit, (60.0, 45.0), 20.0, CompositeMode::Union);
        engine.begin_stroke(MaskRole::Preserve, (60.0, 45.0), 20.0, CompositeMode::Union);
        engine.end_stroke();

        // The app routes one Subtract per layer for an eraser stroke.
        engine.begin_stroke(MaskRole::Edit, (60.0, 45.0), 80.0, CompositeMode::Subtract);
        engine.begin_stroke(MaskRole::Preserve, (60.0, 45.0), 80.0, CompositeMode::Subtract);
        engine.end_stroke();

        assert!(!engine.edit_has_content());
        assert!(!engine.preserve_has_content());
    }

    #[test]
    fn overlapping_edit_and_preserve_do_not_subtract() {
        // Intentional non-invariant: the engine performs no boolean
        // subtraction between the layers. Preserve-wins is a downstream
        // service contract, not geometry here.
        let mut engine = engine();
        engine.begin_stroke(MaskRole::Edit, (60.0, 45.0), 24.0, CompositeMode::Union);
        engine.end_stroke();
        let edit_before = total_alpha(&engine, MaskRole::Edit);

        let mut bw = RgbaImage::new(120, 90);
        for px in bw.pixels_mut() {
            *px = Rgba([255, 255, 255, 255]); // everything selected
        }
        engine.set_preserve_from_segmentation(&bw);

        assert!(engine.preserve_has_content());
        assert_eq!(total_alpha(&engine, MaskRole::Edit), edit_before);
    }
}

mod segmentation_replace {
    use super::*;

    fn half_white(left: bool) -> RgbaImage {
        let mut bw = RgbaImage::new(120, 90);
        for (x, _y, px) in bw.enumerate_pixels_mut() {
            let white = if left { x < 60 } else { x >= 60 };
            *px = if white {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            };
        }
        bw
    }

    #[test]
    fn replaces_rather_than_merges() {
        let mut engine = engine();
        engine.set_preserve_from_segmentation(&half_white(true));
        assert!(alpha_at(&engine, MaskRole::Preserve, 10, 45) > 0);
        assert_eq!(alpha_at(&engine, MaskRole::Preserve, 110, 45), 0);

        engine.set_preserve_from_segmentation(&half_white(false));
        // Prior left-half coverage is gone, not unioned in.
        assert_eq!(alpha_at(&engine, MaskRole::Preserve, 10, 45), 0);
        assert!(alpha_at(&engine, MaskRole::Preserve, 110, 45) > 0);
    }

    #[test]
    fn native_resolution_input_is_rescaled_to_display_size() {
        let mut engine = engine();
        // Service output keyed to a 480x360 native image.
        let mut bw = RgbaImage::new(480, 360);
        for px in bw.pixels_mut() {
            *px = Rgba([255, 255, 255, 255]);
        }
        engine.set_preserve_from_segmentation(&bw);
        let layer = engine.layer(MaskRole::Preserve);
        assert_eq!((layer.width(), layer.height()), (120, 90));
        assert!(engine.preserve_has_content());
    }
}

mod native_export {
    use super::*;

    #[test]
    fn empty_layer_exports_as_no_mask() {
        let engine = engine();
        assert!(engine.export_native(MaskRole::Edit, 960, 720).is_none());
    }

    #[test]
    fn export_matches_native_dimensions_regardless_of_display_size() {
        for (dw, dh) in [(120u32, 90u32), (640, 480), (37, 53)] {
            let mut engine = MaskEngine::new(dw, dh);
            engine.begin_stroke(
                MaskRole::Edit,
                (dw as f32 / 2.0, dh as f32 / 2.0),
                (dw.min(dh) as f32) / 3.0,
                CompositeMode::Union,
            );
            engine.end_stroke();

            let exported = engine
                .export_native(MaskRole::Edit, 960, 720)
                .expect("painted layer exports");
            assert_eq!(exported.dimensions(), (960, 720));
            assert!(exported.pixels().any(|px| px[3] > 0));
        }
    }

    #[test]
    fn sub_pixel_stroke_that_vanishes_on_downscale_is_no_mask() {
        let mut layer = MaskLayer::new(512, 512, EDIT_MARKER);
        // A single ~1px dot disappears when resampled to 1x1.
        layer.paint_segment((256.0, 256.0), (256.0, 256.0), 1.0, CompositeMode::Union);
        layer.rescan();
        assert!(layer.has_content());
        assert!(layer.export_native(1, 1).is_none());
    }
}
