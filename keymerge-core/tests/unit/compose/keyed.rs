use super::*;
use image::{GenericImageView, GrayImage, Luma, RgbaImage};

use crate::raster::view::Rgba16Buffer;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn row(pixels: &[[u8; 4]]) -> DynamicImage {
    let mut img = RgbaImage::new(pixels.len() as u32, 1);
    for (x, px) in pixels.iter().enumerate() {
        img.put_pixel(x as u32, 0, Rgba(*px));
    }
    DynamicImage::ImageRgba8(img)
}

fn merged(key: KeyColor, layers: &[DynamicImage]) -> DynamicImage {
    combine(key, layers).unwrap().unwrap().into_owned()
}

fn px(img: &DynamicImage, x: u32) -> [u8; 4] {
    img.get_pixel(x, 0).0
}

#[test]
fn empty_stack_is_absent() {
    assert!(combine(KeyColor::WHITE, &[]).unwrap().is_none());
    assert!(
        combine_rasters::<Rgba<u16>, RgbaImage>(KeyColor::WHITE, &[])
            .unwrap()
            .is_none()
    );
}

#[test]
fn single_layer_is_borrowed_unchanged() {
    let layers = [row(&[WHITE, RED, [1, 2, 3, 0]])];
    let out = combine(KeyColor::from_rgba8(RED), &layers).unwrap().unwrap();
    let Cow::Borrowed(img) = out else {
        panic!("single layer should pass through");
    };
    assert!(std::ptr::eq(img, &layers[0]));
}

#[test]
fn key_pixels_take_overlay_color() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let layers = [row(&[WHITE, RED]), row(&[GREEN, WHITE])];
    let out = merged(KeyColor::WHITE, &layers);
    assert_eq!(px(&out, 0), GREEN);
    assert_eq!(px(&out, 1), RED);
}

#[test]
fn transparent_overlay_pixel_is_ignored() {
    let layers = [row(&[WHITE]), row(&[[0, 0, 0, 0]])];
    assert_eq!(px(&merged(KeyColor::WHITE, &layers), 0), WHITE);
}

#[test]
fn overlay_alpha_is_taken_with_its_color() {
    let layers = [row(&[WHITE]), row(&[[10, 20, 30, 1]])];
    assert_eq!(px(&merged(KeyColor::WHITE, &layers), 0), [10, 20, 30, 1]);
}

#[test]
fn later_layers_win_only_while_pixel_is_still_key() {
    let layers = [row(&[WHITE]), row(&[GREEN]), row(&[BLUE])];
    assert_eq!(px(&merged(KeyColor::WHITE, &layers), 0), GREEN);
}

#[test]
fn key_colored_overlay_leaves_pixel_open_for_next_layer() {
    let layers = [row(&[WHITE]), row(&[WHITE]), row(&[RED])];
    assert_eq!(px(&merged(KeyColor::WHITE, &layers), 0), RED);
}

#[test]
fn current_pixel_alpha_is_not_part_of_the_match() {
    let layers = [row(&[[255, 255, 255, 0]]), row(&[BLUE])];
    assert_eq!(px(&merged(KeyColor::WHITE, &layers), 0), BLUE);
}

#[test]
fn key_alpha_is_not_part_of_the_match() {
    let key = KeyColor::from_rgba8([255, 255, 255, 0]);
    let layers = [row(&[WHITE]), row(&[BLUE])];
    assert_eq!(px(&merged(key, &layers), 0), BLUE);
}

#[test]
fn base_alpha_is_preserved() {
    let layers = [row(&[[1, 2, 3, 4], WHITE]), row(&[RED, RED])];
    let out = merged(KeyColor::WHITE, &layers);
    assert_eq!(px(&out, 0), [1, 2, 3, 4]);
    assert_eq!(px(&out, 1), RED);
}

#[test]
fn base_is_not_mutated() {
    let layers = [row(&[WHITE]), row(&[RED])];
    let _ = merged(KeyColor::WHITE, &layers);
    assert_eq!(px(&layers[0], 0), WHITE);
}

#[test]
fn output_bounds_follow_base() {
    for (w, h) in [(1, 1), (10, 7), (256, 256)] {
        let layers = [
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(WHITE))),
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(GREEN))),
        ];
        let out = merged(KeyColor::WHITE, &layers);
        assert_eq!((out.width(), out.height()), (w, h));
        assert_eq!(out.get_pixel(w - 1, h - 1).0, GREEN);
    }
}

#[test]
fn mismatched_overlay_is_rejected() {
    let layers = [row(&[WHITE, WHITE]), row(&[RED, RED]), row(&[RED])];
    let err = combine(KeyColor::WHITE, &layers).unwrap_err();
    match err {
        KeymergeError::DimensionMismatch {
            index,
            expected,
            found,
        } => {
            assert_eq!(index, 2);
            assert_eq!(expected, (2, 1));
            assert_eq!(found, (1, 1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn larger_overlay_is_rejected_too() {
    let layers = [row(&[WHITE]), row(&[RED, RED])];
    assert!(matches!(
        combine(KeyColor::WHITE, &layers),
        Err(KeymergeError::DimensionMismatch { index: 1, .. })
    ));
}

#[test]
fn mixed_formats_compare_on_the_16_bit_scale() {
    let gray_white = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([255])));
    let layers = [gray_white, row(&[RED])];
    let out = merged(KeyColor::WHITE, &layers);
    assert_eq!(px(&out, 0), RED);
    assert!(matches!(out, DynamicImage::ImageRgba8(_)));
}

#[test]
fn sixteen_bit_near_key_is_not_key() {
    let base = Rgba16Buffer::from_pixel(1, 1, Rgba([0xffff, 0xffff, 0xfffe, 0xffff]));
    let layers = [DynamicImage::ImageRgba16(base), row(&[RED])];
    let out = merged(KeyColor::WHITE, &layers);
    let DynamicImage::ImageRgba16(buf) = out else {
        panic!("16-bit input should keep a 16-bit result");
    };
    assert_eq!(buf.get_pixel(0, 0).0, [0xffff, 0xffff, 0xfffe, 0xffff]);
}

#[test]
fn generic_engine_works_on_plain_buffers() {
    let base = RgbaImage::from_pixel(2, 2, Rgba(WHITE));
    let top = RgbaImage::from_pixel(2, 2, Rgba(BLUE));
    let out = combine_rasters::<Rgba<u16>, _>(KeyColor::WHITE, &[base, top])
        .unwrap()
        .unwrap();
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0xffff, 0xffff]));
}

#[test]
fn eight_bit_stack_accumulates_in_an_rgba8_buffer() {
    let mut base = RgbaImage::from_pixel(2, 1, Rgba(WHITE));
    base.put_pixel(1, 0, Rgba([1, 2, 3, 4]));
    let top = RgbaImage::from_pixel(2, 1, Rgba(BLUE));

    let out: RgbaImage = combine_rasters::<Rgba<u8>, _>(KeyColor::WHITE, &[base, top])
        .unwrap()
        .unwrap();
    assert_eq!(out.get_pixel(0, 0).0, BLUE);
    assert_eq!(out.get_pixel(1, 0).0, [1, 2, 3, 4]);
}

#[test]
fn eight_bit_buffer_still_matches_on_the_16_bit_scale() {
    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([254])));
    let layers = [gray, row(&[RED])];
    let out = combine_rasters::<Rgba<u8>, _>(KeyColor::WHITE, &layers)
        .unwrap()
        .unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [254, 254, 254, 255]);
}
