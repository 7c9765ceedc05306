#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Property-based tests for the pixel accessors, through a live session.

use eink_fb::{Color, ColorOrder, Region};
use eink_testing::{SimConfig, TestHarness};
use proptest::prelude::*;

const WIDTH: u32 = 33;
const HEIGHT: u32 = 17;

fn any_bpp() -> impl Strategy<Value = u32> {
    prop_oneof![Just(4u32), Just(8), Just(16), Just(24), Just(32)]
}

fn any_order() -> impl Strategy<Value = ColorOrder> {
    prop_oneof![Just(ColorOrder::Bgr), Just(ColorOrder::Rgb)]
}

fn any_color() -> impl Strategy<Value = Color> {
    (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Color::rgb(r, g, b))
}

fn panel(bpp: u32, order: ColorOrder, padding: u32) -> TestHarness {
    let sim = SimConfig {
        scanline_padding: padding,
        ..SimConfig::new(WIDTH, HEIGHT, bpp).color_order(order)
    };
    TestHarness::generic(sim).unwrap()
}

proptest! {
    /// A pixel reads back as its quantized color, whatever the format.
    #[test]
    fn set_then_get_quantizes(
        bpp in any_bpp(),
        order in any_order(),
        padding in 0u32..8,
        x in 0..WIDTH,
        y in 0..HEIGHT,
        color in any_color(),
    ) {
        let mut t = panel(bpp, order, padding);
        t.set_pixel(x, y, color);
        let format = t.accessor().format();
        prop_assert_eq!(t.get_pixel(x, y), format.quantize(color));
    }

    /// Writing a pixel leaves every other pixel alone (4bpp shares bytes between neighbors).
    #[test]
    fn set_leaves_neighbors(
        bpp in any_bpp(),
        x in 0..WIDTH,
        y in 0..HEIGHT,
        luma in any::<u8>(),
    ) {
        let mut t = panel(bpp, ColorOrder::Bgr, 0);
        t.set_pixel(x, y, Color::gray(luma));
        for ny in 0..HEIGHT {
            for nx in 0..WIDTH {
                if (nx, ny) != (x, y) {
                    prop_assert_eq!(t.get_pixel(nx, ny), Color::WHITE, "({}, {}) changed", nx, ny);
                }
            }
        }
    }

    /// Quantizing is idempotent.
    #[test]
    fn quantize_is_stable(bpp in any_bpp(), order in any_order(), color in any_color()) {
        let t = panel(bpp, order, 0);
        let format = t.accessor().format();
        let once = format.quantize(color);
        prop_assert_eq!(format.quantize(once), once);
    }

    /// Rectangles fill exactly their clipped area.
    #[test]
    fn fill_rect_is_exact(
        bpp in any_bpp(),
        left in 0..WIDTH,
        top in 0..HEIGHT,
        width in 1u32..40,
        height in 1u32..40,
    ) {
        let mut t = panel(bpp, ColorOrder::Rgb, 3);
        t.fill_rect(Region::new(left, top, width, height), Color::BLACK);
        let right = left.saturating_add(width).min(WIDTH);
        let bottom = top.saturating_add(height).min(HEIGHT);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let inside = (left..right).contains(&x) && (top..bottom).contains(&y);
                let expected = if inside { 0x00 } else { 0xFF };
                prop_assert_eq!(t.pixel_at(x, y), Some(expected), "({}, {})", x, y);
            }
        }
    }
}
