//! E-Reader Framebuffer Testing Utilities
//!
//! Headless harness running a real [`FbSession`] on top of the simulated driver from
//! `eink-emulator`.
//!
//! # Quick start
//!
//! ```no_run
//! use eink_testing::TestHarness;
//! use eink_emulator::SimConfig;
//! use embedded_graphics::{pixelcolor::Gray8, prelude::*, primitives::{PrimitiveStyle, Rectangle}};
//!
//! let mut t = TestHarness::kobo(376, SimConfig::clara_hd()).unwrap();
//!
//! Rectangle::new(Point::new(10, 10), Size::new(40, 20))
//!     .into_styled(PrimitiveStyle::with_fill(Gray8::BLACK))
//!     .draw(&mut t)
//!     .unwrap();
//!
//! t.assert_pixel(20, 15, 0x00).unwrap();
//! let marker = t.refresh(&eink_fb::RefreshRequest::full_screen()).unwrap();
//! t.wait_for_completion(marker).unwrap();
//! ```
//!
//! # Golden screenshot testing
//!
//! ```no_run
//! # use eink_testing::TestHarness;
//! # let t = TestHarness::generic(eink_emulator::SimConfig::new(100, 100, 8)).unwrap();
//! // First run: set UPDATE_GOLDEN=1 to create/update the reference file.
//! t.assert_matches_golden("tests/golden/my_screen.png", 0).unwrap();
//! ```

#![warn(clippy::all)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]

use std::path::Path;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

pub use eink_emulator::{RecordedUpdate, RotationCoercion, SimConfig, SimOp, SimulatedFb};
pub use eink_fb::{DeviceQuirks, FbConfig, FbError, FbSession};

use eink_fb::devices::{kindle, kobo, lookup};
use eink_fb::Color;

/// Install a `tracing` subscriber honoring `RUST_LOG` (default `warn`), writing through the
/// test harness capture. Safe to call from every test.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// TestHarness
// ─────────────────────────────────────────────────────────────────────────────

/// Headless framebuffer session for testing.
///
/// Derefs to [`FbSession`], so every session operation is available directly, and
/// implements [`DrawTarget`] (in viewport coordinates) for embedded-graphics primitives.
#[derive(Debug)]
pub struct TestHarness {
    session: FbSession<SimulatedFb>,
}

impl TestHarness {
    /// Session on a simulated driver with an explicit quirk record.
    ///
    /// Both diagnostics channels are on, so `RUST_LOG=debug` shows the session's detail output.
    pub fn new(sim: SimConfig, quirks: DeviceQuirks) -> Result<Self, FbError> {
        let config = FbConfig {
            verbose: true,
            ..FbConfig::default()
        };
        Self::with_config(sim, quirks, config)
    }

    /// Session on a simulated driver with an explicit quirk record and session config.
    pub fn with_config(sim: SimConfig, quirks: DeviceQuirks, config: FbConfig) -> Result<Self, FbError> {
        init_tracing();
        Ok(Self {
            session: FbSession::with_quirks(SimulatedFb::new(sim), config, quirks)?,
        })
    }

    /// Session for the Kobo with product id `id` (the unknown Kobo record if not in the table).
    pub fn kobo(id: u16, sim: SimConfig) -> Result<Self, FbError> {
        Self::new(sim, lookup(kobo::KOBO_MODELS, id).unwrap_or(kobo::KOBO_UNKNOWN))
    }

    /// Session for the Kindle with device code `id` (base-32 table first, then legacy codes).
    pub fn kindle(id: u16, sim: SimConfig) -> Result<Self, FbError> {
        let quirks = lookup(kindle::KINDLE_MODELS, id)
            .or_else(|| lookup(kindle::KINDLE_LEGACY_ID_MODELS, id))
            .unwrap_or(kindle::KINDLE_UNKNOWN);
        Self::new(sim, quirks)
    }

    /// Session with generic fbdev quirks.
    pub fn generic(sim: SimConfig) -> Result<Self, FbError> {
        Self::new(sim, DeviceQuirks::GENERIC)
    }

    /// The simulated driver
    pub fn sim(&self) -> &SimulatedFb {
        self.session.backend()
    }

    /// The simulated driver, mutably (failure injection)
    pub fn sim_mut(&mut self) -> &mut SimulatedFb {
        self.session.backend_mut()
    }

    /// Last refresh the driver accepted
    pub fn last_update(&self) -> Option<&RecordedUpdate> {
        self.sim().updates().last()
    }

    // ── Framebuffer access ───────────────────────────────────────────────────

    /// Luma at `(x, y)` in framebuffer coordinates, or `None` if out of bounds.
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<u8> {
        let g = self.session.geometry();
        (x < g.xres && y < g.yres).then(|| self.session.get_pixel(x, y).luma())
    }

    // ── Pixel assertions ─────────────────────────────────────────────────────

    /// Assert that pixel `(x, y)` has the expected luma, after quantizing to the live format.
    pub fn assert_pixel(&self, x: u32, y: u32, expected: u8) -> Result<(), String> {
        let actual = self
            .pixel_at(x, y)
            .ok_or_else(|| format!("Pixel ({x}, {y}) is out of bounds"))?;
        let expected = self.session.accessor().format().quantize(Color::gray(expected)).luma();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("assert_pixel({x}, {y}): expected luma {expected}, got luma {actual}"))
        }
    }

    /// Assert that every pixel inside `rect` has the given luma.
    pub fn assert_region_uniform(&self, rect: Rectangle, expected: u8) -> Result<(), String> {
        let Some(bottom_right) = rect.bottom_right() else {
            return Ok(());
        };
        for y in rect.top_left.y..=bottom_right.y {
            for x in rect.top_left.x..=bottom_right.x {
                let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
                    return Err(format!("assert_region_uniform: ({x}, {y}) is off screen"));
                };
                self.assert_pixel(x, y, expected).map_err(|e| {
                    format!(
                        "assert_region_uniform failed in {}x{}+{}+{}: {e}",
                        rect.size.width, rect.size.height, rect.top_left.x, rect.top_left.y
                    )
                })?;
            }
        }
        Ok(())
    }

    // ── Screenshots ──────────────────────────────────────────────────────────

    /// Save the visible screen as a grayscale PNG.
    pub fn screenshot(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        self.sim().screenshot(path)?;
        Ok(())
    }

    /// Save the current screen as the golden reference PNG.
    ///
    /// Parent directories are created automatically.
    pub fn save_golden(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let p = path.as_ref();
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.screenshot(p)
    }

    /// Assert the current screen matches a golden reference PNG.
    ///
    /// `threshold` is the largest luma difference still considered equal.
    ///
    /// Set `UPDATE_GOLDEN=1` to **update** the golden file instead of asserting.
    pub fn assert_matches_golden(&self, golden_path: impl AsRef<Path>, threshold: u8) -> Result<(), String> {
        let golden_path = golden_path.as_ref();

        if std::env::var("UPDATE_GOLDEN").is_ok() {
            return self
                .save_golden(golden_path)
                .map_err(|e| format!("Failed to save golden '{}': {e}", golden_path.display()));
        }

        let golden = image::open(golden_path)
            .map_err(|e| {
                format!(
                    "Failed to open golden '{}': {e}\nRun with UPDATE_GOLDEN=1 to create it.",
                    golden_path.display()
                )
            })?
            .to_luma8();

        let (xres, yres) = self.sim().resolution();
        if golden.dimensions() != (xres, yres) {
            let (gw, gh) = golden.dimensions();
            return Err(format!("Dimension mismatch: screen is {xres}×{yres}, golden is {gw}×{gh}"));
        }

        let current = self.sim().luma();
        let diff_pixels = current
            .iter()
            .zip(golden.as_raw())
            .filter(|(c, g)| c.abs_diff(**g) > threshold)
            .count();
        if diff_pixels == 0 {
            Ok(())
        } else {
            Err(format!(
                "{diff_pixels} pixels differ from golden '{}' (threshold={threshold})",
                golden_path.display()
            ))
        }
    }
}

impl std::ops::Deref for TestHarness {
    type Target = FbSession<SimulatedFb>;
    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl std::ops::DerefMut for TestHarness {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl OriginDimensions for TestHarness {
    fn size(&self) -> Size {
        let g = self.session.geometry();
        Size::new(g.view_width, g.view_height)
    }
}

impl DrawTarget for TestHarness {
    type Color = Gray8;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let g = *self.session.geometry();
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x >= g.view_width || y >= g.view_height {
                continue;
            }
            self.session.set_pixel(
                x.saturating_add(g.view_hori_origin),
                y.saturating_add(g.view_vert_origin),
                Color::gray(color.luma()),
            );
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let (Ok(left), Ok(top)) = (u32::try_from(area.top_left.x), u32::try_from(area.top_left.y)) else {
            return self.draw_iter(area.points().map(|p| Pixel(p, color)));
        };
        self.session.fill_rect(
            eink_fb::Region::new(left, top, area.size.width, area.size.height),
            Color::gray(color.luma()),
        );
        Ok(())
    }
}
