//! Simulated device configuration

use eink_fb::ColorOrder;
use serde::{Deserialize, Serialize};

/// How the simulated kernel mangles a requested rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationCoercion {
    /// Applies what it is given
    #[default]
    Honest,
    /// Applies `r ^ 2` for every code (Kobo Forma/Libra style)
    AllInverted,
    /// Applies `r ^ 2` for landscape codes only
    OddInverted,
    /// Ignores the request and stays at the given code
    Stuck(u32),
}

impl RotationCoercion {
    /// The rotation the simulated kernel ends up applying for `requested`.
    pub const fn apply(self, requested: u32) -> u32 {
        match self {
            RotationCoercion::Honest => requested,
            RotationCoercion::AllInverted => requested ^ 2,
            RotationCoercion::OddInverted if requested & 1 == 1 => requested ^ 2,
            RotationCoercion::OddInverted => requested,
            RotationCoercion::Stuck(code) => code & 3,
        }
    }
}

/// Simulated framebuffer configuration
///
/// `xres` × `yres` is the panel at rotation 0; odd rotations swap them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Width at rotation 0
    pub xres: u32,
    /// Height at rotation 0
    pub yres: u32,
    /// Initial bitdepth
    pub bpp: u32,
    /// Initial grayscale flag
    pub grayscale: u32,
    /// Initial native rotation
    pub rotate: u32,
    /// Component order at 24/32bpp
    pub color_order: ColorOrder,
    /// Extra pixels at the end of every scanline
    pub scanline_padding: u32,
    /// Rotation coercion quirk
    pub coercion: RotationCoercion,
    /// Jiffies left reported by completion waits
    pub wait_remaining_jiffies: u32,
    /// Driver id reported in the fixed screen info
    pub driver_id: String,
    /// Video memory reserved at boot. `None` sizes it to the live mode.
    pub video_memory: Option<u32>,
}

impl SimConfig {
    /// A panel of `xres` × `yres` at `bpp`, everything else default.
    pub fn new(xres: u32, yres: u32, bpp: u32) -> Self {
        Self {
            xres,
            yres,
            bpp,
            ..Self::default()
        }
    }

    /// Kobo Clara HD: 1072×1448, 8bpp grayscale
    pub fn clara_hd() -> Self {
        Self::new(1072, 1448, 8)
    }

    /// Kobo Forma: 1440×1920, 8bpp, every code flipped and boot rotation 1
    pub fn forma() -> Self {
        Self {
            rotate: 1,
            coercion: RotationCoercion::AllInverted,
            ..Self::new(1440, 1920, 8)
        }
    }

    /// Kindle Paperwhite 4: 1072×1448 with 16 pixels of scanline padding
    pub fn paperwhite4() -> Self {
        Self {
            scanline_padding: 16,
            driver_id: "mxc_epdc_fb".to_owned(),
            ..Self::new(1072, 1448, 8)
        }
    }

    /// Kindle 4 (einkfb): 600×800, 4bpp
    pub fn kindle4() -> Self {
        Self {
            grayscale: 0,
            driver_id: "eink_fb".to_owned(),
            ..Self::new(600, 800, 4)
        }
    }

    /// Set the coercion quirk
    pub fn coercion(mut self, coercion: RotationCoercion) -> Self {
        self.coercion = coercion;
        self
    }

    /// Set the initial rotation
    pub fn rotate(mut self, rotate: u32) -> Self {
        self.rotate = rotate;
        self
    }

    /// Set the component order
    pub fn color_order(mut self, order: ColorOrder) -> Self {
        self.color_order = order;
        self
    }

    /// Set the jiffies reported by completion waits
    pub fn wait_remaining_jiffies(mut self, jiffies: u32) -> Self {
        self.wait_remaining_jiffies = jiffies;
        self
    }

    /// Reserve a fixed amount of video memory, like a kernel sized at boot.
    pub fn video_memory(mut self, bytes: u32) -> Self {
        self.video_memory = Some(bytes);
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            xres: 1072,
            yres: 1448,
            bpp: 8,
            grayscale: 1,
            rotate: 0,
            color_order: ColorOrder::Bgr,
            scanline_padding: 0,
            coercion: RotationCoercion::Honest,
            wait_remaining_jiffies: 0,
            driver_id: "mxc_epdc_fb".to_owned(),
            video_memory: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion() {
        for r in 0..4 {
            assert_eq!(RotationCoercion::Honest.apply(r), r);
            assert_eq!(RotationCoercion::AllInverted.apply(r), r ^ 2);
            assert_eq!(RotationCoercion::Stuck(2).apply(r), 2);
        }
        assert_eq!(RotationCoercion::OddInverted.apply(1), 3);
        assert_eq!(RotationCoercion::OddInverted.apply(2), 2);
    }

    #[test]
    fn test_json() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "xres": 758, "yres": 1024, "coercion": "all_inverted" }"#).unwrap();
        assert_eq!(config.xres, 758);
        assert_eq!(config.bpp, 8);
        assert_eq!(config.coercion, RotationCoercion::AllInverted);

        let stuck: SimConfig = serde_json::from_str(r#"{ "coercion": { "stuck": 3 } }"#).unwrap();
        assert_eq!(stuck.coercion, RotationCoercion::Stuck(3));
    }
}
