//! i2c-dev and block device requests used by identification

use nix::{ioctl_read_bad, ioctl_write_int_bad, request_code_read};

/// Claim a slave address even if a kernel driver is bound to it
pub const I2C_SLAVE_FORCE: u32 = 0x0706;

ioctl_write_int_bad!(i2c_slave_force, I2C_SLAVE_FORCE);

// BLKGETSIZE64 is declared as _IOR(0x12, 114, size_t), but the kernel always writes a u64
ioctl_read_bad!(
    blkgetsize64,
    request_code_read!(0x12, 114, core::mem::size_of::<libc::size_t>()),
    u64
);

/// KX122 accelerometer registers
pub mod kx122 {
    pub const WHO_AM_I: u8 = 0x0F;
    pub const WHO_AM_I_WIA_ID: u8 = 0x1B;
    /// Current tilt position
    pub const TSCP: u8 = 0x10;

    pub const TSCP_LE: u8 = 1 << 5;
    pub const TSCP_RI: u8 = 1 << 4;
    pub const TSCP_DO: u8 = 1 << 3;
    pub const TSCP_UP: u8 = 1 << 2;
    pub const TSCP_FD: u8 = 1 << 1;
    pub const TSCP_FU: u8 = 1 << 0;
}

#[cfg(test)]
mod tests {
    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_blkgetsize64_code() {
        assert_eq!(nix::request_code_read!(0x12, 114, 8) as u32, 0x8008_1272);
    }
}
