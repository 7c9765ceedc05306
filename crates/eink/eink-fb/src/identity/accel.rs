//! KX122 accelerometer orientation
//!
//! Devices with a gyro (Kobo Forma, Libra, Elipsa, Sage) expose a KX122 on I²C. Its tilt
//! position register says which edge of the panel points up.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use crate::sys::i2c::{i2c_slave_force, kx122};

/// Register access on a point-to-point bus
pub trait RegisterBus {
    /// Error type
    type Error: std::error::Error + 'static;

    /// Write `write`, then read into `read` (register address, then value).
    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error>;

    /// Read one 8-bit register
    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.write_read(&[register], &mut value)?;
        let [value] = value;
        Ok(value)
    }
}

/// Accelerometer errors
#[derive(Debug, thiserror::Error)]
pub enum AccelError<E: std::error::Error + 'static> {
    /// Bus transfer failed
    #[error("i2c transfer failed: {0}")]
    Bus(#[source] E),
    /// Something other than a KX122 answered
    #[error("unexpected WHO_AM_I {0:#04x}")]
    WrongChip(u8),
}

/// Location of the chip: bus number and slave address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cAddress {
    /// `N` in `/dev/i2c-N`
    pub bus: u32,
    /// 7-bit slave address
    pub addr: u16,
}

impl I2cAddress {
    /// Parse a sysfs device name, `"<bus>-<addr hex>"` (e.g. `"1-001e"`).
    pub fn from_sysfs_name(name: &str) -> Option<Self> {
        let (bus, addr) = name.split_once('-')?;
        Some(Self {
            bus: bus.parse().ok()?,
            addr: u16::from_str_radix(addr, 16).ok()?,
        })
    }
}

/// Find the KX122 bound to its kernel driver.
pub fn discover(driver_dir: &Path) -> std::io::Result<Option<I2cAddress>> {
    for entry in std::fs::read_dir(driver_dir)? {
        let name = entry?.file_name();
        if let Some(address) = name.to_str().and_then(I2cAddress::from_sysfs_name) {
            return Ok(Some(address));
        }
    }
    Ok(None)
}

/// Map a tilt position register value to a native rotation code.
///
/// Face up/down carries no orientation.
pub const fn tilt_to_rotation(tscp: u8) -> Option<u32> {
    if tscp & kx122::TSCP_UP != 0 {
        Some(0)
    } else if tscp & kx122::TSCP_RI != 0 {
        Some(1)
    } else if tscp & kx122::TSCP_DO != 0 {
        Some(2)
    } else if tscp & kx122::TSCP_LE != 0 {
        Some(3)
    } else {
        None
    }
}

/// Check the chip id, then read its orientation.
pub fn read_orientation<B: RegisterBus>(bus: &mut B) -> Result<Option<u32>, AccelError<B::Error>> {
    let id = bus.read_register(kx122::WHO_AM_I).map_err(AccelError::Bus)?;
    if id != kx122::WHO_AM_I_WIA_ID {
        return Err(AccelError::WrongChip(id));
    }
    let tscp = bus.read_register(kx122::TSCP).map_err(AccelError::Bus)?;
    Ok(tilt_to_rotation(tscp))
}

/// `/dev/i2c-N` with a forced slave address
#[derive(Debug)]
pub struct LinuxI2cBus {
    file: File,
}

impl LinuxI2cBus {
    /// Open the bus and claim `address`, even though the kernel driver holds it.
    pub fn open(dev_dir: &Path, address: I2cAddress) -> std::io::Result<Self> {
        let path: PathBuf = dev_dir.join(format!("i2c-{}", address.bus));
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        // SAFETY: the slave address is passed by value.
        unsafe { i2c_slave_force(file.as_raw_fd(), libc::c_int::from(address.addr)) }?;
        Ok(Self { file })
    }
}

impl RegisterBus for LinuxI2cBus {
    type Error = std::io::Error;

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> std::io::Result<()> {
        self.file.write_all(write)?;
        self.file.read_exact(read)
    }
}

/// Discover the chip under `driver_dir`, then read its orientation over `/dev/i2c-N`.
///
/// `Ok(None)` if no KX122 is bound.
pub fn read_linux(driver_dir: &Path, dev_dir: &Path) -> Result<Option<u32>, AccelError<std::io::Error>> {
    let Some(address) = discover(driver_dir).map_err(AccelError::Bus)? else {
        return Ok(None);
    };
    let mut bus = LinuxI2cBus::open(dev_dir, address).map_err(AccelError::Bus)?;
    read_orientation(&mut bus)
}
