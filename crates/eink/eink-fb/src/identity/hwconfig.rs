//! NTX HW CONFIG block
//!
//! Layout at the configured offset:
//!
//! | bytes  | field                          |
//! |--------|--------------------------------|
//! | 0..10  | magic, `"HW CONFIG "`          |
//! | 10..15 | version string (`"v3.1"`, ...) |
//! | 15     | payload length                 |
//! | 16..   | payload                        |

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsRawFd;
use std::path::Path;

use eink_specs::devices::kobo::HwConfigFields;

use crate::config::HwConfigLocation;
use crate::error::SourceError;
use crate::sys::i2c::blkgetsize64;

/// Magic at the start of the block
pub const HWCONFIG_MAGIC: &[u8; 10] = b"HW CONFIG ";
/// Header length, up to and including the payload length byte
pub const HWCONFIG_HEADER_LEN: usize = 16;

const HWCONFIG_MAX_LEN: u64 = HWCONFIG_HEADER_LEN as u64 + u8::MAX as u64;

/// A parsed block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwConfig {
    /// Version string, NUL padding stripped
    pub version: String,
    /// Raw payload
    pub payload: Vec<u8>,
}

impl HwConfig {
    /// Parse a block from its raw bytes.
    pub fn parse(path: &Path, block: &[u8]) -> Result<Self, SourceError> {
        let (Some(header), Some(rest)) = (block.get(..HWCONFIG_HEADER_LEN), block.get(HWCONFIG_HEADER_LEN..))
        else {
            return Err(SourceError::malformed(path, "truncated HW CONFIG header"));
        };
        if header.get(..HWCONFIG_MAGIC.len()) != Some(HWCONFIG_MAGIC.as_slice()) {
            return Err(SourceError::malformed(path, "no HW CONFIG magic"));
        }
        let version = header
            .get(HWCONFIG_MAGIC.len()..HWCONFIG_HEADER_LEN - 1)
            .map(|v| String::from_utf8_lossy(v).trim_end_matches('\0').to_owned())
            .unwrap_or_default();
        let len = header.last().copied().map_or(0, usize::from);
        if len == 0 {
            return Err(SourceError::malformed(path, "empty HW CONFIG payload"));
        }
        let payload = rest
            .get(..len)
            .ok_or_else(|| SourceError::malformed(path, "truncated HW CONFIG payload"))?;
        Ok(Self {
            version,
            payload: payload.to_vec(),
        })
    }

    /// Read and parse the block at `location`.
    pub fn read(location: &HwConfigLocation) -> Result<Self, SourceError> {
        let path = location.path.as_path();
        let mut file = File::open(path).map_err(|e| SourceError::unavailable(path, e))?;
        file.seek(SeekFrom::Start(location.offset))
            .map_err(|e| SourceError::unavailable(path, e))?;
        let mut block = Vec::new();
        file.take(HWCONFIG_MAX_LEN)
            .read_to_end(&mut block)
            .map_err(|e| SourceError::unavailable(path, e))?;
        Self::parse(path, &block)
    }

    /// Identification fields of the payload
    pub fn fields(&self) -> Option<HwConfigFields> {
        HwConfigFields::from_payload(&self.payload)
    }
}

/// Try every location in turn, returning the first block that parses.
pub(crate) fn read_first(
    locations: &[HwConfigLocation],
    mut on_error: impl FnMut(&SourceError),
) -> Option<HwConfig> {
    locations.iter().find_map(|location| match HwConfig::read(location) {
        Ok(block) => Some(block),
        Err(err) => {
            on_error(&err);
            None
        }
    })
}

/// Size of a block device, in bytes.
pub fn storage_size(path: &Path) -> Result<u64, SourceError> {
    let file = File::open(path).map_err(|e| SourceError::unavailable(path, e))?;
    let mut size: u64 = 0;
    // SAFETY: the kernel writes a single u64.
    unsafe { blkgetsize64(file.as_raw_fd(), &mut size) }
        .map_err(|errno| SourceError::unavailable(path, std::io::Error::from(errno)))?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn block(pcb: u8, payload_len: u8) -> Vec<u8> {
        let mut block = Vec::new();
        block.extend_from_slice(HWCONFIG_MAGIC);
        block.extend_from_slice(b"v3.1\0");
        block.push(payload_len);
        let mut payload = vec![0u8; usize::from(payload_len)];
        if let Some(first) = payload.first_mut() {
            *first = pcb;
        }
        block.extend_from_slice(&payload);
        block
    }

    #[test]
    fn test_parse() {
        let hw = HwConfig::parse(Path::new("mem"), &block(60, 64)).unwrap();
        assert_eq!(hw.version, "v3.1");
        assert_eq!(hw.payload.len(), 64);
        assert_eq!(hw.fields().unwrap().pcb, 60);
    }

    #[test]
    fn test_truncated_payload() {
        let mut raw = block(60, 64);
        raw.truncate(40);
        let err = HwConfig::parse(Path::new("mem"), &raw).unwrap_err();
        assert!(matches!(err, SourceError::Malformed { reason, .. } if reason.contains("payload")));
    }

    #[test]
    fn test_bad_magic() {
        let mut raw = block(60, 64);
        raw[0] = b'X';
        assert!(HwConfig::parse(Path::new("mem"), &raw).is_err());
        assert!(HwConfig::parse(Path::new("mem"), b"HW CON").is_err());
    }

    #[test]
    fn test_read_at_offset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xAA; 512]).unwrap();
        file.write_all(&block(22, 40)).unwrap();
        let location = HwConfigLocation {
            path: file.path().to_path_buf(),
            offset: 512,
        };
        assert_eq!(HwConfig::read(&location).unwrap().fields().unwrap().pcb, 22);
    }

    #[test]
    fn test_storage_size_of_regular_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(storage_size(file.path()).is_err());
    }
}
