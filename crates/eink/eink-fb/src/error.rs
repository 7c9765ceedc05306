//! Error types
//!
//! [`FbError`] covers everything a session operation can fail with. Identification never
//! fails as a whole; [`SourceError`] is the local failure of one identity source, logged and
//! then skipped in favor of the next one.

use std::path::PathBuf;

use nix::errno::Errno;

/// Broad error classes, for callers that only need to decide what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid parameter, rejected before any hardware access
    Config,
    /// A kernel request failed
    Hardware,
    /// Not available on this device or driver, and never will be
    Unsupported,
    /// Operation is not valid in the current session state
    State,
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum FbError {
    /// Rotation code outside `0..=3`
    #[error("invalid rotation {0} (expected 0..=3)")]
    InvalidRotation(u32),

    /// Bitdepth outside {4, 8, 16, 32}
    #[error("unsupported bitdepth {0}bpp (expected 4, 8, 16 or 32)")]
    InvalidBitDepth(u32),

    /// Grayscale value outside the accepted set
    #[error("invalid grayscale value {0:#x}")]
    InvalidGrayscale(u32),

    /// Refresh region with a single zero dimension, or a 1x1 region
    #[error("bogus refresh region {width}x{height}")]
    BogusRegion {
        /// Region width
        width: u32,
        /// Region height
        height: u32,
    },

    /// Refresh region not fully on-screen
    #[error("region {width}x{height}+{left}+{top} is outside of the {xres}x{yres} screen")]
    RegionOutOfBounds {
        /// Region top, after viewport translation
        top: u32,
        /// Region left, after viewport translation
        left: u32,
        /// Region width
        width: u32,
        /// Region height
        height: u32,
        /// Screen width
        xres: u32,
        /// Screen height
        yres: u32,
    },

    /// Wait on the last marker before any refresh was issued
    #[error("no update marker has been issued yet")]
    NoMarker,

    /// Not implemented by this device's driver
    #[error("{feature} is not supported on {device}")]
    Unsupported {
        /// What was asked for
        feature: &'static str,
        /// Device or driver name
        device: &'static str,
    },

    /// Kernel request failure
    #[error("{request}: {errno}")]
    Ioctl {
        /// Request name, as in the kernel headers
        request: &'static str,
        /// Kernel error
        #[source]
        errno: Errno,
    },

    /// Framebuffer mapping failure
    #[error("mmap of {len} bytes failed: {errno}")]
    Mmap {
        /// Requested length
        len: usize,
        /// Kernel error
        #[source]
        errno: Errno,
    },

    /// File access failure (device nodes, control channels)
    #[error("{}: {source}", path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The kernel reported a mode this layer cannot drive
    #[error("unsupported framebuffer mode: {0}")]
    UnsupportedMode(String),

    /// Configuration file could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl FbError {
    /// Wrap a failed kernel request.
    pub fn ioctl(request: &'static str, errno: Errno) -> Self {
        FbError::Ioctl { request, errno }
    }

    /// Wrap an I/O error on `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FbError::Io {
            path: path.into(),
            source,
        }
    }

    /// Error class
    pub fn kind(&self) -> ErrorKind {
        match self {
            FbError::InvalidRotation(_)
            | FbError::InvalidBitDepth(_)
            | FbError::InvalidGrayscale(_)
            | FbError::BogusRegion { .. }
            | FbError::RegionOutOfBounds { .. }
            | FbError::Config(_) => ErrorKind::Config,
            FbError::Ioctl { .. } | FbError::Mmap { .. } | FbError::Io { .. } => ErrorKind::Hardware,
            FbError::Unsupported { .. } | FbError::UnsupportedMode(_) => ErrorKind::Unsupported,
            FbError::NoMarker => ErrorKind::State,
        }
    }

    /// The raw error code, for CLI front-ends mapping errors to exit statuses.
    pub fn errno(&self) -> Errno {
        match self {
            FbError::Ioctl { errno, .. } | FbError::Mmap { errno, .. } => *errno,
            FbError::Io { source, .. } => source
                .raw_os_error()
                .map_or(Errno::EIO, Errno::from_raw),
            FbError::InvalidRotation(_)
            | FbError::InvalidBitDepth(_)
            | FbError::InvalidGrayscale(_)
            | FbError::BogusRegion { .. }
            | FbError::RegionOutOfBounds { .. }
            | FbError::Config(_) => Errno::EINVAL,
            FbError::Unsupported { .. } | FbError::UnsupportedMode(_) => Errno::ENOSYS,
            FbError::NoMarker => Errno::ENODATA,
        }
    }
}

/// Failure of a single identity source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Source missing or unreadable
    #[error("{}: {source}", path.display())]
    Unavailable {
        /// Source path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Source was read but its content is unusable
    #[error("{}: {reason}", path.display())]
    Malformed {
        /// Source path
        path: PathBuf,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Source content is valid, but the id it carries is not in any table
    #[error("unknown device id {0}")]
    UnknownId(u32),
}

impl SourceError {
    /// Wrap an I/O error on `path`.
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SourceError::Unavailable {
            path: path.into(),
            source,
        }
    }

    /// Flag the content of `path` as unusable.
    pub fn malformed(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        SourceError::Malformed {
            path: path.into(),
            reason,
        }
    }
}

/// Result alias for session operations
pub type Result<T, E = FbError> = core::result::Result<T, E>;
