//! Simulated kernel failures

use eink_fb::FbError;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};

/// Backend operations, as failure injection points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimOp {
    /// `FBIOGET_VSCREENINFO`
    GetVar,
    /// `FBIOGET_FSCREENINFO`
    GetFix,
    /// `FBIOPUT_VSCREENINFO`
    PutVar,
    /// Refresh requests
    SendUpdate,
    /// Submission and completion waits
    Wait,
    /// einkfb orientation get/set
    Orientation,
    /// Control channel writes
    Control,
    /// Memory mapping
    Map,
}

impl SimOp {
    /// Name of the matching kernel request
    pub const fn request_name(self) -> &'static str {
        match self {
            SimOp::GetVar => "FBIOGET_VSCREENINFO",
            SimOp::GetFix => "FBIOGET_FSCREENINFO",
            SimOp::PutVar => "FBIOPUT_VSCREENINFO",
            SimOp::SendUpdate => "MXCFB_SEND_UPDATE",
            SimOp::Wait => "MXCFB_WAIT_FOR_UPDATE_COMPLETE",
            SimOp::Orientation => "FBIO_EINK_SET_DISPLAY_ORIENTATION",
            SimOp::Control => "write",
            SimOp::Map => "mmap",
        }
    }
}

/// Simulated kernel errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SimError {
    /// Failure queued through `SimulatedFb::fail_next` / `fail_always`
    #[error("{}: {errno} (injected)", op.request_name())]
    Injected {
        /// Failed operation
        op: SimOp,
        /// Reported error
        errno: Errno,
    },

    /// Request the simulated driver refuses, as the real one would
    #[error("{}: {errno} ({reason})", op.request_name())]
    Rejected {
        /// Failed operation
        op: SimOp,
        /// Reported error
        errno: Errno,
        /// Why
        reason: &'static str,
    },
}

impl SimError {
    pub(crate) const fn rejected(op: SimOp, reason: &'static str) -> Self {
        SimError::Rejected {
            op,
            errno: Errno::EINVAL,
            reason,
        }
    }

    /// Failed operation
    pub const fn op(&self) -> SimOp {
        match self {
            SimError::Injected { op, .. } | SimError::Rejected { op, .. } => *op,
        }
    }

    /// Reported error code
    pub const fn errno(&self) -> Errno {
        match self {
            SimError::Injected { errno, .. } | SimError::Rejected { errno, .. } => *errno,
        }
    }
}

impl From<SimError> for FbError {
    fn from(err: SimError) -> Self {
        if let SimError::Rejected { reason, .. } = &err {
            tracing::debug!(target: "eink_emulator", "simulated driver rejected request: {reason}");
        }
        match err.op() {
            SimOp::Map => FbError::Mmap {
                len: 0,
                errno: err.errno(),
            },
            SimOp::Control => FbError::io(
                "control channel",
                std::io::Error::from_raw_os_error(err.errno() as i32),
            ),
            op => FbError::ioctl(op.request_name(), err.errno()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eink_fb::ErrorKind;

    #[test]
    fn test_into_fb_error() {
        let err: FbError = SimError::rejected(SimOp::SendUpdate, "region off screen").into();
        assert_eq!(err.errno(), Errno::EINVAL);
        assert_eq!(err.kind(), ErrorKind::Hardware);
        assert!(err.to_string().starts_with("MXCFB_SEND_UPDATE"));

        let err: FbError = SimError::Injected {
            op: SimOp::Control,
            errno: Errno::EACCES,
        }
        .into();
        assert_eq!(err.errno(), Errno::EACCES);
    }
}
