//! Diagnostics channels
//!
//! Two gated channels on top of `tracing`:
//! - `detail!`: debug-level chatter (identification steps, request dumps), only when verbose
//! - `notice!`: info-level notices (device summary, reinit reports), unless quiet
//!
//! Hard warnings go straight through `tracing::warn!` and are never gated.

use serde::{Deserialize, Serialize};

/// Log target for identification
pub(crate) const IDENTITY: &str = "eink_fb::identity";
/// Log target for refreshes and waits
pub(crate) const REFRESH: &str = "eink_fb::refresh";
/// Log target for reconfiguration and reinit
pub(crate) const RECONFIG: &str = "eink_fb::reconfig";

/// Channel gates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Enable the detail channel
    pub verbose: bool,
    /// Silence the notice channel
    pub quiet: bool,
}

impl Diagnostics {
    /// Everything on
    pub const VERBOSE: Self = Self {
        verbose: true,
        quiet: false,
    };

    /// Warnings only
    pub const QUIET: Self = Self {
        verbose: false,
        quiet: true,
    };
}

macro_rules! detail {
    ($diag:expr, target: $target:expr, $($arg:tt)+) => {
        if $diag.verbose {
            ::tracing::debug!(target: $target, $($arg)+);
        }
    };
}

macro_rules! notice {
    ($diag:expr, target: $target:expr, $($arg:tt)+) => {
        if !$diag.quiet {
            ::tracing::info!(target: $target, $($arg)+);
        }
    };
}

pub(crate) use detail;
pub(crate) use notice;
