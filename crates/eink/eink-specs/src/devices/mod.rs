//! Per-family device tables
//!
//! Each module holds the id → [`DeviceQuirks`] table for one vendor, plus whatever decoding
//! that vendor's identity token needs (Kindle's base-32 serial codes, Kobo's PCB LUT).

pub mod cervantes;
pub mod kindle;
pub mod kobo;
pub mod pocketbook;
pub mod remarkable;

use crate::device_quirks::DeviceQuirks;

/// One row of a device table: every id a model ships under, and its quirks.
#[derive(Debug, Clone, Copy)]
pub struct DeviceModel {
    /// Device ids sharing this record
    pub ids: &'static [u16],
    /// Quirks, with `device_id` left at 0
    pub quirks: DeviceQuirks,
}

/// Find `id` in `table`, returning the quirks with `device_id` filled in.
pub fn lookup(table: &[DeviceModel], id: u16) -> Option<DeviceQuirks> {
    table
        .iter()
        .find(|model| model.ids.contains(&id))
        .map(|model| model.quirks.with_id(id))
}
