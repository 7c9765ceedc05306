//! `/dev/fbN` backend
//!
//! One open device node, one shared mapping of its memory. Every request goes through the
//! `nix` wrappers in [`crate::sys`].

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use nix::errno::Errno;

use crate::backend::{FbBackend, UpdatePayload, WaitKind, WaitRequest};
use crate::error::{FbError, Result};
use crate::sys::{einkfb, fb, mxcfb, FbFixScreenInfo, FbVarScreenInfo};

/// Shared mapping of framebuffer memory
#[derive(Debug)]
struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

/// A Linux fbdev device
#[derive(Debug)]
pub struct LinuxFramebuffer {
    file: File,
    path: PathBuf,
    mapping: Option<Mapping>,
}

// SAFETY: the mapping is owned by this value and only reachable through `&self`/`&mut self`.
unsafe impl Send for LinuxFramebuffer {}

impl LinuxFramebuffer {
    /// Open a framebuffer device read/write. Nothing is mapped yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| FbError::io(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mapping: None,
        })
    }

    /// Device node path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unmap(&mut self) {
        if let Some(mapping) = self.mapping.take() {
            // SAFETY: ptr/len come from a successful mmap and are unmapped exactly once.
            let rv = unsafe { libc::munmap(mapping.ptr.as_ptr().cast(), mapping.len) };
            if rv != 0 {
                tracing::warn!("munmap of {} bytes failed: {}", mapping.len, Errno::last());
            }
        }
    }
}

impl Drop for LinuxFramebuffer {
    fn drop(&mut self) {
        self.unmap();
    }
}

fn ioctl_result(request: &'static str, res: nix::Result<libc::c_int>) -> Result<u32> {
    res.map(|rv| u32::try_from(rv).unwrap_or(0))
        .map_err(|errno| FbError::ioctl(request, errno))
}

impl FbBackend for LinuxFramebuffer {
    type Error = FbError;

    fn var_screeninfo(&mut self) -> Result<FbVarScreenInfo> {
        let mut var = FbVarScreenInfo::default();
        // SAFETY: `var` is a repr(C) fb_var_screeninfo the kernel fills in.
        let res = unsafe { fb::fbioget_vscreeninfo(self.file.as_raw_fd(), &mut var) };
        ioctl_result("FBIOGET_VSCREENINFO", res)?;
        Ok(var)
    }

    fn fix_screeninfo(&mut self) -> Result<FbFixScreenInfo> {
        let mut fix = FbFixScreenInfo::default();
        // SAFETY: `fix` is a repr(C) fb_fix_screeninfo the kernel fills in.
        let res = unsafe { fb::fbioget_fscreeninfo(self.file.as_raw_fd(), &mut fix) };
        ioctl_result("FBIOGET_FSCREENINFO", res)?;
        Ok(fix)
    }

    fn put_var_screeninfo(&mut self, var: &mut FbVarScreenInfo) -> Result<()> {
        // SAFETY: `var` is a valid repr(C) fb_var_screeninfo, read and written back by the kernel.
        let res = unsafe { fb::fbioput_vscreeninfo(self.file.as_raw_fd(), var) };
        ioctl_result("FBIOPUT_VSCREENINFO", res).map(drop)
    }

    fn send_update(&mut self, update: &UpdatePayload) -> Result<()> {
        let fd = self.file.as_raw_fd();
        // SAFETY: every payload is a repr(C) struct matching the request code's size, and
        // outlives the call. The kernel only reads from it.
        let res = unsafe {
            match update {
                UpdatePayload::Kindle(u) => mxcfb::mxcfb_send_update_kindle(fd, u),
                UpdatePayload::Zelda(u) => mxcfb::mxcfb_send_update_zelda(fd, u),
                UpdatePayload::Rex(u) => mxcfb::mxcfb_send_update_rex(fd, u),
                UpdatePayload::Mtk(u) => mxcfb::mxcfb_send_update_mtk(fd, u),
                UpdatePayload::V1Ntx(u) => mxcfb::mxcfb_send_update_v1_ntx(fd, u),
                UpdatePayload::V1(u) => mxcfb::mxcfb_send_update_v1(fd, u),
                UpdatePayload::V2(u) => mxcfb::mxcfb_send_update_v2(fd, u),
                UpdatePayload::EinkFbFull(fx) => einkfb::fbio_eink_update_display(fd, *fx),
                UpdatePayload::EinkFbArea(area) => {
                    einkfb::fbio_eink_update_display_area(fd, area)
                }
            }
        };
        ioctl_result(update.request_name(), res).map(drop)
    }

    fn wait(&mut self, request: WaitRequest) -> Result<u32> {
        let fd = self.file.as_raw_fd();
        let marker = request.marker;
        let mut marker_data = mxcfb::MxcfbUpdateMarkerData {
            update_marker: marker,
            collision_test: 0,
        };
        // SAFETY: the argument matches the request's expected layout and lives on our stack
        // for the duration of the call.
        let res = unsafe {
            match request.kind {
                WaitKind::Submission => mxcfb::mxcfb_wait_for_update_submission(fd, &marker),
                WaitKind::CompleteMarkerData => {
                    mxcfb::mxcfb_wait_for_update_complete(fd, &mut marker_data)
                }
                WaitKind::CompleteU32 => mxcfb::mxcfb_wait_for_update_complete_u32(fd, &marker),
                WaitKind::CompletePocketBook => {
                    mxcfb::mxcfb_wait_for_update_complete_pb(fd, &marker_data)
                }
            }
        };
        ioctl_result(request.kind.request_name(), res)
    }

    fn legacy_orientation(&mut self) -> Result<libc::c_int> {
        let mut orientation: libc::c_int = 0;
        // SAFETY: the kernel writes a single int.
        let res = unsafe {
            einkfb::fbio_eink_get_display_orientation(self.file.as_raw_fd(), &mut orientation)
        };
        ioctl_result("FBIO_EINK_GET_DISPLAY_ORIENTATION", res)?;
        Ok(orientation)
    }

    fn set_legacy_orientation(&mut self, orientation: libc::c_int) -> Result<()> {
        // SAFETY: the argument is passed by value.
        let res = unsafe {
            einkfb::fbio_eink_set_display_orientation(self.file.as_raw_fd(), orientation)
        };
        ioctl_result("FBIO_EINK_SET_DISPLAY_ORIENTATION", res).map(drop)
    }

    fn write_control(&mut self, path: &Path, command: &str) -> Result<()> {
        std::fs::write(path, command).map_err(|e| FbError::io(path, e))
    }

    fn map(&mut self, len: usize) -> Result<()> {
        self.unmap();
        if len == 0 {
            return Ok(());
        }
        // SAFETY: fresh shared mapping of the device; the kernel validates len against smem_len.
        let ptr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                self.file.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(FbError::Mmap {
                len,
                errno: Errno::last(),
            });
        }
        let ptr = NonNull::new(ptr.cast::<u8>()).ok_or(FbError::Mmap {
            len,
            errno: Errno::EFAULT,
        })?;
        self.mapping = Some(Mapping { ptr, len });
        Ok(())
    }

    fn buffer(&self) -> &[u8] {
        match &self.mapping {
            // SAFETY: the mapping is live and `len` bytes long until unmap, which needs `&mut self`.
            Some(m) => unsafe { core::slice::from_raw_parts(m.ptr.as_ptr(), m.len) },
            None => &[],
        }
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        match &mut self.mapping {
            // SAFETY: as above, and `&mut self` makes this the only live view.
            Some(m) => unsafe { core::slice::from_raw_parts_mut(m.ptr.as_ptr(), m.len) },
            None => &mut [],
        }
    }
}
