//! Memory-mapped PCIe BAR access.
//!
//! The BAR is a fixed 256 MiB window of 32-bit registers behind the sysfs
//! resource file of the device. Everything above this module talks through
//! the [`Mmio`] trait, so drivers run identically against real hardware
//! and the in-memory fake used by the tests.

use std::cell::Cell;
use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;

use tracing::{debug, warn};

use crate::utils::{Error, Result};

/// Size of the mapped window on the reference hardware.
pub const BAR_SIZE: usize = 256 * 1024 * 1024;

/// Word-granular register I/O at byte offsets. Offsets are rounded down to
/// the previous 32-bit boundary and values are truncated to 32 bits; both
/// corrections emit a warning rather than failing, matching what the
/// hardware itself tolerates.
pub trait Mmio {
    fn read(&self, byte_offset: u64) -> Result<u32>;
    fn write(&self, byte_offset: u64, value: u64) -> Result<()>;
}

fn bar_path(dev: &str) -> String {
    format!("/sys/bus/pci/devices/0000:{dev}:00.0/resource0")
}

/// An open mapping of the device BAR.
///
/// Exactly one window exists per device and it is intentionally neither
/// `Send` nor `Sync` (raw mapping pointer): all register traffic stays on
/// the thread that opened the device. `close` is idempotent and the
/// mapping is also released on drop.
#[derive(Debug)]
pub struct BarWindow {
    base: Cell<*mut libc::c_void>,
    len: usize,
}

impl BarWindow {
    /// Map the BAR of the PCIe function with bus id `dev` (e.g. `e2`).
    pub fn open(dev: &str) -> Result<Self> {
        let path = bar_path(dev);
        debug!(%path, "mapping PCIe BAR");
        Self::open_path(&path, BAR_SIZE)
    }

    /// Map `len` bytes of an arbitrary resource file. The sysfs path used
    /// by [`BarWindow::open`] is just the common case.
    pub fn open_path(path: &str, len: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Error::DeviceUnavailable { path: path.to_string(), source })?;
        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(Error::DeviceUnavailable {
                path: path.to_string(),
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(Self { base: Cell::new(base), len })
    }

    /// Unmap the window. Safe to call more than once; any later access
    /// fails with `NotOpen`.
    pub fn close(&self) {
        let base = self.base.replace(std::ptr::null_mut());
        if !base.is_null() {
            unsafe {
                libc::munmap(base, self.len);
            }
        }
    }

    fn word_ptr(&self, byte_offset: u64) -> Result<*mut u32> {
        let base = self.base.get();
        if base.is_null() {
            return Err(Error::NotOpen);
        }
        if byte_offset & 0x3 != 0 {
            warn!("byte offset {byte_offset:#x} is not 32-bit aligned, rounding down to the previous word");
        }
        let word = (byte_offset >> 2) as usize;
        if word >= self.len / 4 {
            return Err(Error::OutOfWindow { offset: byte_offset, size: self.len as u64 });
        }
        Ok(unsafe { (base as *mut u32).add(word) })
    }
}

impl Mmio for BarWindow {
    fn read(&self, byte_offset: u64) -> Result<u32> {
        let ptr = self.word_ptr(byte_offset)?;
        Ok(unsafe { std::ptr::read_volatile(ptr) })
    }

    fn write(&self, byte_offset: u64, value: u64) -> Result<()> {
        let word = value as u32;
        if u64::from(word) != value {
            warn!("value {value:#x} is wider than 32 bits, truncating");
        }
        let ptr = self.word_ptr(byte_offset)?;
        unsafe { std::ptr::write_volatile(ptr, word) };
        Ok(())
    }
}

impl Drop for BarWindow {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A zero-filled scratch file standing in for the sysfs resource.
    struct ScratchBar {
        path: std::path::PathBuf,
    }

    impl ScratchBar {
        fn create(tag: &str, len: usize) -> Self {
            let path = std::env::temp_dir()
                .join(format!("dcmacctl-bar-{tag}-{}", std::process::id()));
            std::fs::write(&path, vec![0u8; len]).unwrap();
            Self { path }
        }

        fn open(&self, len: usize) -> BarWindow {
            BarWindow::open_path(self.path.to_str().unwrap(), len).unwrap()
        }
    }

    impl Drop for ScratchBar {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    #[test]
    fn test_read_write_roundtrip() {
        let scratch = ScratchBar::create("roundtrip", 4096);
        let bar = scratch.open(4096);
        bar.write(0x10, 0xDEAD_BEEF).unwrap();
        assert_eq!(bar.read(0x10).unwrap(), 0xDEAD_BEEF);
        assert_eq!(bar.read(0x14).unwrap(), 0);
    }

    #[test]
    fn test_misaligned_offsets_round_down() {
        let scratch = ScratchBar::create("align", 4096);
        let bar = scratch.open(4096);
        bar.write(0x20, 0x1234_5678).unwrap();
        for offset in [0x20u64, 0x21, 0x22, 0x23] {
            assert_eq!(bar.read(offset).unwrap(), bar.read(offset & !0x3).unwrap());
        }
        // A misaligned write lands on the rounded-down word too.
        bar.write(0x33, 0xCAFE).unwrap();
        assert_eq!(bar.read(0x30).unwrap(), 0xCAFE);
    }

    #[test]
    fn test_wide_values_truncate() {
        let scratch = ScratchBar::create("truncate", 4096);
        let bar = scratch.open(4096);
        bar.write(0x40, 0x1_2345_6789).unwrap();
        assert_eq!(bar.read(0x40).unwrap(), 0x2345_6789);
    }

    #[test]
    fn test_close_is_idempotent_and_final() {
        let scratch = ScratchBar::create("close", 4096);
        let bar = scratch.open(4096);
        bar.write(0x0, 1).unwrap();
        bar.close();
        bar.close();
        assert!(matches!(bar.read(0x0), Err(Error::NotOpen)));
        assert!(matches!(bar.write(0x0, 1), Err(Error::NotOpen)));
    }

    #[test]
    fn test_out_of_window_is_rejected() {
        let scratch = ScratchBar::create("bounds", 4096);
        let bar = scratch.open(4096);
        assert!(matches!(bar.read(4096), Err(Error::OutOfWindow { .. })));
    }

    #[test]
    fn test_missing_resource_is_unavailable() {
        let err = BarWindow::open_path("/nonexistent/resource0", 4096).unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable { .. }));
    }
}
