//! Traffic generator kernel: an HLS control block plus burst sizing.

use dcmac_regs::hls;
use tracing::info;

use crate::bar::Mmio;
use crate::utils::{ip_offset, Error, Result};

/// Base offset of traffic generator instance 0 inside the BAR.
pub const TGEN_BASE: u64 = 0x400_2000;

const FLITS: u64 = 0x10;
const DEST: u64 = 0x18;

/// Driver for one traffic generator kernel.
pub struct TrafficGenerator<'a, M> {
    io: &'a M,
    base: u64,
}

impl<'a, M: Mmio> TrafficGenerator<'a, M> {
    /// Attach to the generator of offload interface `interface`.
    pub fn new(io: &'a M, interface: u32) -> Self {
        Self { io, base: ip_offset(TGEN_BASE, interface) }
    }

    fn rd(&self, offset: u64) -> Result<u32> {
        self.io.read(self.base + offset)
    }

    fn wr(&self, offset: u64, value: u32) -> Result<()> {
        self.io.write(self.base + offset, value.into())
    }

    /// Decoded view of the kernel control word.
    pub fn control(&self) -> Result<Vec<(&'static str, u32)>> {
        let word = self.rd(hls::CONTROL.offset)?;
        Ok(hls::CONTROL
            .fields
            .iter()
            .map(|f| (f.name, dcmac_regs::extract(word, f)))
            .collect())
    }

    /// Kick the kernel once.
    pub fn start(&self) -> Result<()> {
        info!("starting traffic generator");
        self.wr(hls::CONTROL.offset, 1)
    }

    /// Start with auto-restart, for free-running operation.
    pub fn autostart(&self) -> Result<()> {
        self.wr(hls::CONTROL.offset, hls::AUTOSTART)
    }

    /// Number of 64-byte flits per burst; must be at least one.
    pub fn set_flits(&self, flits: u32) -> Result<()> {
        if flits < 1 {
            return Err(Error::InvalidArgument(format!("flits must be bigger than 0, got {flits}")));
        }
        self.wr(FLITS, flits)
    }

    pub fn flits(&self) -> Result<u32> {
        self.rd(FLITS)
    }

    /// Socket table slot the generated traffic is addressed to.
    pub fn set_dest(&self, dest: u32) -> Result<()> {
        self.wr(DEST, dest)
    }

    pub fn dest(&self) -> Result<u32> {
        self.rd(DEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testio::FakeBar;

    #[test]
    fn test_flits_validation() {
        let io = FakeBar::new();
        let tgen = TrafficGenerator::new(&io, 0);
        assert!(matches!(tgen.set_flits(0), Err(Error::InvalidArgument(_))));
        assert!(io.writes().is_empty());
        tgen.set_flits(22).unwrap();
        assert_eq!(tgen.flits().unwrap(), 22);
    }

    #[test]
    fn test_start_sets_ap_start() {
        let io = FakeBar::new();
        let tgen = TrafficGenerator::new(&io, 0);
        tgen.set_dest(3).unwrap();
        tgen.start().unwrap();
        assert_eq!(io.value(TGEN_BASE), 1);
        assert_eq!(tgen.dest().unwrap(), 3);
    }

    #[test]
    fn test_control_decode() {
        let io = FakeBar::new();
        let tgen = TrafficGenerator::new(&io, 0);
        io.preset(TGEN_BASE, 0b100); // ap_idle
        let control = tgen.control().unwrap();
        assert!(control.contains(&("ap_idle", 1)));
        assert!(control.contains(&("ap_start", 0)));
    }

    #[test]
    fn test_interface_offset() {
        let io = FakeBar::new();
        let tgen = TrafficGenerator::new(&io, 2);
        tgen.set_flits(1).unwrap();
        assert_eq!(io.value(TGEN_BASE + 2 * 0x100_0000 + FLITS), 1);
    }
}
