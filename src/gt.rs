//! GT (SerDes) control and monitoring behind a pair of AXI GPIO blocks.
//!
//! The control word packs reset, line-rate, loopback and Tx cursor tuning
//! into one 32-bit GPIO word; every setter is a read-modify-write through
//! the shared bit-field codec so adjusting one knob can never clobber the
//! others. A second GPIO exposes the read-only reset-done/power-good
//! monitor word, and a third drives the datapath-only reset.

use std::thread;
use std::time::Duration;

use dcmac_regs as regs;
use packed_struct::prelude::*;
use tracing::info;

use crate::bar::Mmio;
use crate::utils::{ip_offset, Error, Result};

pub const GT_CTRL_BASE: u64 = 0x204_0000;
pub const GT_MONITOR_BASE: u64 = 0x204_0200;
pub const GT_DATAPATH_BASE: u64 = 0x204_0400;

/// Hold time of the standalone GT reset pulse.
pub const GT_RESET_HOLD: Duration = Duration::from_millis(100);

/// AXI GPIO: data words at a stride of 8 bytes per channel.
pub struct AxiGpio<'a, M> {
    io: &'a M,
    base: u64,
}

impl<'a, M: Mmio> AxiGpio<'a, M> {
    pub fn new(io: &'a M, base: u64) -> Self {
        Self { io, base }
    }

    pub fn read(&self, gpio: u32) -> Result<u32> {
        self.io.read(self.base + 8 * u64::from(gpio))
    }

    pub fn write(&self, gpio: u32, value: u32) -> Result<()> {
        self.io.write(self.base + 8 * u64::from(gpio), value.into())
    }
}

/// Controller for the GT control word (GPIO channel 0).
pub struct GtController<'a, M> {
    gpio: AxiGpio<'a, M>,
}

impl<'a, M: Mmio> GtController<'a, M> {
    pub fn new(io: &'a M, instance: u32) -> Self {
        Self { gpio: AxiGpio::new(io, ip_offset(GT_CTRL_BASE, instance)) }
    }

    fn field(name: &str) -> Result<&'static regs::FieldSpec> {
        regs::gt::field(name)
            .ok_or_else(|| Error::UnknownField { reg: "gt_control", field: name.to_owned() })
    }

    pub fn get(&self, name: &str) -> Result<u32> {
        Ok(regs::extract(self.gpio.read(0)?, Self::field(name)?))
    }

    /// Update one control field, leaving the rest of the word untouched.
    /// The value is masked to the field width.
    pub fn set(&self, name: &str, value: u32) -> Result<()> {
        let field = Self::field(name)?;
        let word = self.gpio.read(0)?;
        self.gpio.write(0, regs::insert(word, field, value))
    }

    /// Pulse `gt_reset` for `hold`.
    pub fn reset_pulse(&self, hold: Duration) -> Result<()> {
        self.set("gt_reset", 1)?;
        thread::sleep(hold);
        self.set("gt_reset", 0)
    }

    /// Full GT reset with the standard hold time.
    pub fn reset(&self) -> Result<()> {
        info!("resetting GT");
        self.reset_pulse(GT_RESET_HOLD)
    }

    /// Decoded view of the whole control word.
    pub fn settings(&self) -> Result<Vec<(&'static str, u32)>> {
        let word = self.gpio.read(0)?;
        Ok(regs::gt::CONTROL_FIELDS
            .iter()
            .map(|f| (f.name, regs::extract(word, f)))
            .collect())
    }
}

/// Reset-done monitor word (read-only GPIO). Each reset-done field is one
/// bit per lane; all-ones (0xF) means the whole quad is out of reset.
#[derive(PackedStruct, Debug)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "4")]
pub struct MonitorWord {
    #[packed_field(bits = "0..=3")]
    pub gt0_tx_reset_done: Integer<u8, packed_bits::Bits<4>>,
    #[packed_field(bits = "4..=7")]
    pub gt1_tx_reset_done: Integer<u8, packed_bits::Bits<4>>,
    #[packed_field(bits = "8..=11")]
    pub gt0_rx_reset_done: Integer<u8, packed_bits::Bits<4>>,
    #[packed_field(bits = "12..=15")]
    pub gt1_rx_reset_done: Integer<u8, packed_bits::Bits<4>>,
    #[packed_field(bits = "16")]
    pub gt_power_good: bool,
    #[packed_field(bits = "18")]
    pub dual_dcmac: bool,
}

impl MonitorWord {
    /// All lanes of interface `intf` out of reset in both directions.
    pub fn reset_done(&self, intf: u32) -> bool {
        let (tx, rx) = match intf {
            0 => (*self.gt0_tx_reset_done, *self.gt0_rx_reset_done),
            _ => (*self.gt1_tx_reset_done, *self.gt1_rx_reset_done),
        };
        tx == 0xF && rx == 0xF
    }
}

/// Reader for the GT monitor GPIO.
pub struct GpioMonitor<'a, M> {
    gpio: AxiGpio<'a, M>,
}

impl<'a, M: Mmio> GpioMonitor<'a, M> {
    pub fn new(io: &'a M, instance: u32) -> Self {
        Self { gpio: AxiGpio::new(io, ip_offset(GT_MONITOR_BASE, instance)) }
    }

    pub fn word(&self) -> Result<MonitorWord> {
        let raw = self.gpio.read(0)?;
        MonitorWord::unpack(&raw.to_be_bytes()).map_err(|_| Error::Decode { what: "gt monitor word" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testio::FakeBar;

    #[test]
    fn test_gpio_channel_stride() {
        let io = FakeBar::new();
        let gpio = AxiGpio::new(&io, 0x204_0400);
        gpio.write(0, 0xF).unwrap();
        gpio.write(1, 0xA).unwrap();
        assert_eq!(io.value(0x204_0400), 0xF);
        assert_eq!(io.value(0x204_0408), 0xA);
    }

    #[test]
    fn test_set_field_preserves_others() {
        let io = FakeBar::new();
        let gt = GtController::new(&io, 0);
        io.preset(GT_CTRL_BASE, 0xFFFF_FFFF);
        gt.set("loopback", 0b010).unwrap();
        let word = io.value(GT_CTRL_BASE);
        assert_eq!(gt.get("loopback").unwrap(), 0b010);
        // every bit outside 9..12 is still set
        assert_eq!(word | (0b111 << 9), 0xFFFF_FFFF);
        assert_eq!(gt.get("gt_reset").unwrap(), 1);
        assert_eq!(gt.get("tx_maincursor").unwrap(), 0x3F);
    }

    #[test]
    fn test_set_masks_to_field_width() {
        let io = FakeBar::new();
        let gt = GtController::new(&io, 0);
        gt.set("gt_line_rate", 0x1FF).unwrap();
        assert_eq!(gt.get("gt_line_rate").unwrap(), 0xFF);
    }

    #[test]
    fn test_unknown_control_field() {
        let io = FakeBar::new();
        let gt = GtController::new(&io, 0);
        assert!(matches!(gt.get("warp_speed"), Err(Error::UnknownField { .. })));
    }

    #[test]
    fn test_reset_pulse_sets_then_clears() {
        let io = FakeBar::new();
        let gt = GtController::new(&io, 0);
        io.preset(GT_CTRL_BASE, 0b10); // some unrelated bit set
        gt.reset_pulse(Duration::ZERO).unwrap();
        assert_eq!(io.writes_to(GT_CTRL_BASE), vec![0b11, 0b10]);
    }

    #[test]
    fn test_monitor_word_decode() {
        let io = FakeBar::new();
        let monitor = GpioMonitor::new(&io, 0);
        let raw = 0xF | (0x3 << 4) | (0xF << 8) | (1 << 16) | (1 << 18);
        io.preset(GT_MONITOR_BASE, raw);
        let word = monitor.word().unwrap();
        assert_eq!(*word.gt0_tx_reset_done, 0xF);
        assert_eq!(*word.gt1_tx_reset_done, 0x3);
        assert_eq!(*word.gt0_rx_reset_done, 0xF);
        assert_eq!(*word.gt1_rx_reset_done, 0x0);
        assert!(word.gt_power_good);
        assert!(word.dual_dcmac);
        assert!(word.reset_done(0));
        assert!(!word.reset_done(1));
    }

    #[test]
    fn test_instance_offset() {
        let io = FakeBar::new();
        let gt = GtController::new(&io, 1);
        gt.set("gt_reset", 1).unwrap();
        assert_eq!(io.value(GT_CTRL_BASE + 0x100_0000), 1);
    }
}
