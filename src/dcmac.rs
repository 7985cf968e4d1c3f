//! MAC core driver: bit-field register access, the vendor Tx/Rx reset
//! sequences and the alignment/fault status the bring-up logic keys on.
//!
//! The reset procedures follow the fixed Ethernet startup procedures from
//! the core's user guide: assert core + per-port SerDes + per-channel
//! flush resets, hold, release in the mandated order, then poll the
//! real-time status until the lane reports clean or the retry budget runs
//! out. A timed-out poll degrades to a `false` success flag; it never
//! aborts the sequence, and the flush release always happens.

use std::thread;
use std::time::Duration;

use dcmac_regs as regs;
use dcmac_regs::RegisterSpec;
use tracing::{debug, warn};

use crate::bar::Mmio;
use crate::utils::{ip_offset, render_table, Error, Result};

/// Base offset of MAC core instance 0 inside the BAR.
pub const DCMAC_BASE: u64 = 0x200_0000;
/// Per-port register stride.
pub const PORT_STRIDE: u64 = 0x1000;
/// SerDes ports per core.
pub const PORTS: u64 = 6;
/// Ports released after an Rx reset.
pub const ACTIVE_PORTS: u64 = 6;
/// Alignment poll budget for both reset procedures.
pub const STATUS_POLLS: u32 = 10;

/// Reset codes mandated for the Rx startup procedure.
const RX_CORE_RESET_CODE: u32 = 7;
const RX_SERDES_RESET_CODE: u32 = 2;
const RX_FLUSH_CODE: u32 = 1;

/// Hold and poll cadence of the reset procedures.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub tx_hold: Duration,
    pub tx_poll: Duration,
    pub rx_hold: Duration,
    pub rx_poll: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tx_hold: Duration::from_millis(100),
            tx_poll: Duration::from_millis(200),
            rx_hold: Duration::from_millis(500),
            rx_poll: Duration::from_millis(250),
        }
    }
}

impl Timing {
    /// No waiting at all, for driving the state machine against a fake.
    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            tx_hold: Duration::ZERO,
            tx_poll: Duration::ZERO,
            rx_hold: Duration::ZERO,
            rx_poll: Duration::ZERO,
        }
    }
}

/// Statistics direction selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Tx,
    Rx,
}

/// One merged row of the status report: a field with its latched and
/// real-time readings next to the hardware default.
#[derive(Debug)]
pub struct StatusRow {
    pub register: String,
    pub field: String,
    pub latched: Option<u32>,
    pub real_time: Option<u32>,
    pub default: Option<u32>,
}

impl StatusRow {
    /// True when both readings sit at the hardware default.
    fn is_default(&self) -> bool {
        let d = self.default;
        (self.latched.is_none() || self.latched == d)
            && (self.real_time.is_none() || self.real_time == d)
    }
}

/// Driver for one MAC core instance.
pub struct Dcmac<'a, M> {
    io: &'a M,
    base: u64,
    pub timing: Timing,
}

impl<'a, M: Mmio> Dcmac<'a, M> {
    /// Attach to MAC core `instance` and route the statistics tick
    /// through the register-triggered mode.
    pub fn new(io: &'a M, instance: u32) -> Result<Self> {
        let mac = Self { io, base: ip_offset(DCMAC_BASE, instance), timing: Timing::default() };
        mac.set_pm_tick_trigger()?;
        Ok(mac)
    }

    fn addr(&self, reg: &RegisterSpec) -> u64 {
        self.base + reg.offset
    }

    fn port_addr(&self, reg: &RegisterSpec, port: u64) -> u64 {
        self.base + reg.offset + PORT_STRIDE * port
    }

    pub fn read_reg(&self, reg: &RegisterSpec) -> Result<u32> {
        self.io.read(self.addr(reg))
    }

    pub fn write_reg(&self, reg: &RegisterSpec, value: u32) -> Result<()> {
        self.io.write(self.addr(reg), value.into())
    }

    /// Decode one field of a register.
    pub fn read_field(&self, reg: &'static RegisterSpec, field: &str) -> Result<u32> {
        let spec = reg
            .field(field)
            .ok_or_else(|| Error::UnknownField { reg: reg.name, field: field.to_owned() })?;
        Ok(regs::extract(self.read_reg(reg)?, spec))
    }

    /// Read-modify-write a set of fields on the port-`port` copy of a
    /// register. Each value is masked to its field width; every field not
    /// named in `updates` keeps its current bits.
    pub fn update_port_fields(
        &self,
        reg: &'static RegisterSpec,
        port: u64,
        updates: &[(&str, u32)],
    ) -> Result<()> {
        let addr = self.port_addr(reg, port);
        let mut word = self.io.read(addr)?;
        for (name, value) in updates {
            let spec = reg
                .field(name)
                .ok_or_else(|| Error::UnknownField { reg: reg.name, field: (*name).to_owned() })?;
            word = regs::insert(word, spec, *value);
        }
        self.io.write(addr, word.into())
    }

    /// Read-modify-write fields on the base (port 0) copy of a register.
    pub fn update_fields(&self, reg: &'static RegisterSpec, updates: &[(&str, u32)]) -> Result<()> {
        self.update_port_fields(reg, 0, updates)
    }

    /// Decode all declared fields of a register; a fieldless register
    /// decodes to its raw word.
    pub fn decode(&self, reg: &'static RegisterSpec) -> Result<Vec<(&'static str, u32)>> {
        let word = self.read_reg(reg)?;
        if reg.fields.is_empty() {
            return Ok(vec![(reg.name, word)]);
        }
        Ok(reg.fields.iter().map(|f| (f.name, regs::extract(word, f))).collect())
    }

    fn read_long_at(&self, addr: u64) -> Result<u64> {
        let low = self.io.read(addr)?;
        let high = self.io.read(addr + 4)?;
        Ok((u64::from(high) << 32) + u64::from(low))
    }

    /// Read an adjacent LSB/MSB counter pair relative to this core.
    pub fn read_long(&self, byte_offset: u64) -> Result<u64> {
        self.read_long_at(self.base + byte_offset)
    }

    pub fn revision(&self) -> Result<u32> {
        self.read_reg(&regs::CONFIGURATION_REVISION)
    }

    /// Statistics ticks fire from register writes rather than the pm pins.
    pub fn set_pm_tick_trigger(&self) -> Result<()> {
        self.update_fields(
            &regs::GLOBAL_MODE,
            &[("ctl_tx_all_ch_tick_reg_mode_sel", 1), ("ctl_rx_all_ch_tick_reg_mode_sel", 1)],
        )
    }

    /// Tx lane is healthy when the real-time local fault bit is clear.
    pub fn tx_aligned(&self) -> Result<bool> {
        Ok(self.read_field(&regs::C0_STAT_CHAN_TX_MAC_RT_STATUS_REG, "c0_stat_tx_local_fault")? == 0)
    }

    /// Rx lane is healthy when the PHY reports both status and alignment.
    pub fn rx_aligned(&self) -> Result<bool> {
        let word = self.read_reg(&regs::C0_STAT_PORT_RX_PHY_RT_STATUS_REG)?;
        let reg = &regs::C0_STAT_PORT_RX_PHY_RT_STATUS_REG;
        let status = regs::extract(word, reg.field("c0_stat_rx_status").expect("known field"));
        let aligned = regs::extract(word, reg.field("c0_stat_rx_aligned").expect("known field"));
        Ok(status == 1 && aligned == 1)
    }

    pub fn link_up(&self) -> Result<bool> {
        Ok(self.rx_aligned()? && self.tx_aligned()?)
    }

    /// Clear every latched status register by writing all-ones.
    pub fn clear_latched_flags(&self) -> Result<()> {
        for reg in regs::DCMAC_REGS.iter().filter(|r| r.is_status()) {
            self.write_reg(reg, u32::MAX)?;
        }
        Ok(())
    }

    /// Force a reset of the transmitting core.
    ///
    /// Asserts the core control, the six per-port SerDes resets and the
    /// six per-channel flushes at once, holds, then releases everything
    /// except the flushes and polls the Tx local fault. The flushes are
    /// released regardless of whether the fault cleared; the returned
    /// flag reports whether it did.
    pub fn reset_tx(&self, clear_history: bool) -> Result<bool> {
        let core = self.addr(&regs::GLOBAL_CONTROL_REG_TX);
        let serdes: Vec<u64> =
            (0..PORTS).map(|p| self.port_addr(&regs::C0_PORT_CONTROL_REG_TX, p)).collect();
        let flush: Vec<u64> =
            (0..PORTS).map(|p| self.port_addr(&regs::C0_CHANNEL_CONTROL_REG_TX, p)).collect();

        for &reg in std::iter::once(&core).chain(&serdes).chain(&flush) {
            self.io.write(reg, u32::MAX.into())?;
        }
        thread::sleep(self.timing.tx_hold);

        // release the port resets first, the core reset last
        for &reg in serdes.iter().chain(std::iter::once(&core)) {
            self.io.write(reg, 0)?;
        }

        let mut ok = false;
        for _ in 0..STATUS_POLLS {
            if self.tx_aligned()? {
                ok = true;
                break;
            }
            thread::sleep(self.timing.tx_poll);
        }
        if ok {
            debug!("tx status ok");
        } else {
            warn!("tx local fault did not clear");
        }

        for &reg in &flush {
            self.io.write(reg, 0)?;
        }

        if clear_history {
            self.clear_latched_flags()?;
        }
        Ok(ok)
    }

    /// Force a reset of the receiving core.
    ///
    /// Each register group takes its own reset code; release order is
    /// core first, then the active-port flushes, then the active-port
    /// SerDes resets. The returned flag reports whether the lane reached
    /// alignment within the poll budget.
    pub fn reset_rx(&self, clear_history: bool) -> Result<bool> {
        let core = self.addr(&regs::GLOBAL_CONTROL_REG_RX);
        let serdes: Vec<u64> =
            (0..PORTS).map(|p| self.port_addr(&regs::C0_PORT_CONTROL_REG_RX, p)).collect();
        let flush: Vec<u64> =
            (0..PORTS).map(|p| self.port_addr(&regs::C0_CHANNEL_CONTROL_REG_RX, p)).collect();

        self.io.write(core, RX_CORE_RESET_CODE.into())?;
        for &reg in &serdes {
            self.io.write(reg, RX_SERDES_RESET_CODE.into())?;
        }
        for &reg in &flush {
            self.io.write(reg, RX_FLUSH_CODE.into())?;
        }
        thread::sleep(self.timing.rx_hold);

        for &reg in std::iter::once(&core)
            .chain(flush.iter().take(ACTIVE_PORTS as usize))
            .chain(serdes.iter().take(ACTIVE_PORTS as usize))
        {
            self.io.write(reg, 0)?;
        }

        let mut ok = false;
        for _ in 0..STATUS_POLLS {
            if self.rx_aligned()? {
                ok = true;
                break;
            }
            thread::sleep(self.timing.rx_poll);
        }
        if !ok {
            warn!("channel 0 rx failed to achieve alignment");
        }

        if clear_history {
            self.clear_latched_flags()?;
        }
        Ok(ok)
    }

    /// Merge the latched and real-time status registers into one report.
    pub fn status(&self) -> Result<Vec<StatusRow>> {
        let mut rows: Vec<StatusRow> = Vec::new();
        for reg in regs::DCMAC_REGS.iter().filter(|r| r.is_status()) {
            let word = self.read_reg(reg)?;
            let group = reg.status_group();
            let real_time = reg.is_real_time();
            if reg.fields.is_empty() {
                let row = find_or_insert(&mut rows, &group, "-", None);
                set_reading(row, real_time, word);
                continue;
            }
            for f in reg.fields {
                let value = regs::extract(word, f);
                let row = find_or_insert(&mut rows, &group, f.name, Some(f.default));
                set_reading(row, real_time, value);
            }
        }
        Ok(rows)
    }

    pub fn print_status(&self, only_modified: bool) -> Result<()> {
        let rows = self.status()?;
        let mut table = vec![vec![
            "Register".to_string(),
            "Field".to_string(),
            "Latched".to_string(),
            "Real-Time".to_string(),
            "Default".to_string(),
        ]];
        let mut last_register = String::new();
        for row in &rows {
            if only_modified && row.is_default() {
                continue;
            }
            let register = if row.register == last_register {
                String::new()
            } else {
                row.register.clone()
            };
            last_register = row.register.clone();
            table.push(vec![
                register,
                row.field.clone(),
                fmt_reading(row.latched),
                fmt_reading(row.real_time),
                fmt_reading(row.default),
            ]);
        }
        if only_modified && table.len() == 1 {
            println!("All status registers have default values");
            return Ok(());
        }
        if only_modified {
            println!("Status registers with non-default values");
        } else {
            println!("Status registers");
        }
        print!("{}", render_table(&table));
        Ok(())
    }

    /// Decoded view of the configuration registers next to their defaults.
    pub fn config(&self) -> Result<Vec<StatusRow>> {
        let config_regs: [&'static RegisterSpec; 3] =
            [&regs::GLOBAL_MODE, &regs::C0_TX_MODE_REG, &regs::C0_RX_MODE_REG];
        let mut rows = Vec::new();
        for reg in config_regs {
            let word = self.read_reg(reg)?;
            for f in reg.fields {
                rows.push(StatusRow {
                    register: reg.name.to_string(),
                    field: f.name.to_string(),
                    latched: None,
                    real_time: Some(regs::extract(word, f)),
                    default: Some(f.default),
                });
            }
        }
        Ok(rows)
    }

    pub fn print_config(&self, only_modified: bool) -> Result<()> {
        let rows = self.config()?;
        let mut table = vec![vec![
            "Register".to_string(),
            "Field".to_string(),
            "Value".to_string(),
            "Default".to_string(),
        ]];
        let mut last_register = String::new();
        for row in &rows {
            if only_modified && row.is_default() {
                continue;
            }
            let register = if row.register == last_register {
                String::new()
            } else {
                row.register.clone()
            };
            last_register = row.register.clone();
            table.push(vec![
                register,
                row.field.clone(),
                fmt_reading(row.real_time),
                fmt_reading(row.default),
            ]);
        }
        if only_modified {
            println!("Configuration registers with non-default values");
        } else {
            println!("Configuration registers");
        }
        print!("{}", render_table(&table));
        Ok(())
    }

    /// Latch and read the MAC statistics counters for `port`.
    pub fn stats(&self, dir: Direction, port: u64) -> Result<Vec<(&'static str, u64, u64)>> {
        if port > 1 {
            return Err(Error::InvalidArgument(format!("port must be 0 or 1, got {port}")));
        }
        let (mode, mode_field, tick, ready, counters, stats_off) = match dir {
            Direction::Tx => (
                &regs::C0_TX_MODE_REG,
                "c0_ctl_tx_tick_reg_mode_sel",
                &regs::C0_PORT_TICK_REG_TX,
                &regs::C0_STAT_PORT_TX_STATISTICS_READY,
                regs::stats::TX_STATS,
                0x200,
            ),
            Direction::Rx => (
                &regs::C0_RX_MODE_REG,
                "c0_ctl_rx_tick_reg_mode_sel",
                &regs::C0_PORT_TICK_REG_RX,
                &regs::C0_STAT_PORT_RX_STATISTICS_READY,
                regs::stats::RX_STATS,
                0x400,
            ),
        };
        self.update_port_fields(mode, port, &[(mode_field, 1)])?;

        // latch the counters with a register-triggered pm tick
        let tick_addr = self.port_addr(tick, port);
        self.io.write(tick_addr, 0)?;
        self.io.write(tick_addr, 1)?;
        let ready_addr = self.port_addr(ready, port);
        for _ in 0..10 {
            if self.io.read(ready_addr)? != 0 {
                break;
            }
        }

        let stats_base = self.base + PORT_STRIDE * (port + 1) + stats_off;
        let mut rows = Vec::with_capacity(counters.len());
        for spec in counters {
            let addr = stats_base + spec.offset;
            let value =
                if spec.wide { self.read_long_at(addr)? } else { self.io.read(addr)?.into() };
            rows.push((spec.name, value, addr));
        }
        Ok(rows)
    }

    pub fn print_stats(&self, dir: Direction, port: u64, debug: bool, verbose: bool) -> Result<()> {
        let label = match dir {
            Direction::Tx => "TX",
            Direction::Rx => "RX",
        };
        let mut header = vec![format!("{label} Stats port={port}"), "Value".to_string()];
        if debug {
            header.push("Offset Address".to_string());
        }
        let mut table = vec![header];
        for (name, value, addr) in self.stats(dir, port)? {
            if value == 0 && !verbose {
                continue;
            }
            let mut row = vec![name.to_string(), value.to_string()];
            if debug {
                row.push(format!("{addr:#X}"));
            }
            table.push(row);
        }
        print!("{}", render_table(&table));
        Ok(())
    }
}

fn find_or_insert<'r>(
    rows: &'r mut Vec<StatusRow>,
    register: &str,
    field: &str,
    default: Option<u32>,
) -> &'r mut StatusRow {
    if let Some(i) = rows.iter().position(|r| r.register == register && r.field == field) {
        return &mut rows[i];
    }
    rows.push(StatusRow {
        register: register.to_string(),
        field: field.to_string(),
        latched: None,
        real_time: None,
        default,
    });
    rows.last_mut().expect("just pushed")
}

fn set_reading(row: &mut StatusRow, real_time: bool, value: u32) {
    if real_time {
        row.real_time = Some(value);
    } else {
        row.latched = Some(value);
    }
}

fn fmt_reading(value: Option<u32>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testio::FakeBar;

    fn mac(io: &FakeBar) -> Dcmac<'_, FakeBar> {
        let mut mac = Dcmac::new(io, 0).unwrap();
        mac.timing = Timing::instant();
        io.clear_writes();
        mac
    }

    const TX_RT_STATUS: u64 = DCMAC_BASE + 0x1104;
    const RX_RT_PHY_STATUS: u64 = DCMAC_BASE + 0x1C04;
    const TX_CORE_CTRL: u64 = DCMAC_BASE + 0xF8;
    const RX_CORE_CTRL: u64 = DCMAC_BASE + 0xF0;

    fn tx_flush_addr(port: u64) -> u64 {
        DCMAC_BASE + 0x1038 + PORT_STRIDE * port
    }

    fn tx_serdes_addr(port: u64) -> u64 {
        DCMAC_BASE + 0x10F8 + PORT_STRIDE * port
    }

    #[test]
    fn test_pm_tick_trigger_set_on_attach() {
        let io = FakeBar::new();
        let _mac = Dcmac::new(&io, 0).unwrap();
        // both tick mode bits set, nothing else disturbed
        assert_eq!(io.value(DCMAC_BASE + 0x4), (1 << 1) | (1 << 5));
    }

    #[test]
    fn test_instance_addressing() {
        let io = FakeBar::new();
        let mac1 = Dcmac::new(&io, 1).unwrap();
        mac1.write_reg(&dcmac_regs::GLOBAL_CONTROL_REG_TX, 0xFF).unwrap();
        assert_eq!(io.value(0x300_0000 + 0xF8), 0xFF);
    }

    #[test]
    fn test_field_update_preserves_neighbors() {
        let io = FakeBar::new();
        let mac = mac(&io);
        let addr = DCMAC_BASE + 0x1040;
        io.preset(addr, 0xFFFF_FFFF);
        mac.update_fields(&dcmac_regs::C0_TX_MODE_REG, &[("c0_ctl_tx_fec_mode", 4)]).unwrap();
        let word = io.value(addr);
        // bits 16..21 now hold 4, everything else still set
        assert_eq!((word >> 16) & 0x1F, 4);
        assert_eq!(word | (0x1F << 16), 0xFFFF_FFFF);
        assert_eq!(
            mac.read_field(&dcmac_regs::C0_TX_MODE_REG, "c0_ctl_tx_fec_mode").unwrap(),
            4
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let io = FakeBar::new();
        let mac = mac(&io);
        let err = mac.update_fields(&dcmac_regs::C0_TX_MODE_REG, &[("no_such_field", 1)]);
        assert!(matches!(err, Err(Error::UnknownField { .. })));
        // the register was never written
        assert!(io.writes_to(DCMAC_BASE + 0x1040).is_empty());
    }

    #[test]
    fn test_reset_tx_sequence() {
        let io = FakeBar::new();
        let mac = mac(&io);
        assert!(mac.reset_tx(false).unwrap());

        // core + 6 serdes + 6 flush all asserted with all-ones
        let asserted: Vec<(u64, u32)> =
            io.writes().into_iter().take(13).collect();
        assert!(asserted.iter().all(|&(_, v)| v == u32::MAX));
        assert_eq!(asserted[0].0, TX_CORE_CTRL);
        for p in 0..PORTS {
            assert_eq!(io.last_write(tx_serdes_addr(p)), Some(0));
            assert_eq!(io.last_write(tx_flush_addr(p)), Some(0));
        }
        // flush release comes after the core release
        let writes = io.writes();
        let core_release = writes.iter().rposition(|&(a, v)| a == TX_CORE_CTRL && v == 0).unwrap();
        let flush_release =
            writes.iter().rposition(|&(a, v)| a == tx_flush_addr(0) && v == 0).unwrap();
        assert!(flush_release > core_release);
    }

    #[test]
    fn test_reset_tx_succeeds_on_final_poll() {
        let io = FakeBar::new();
        let mac = mac(&io);
        // fault stays asserted for nine polls and clears on the tenth
        let mut script = vec![1u32; 9];
        script.push(0);
        io.script_reads(TX_RT_STATUS, &script);
        assert!(mac.reset_tx(false).unwrap());
    }

    #[test]
    fn test_reset_tx_reports_failure_but_releases_flush() {
        let io = FakeBar::new();
        let mac = mac(&io);
        io.script_reads(TX_RT_STATUS, &[1]);
        assert!(!mac.reset_tx(false).unwrap());
        for p in 0..PORTS {
            assert_eq!(io.last_write(tx_flush_addr(p)), Some(0));
        }
    }

    #[test]
    fn test_reset_tx_is_idempotent() {
        let io = FakeBar::new();
        let mac = mac(&io);
        let first = mac.reset_tx(false).unwrap();
        let aligned_after_first = mac.tx_aligned().unwrap();
        let second = mac.reset_tx(false).unwrap();
        assert_eq!(first, second);
        assert_eq!(mac.tx_aligned().unwrap(), aligned_after_first);
    }

    #[test]
    fn test_reset_rx_codes_and_release_order() {
        let io = FakeBar::new();
        let mac = mac(&io);
        // rx healthy right away: status=1, aligned=1
        io.preset(RX_RT_PHY_STATUS, 0b101);
        assert!(mac.reset_rx(false).unwrap());

        let writes = io.writes();
        assert_eq!(writes[0], (RX_CORE_CTRL, RX_CORE_RESET_CODE));
        let serdes0 = DCMAC_BASE + 0x10F0;
        let flush0 = DCMAC_BASE + 0x1030;
        assert_eq!(io.writes_to(serdes0), vec![RX_SERDES_RESET_CODE, 0]);
        assert_eq!(io.writes_to(flush0), vec![RX_FLUSH_CODE, 0]);
        // release order: core, then flush, then serdes
        let core_release = writes.iter().position(|&(a, v)| a == RX_CORE_CTRL && v == 0).unwrap();
        let flush_release = writes.iter().position(|&(a, v)| a == flush0 && v == 0).unwrap();
        let serdes_release = writes.iter().position(|&(a, v)| a == serdes0 && v == 0).unwrap();
        assert!(core_release < flush_release && flush_release < serdes_release);
    }

    #[test]
    fn test_reset_rx_failure_is_reported_not_raised() {
        let io = FakeBar::new();
        let mac = mac(&io);
        io.script_reads(RX_RT_PHY_STATUS, &[0]);
        assert!(!mac.reset_rx(false).unwrap());
    }

    #[test]
    fn test_clear_latched_flags_only_touches_status_registers() {
        let io = FakeBar::new();
        let mac = mac(&io);
        mac.clear_latched_flags().unwrap();
        let status_count =
            dcmac_regs::DCMAC_REGS.iter().filter(|r| r.is_status()).count();
        assert_eq!(io.writes().len(), status_count);
        assert!(io.writes().iter().all(|&(_, v)| v == u32::MAX));
        // the statistics-ready strobes are not status registers
        assert!(io.writes_to(DCMAC_BASE + 0x1108).is_empty());
        assert!(io.writes_to(DCMAC_BASE + 0x1808).is_empty());
    }

    #[test]
    fn test_link_up_requires_both_directions() {
        let io = FakeBar::new();
        let mac = mac(&io);
        io.preset(RX_RT_PHY_STATUS, 0b101);
        io.preset(TX_RT_STATUS, 0);
        assert!(mac.link_up().unwrap());
        io.preset(TX_RT_STATUS, 1);
        assert!(!mac.link_up().unwrap());
        io.preset(TX_RT_STATUS, 0);
        io.preset(RX_RT_PHY_STATUS, 0b001);
        assert!(!mac.link_up().unwrap());
    }

    #[test]
    fn test_status_merges_latched_and_real_time() {
        let io = FakeBar::new();
        let mac = mac(&io);
        io.preset(DCMAC_BASE + 0x1100, 0b1); // latched local fault
        io.preset(TX_RT_STATUS, 0b0);
        let rows = mac.status().unwrap();
        let row = rows
            .iter()
            .find(|r| {
                r.register == "C0_STAT_CHAN_TX_MAC_STATUS_REG" && r.field == "c0_stat_tx_local_fault"
            })
            .unwrap();
        assert_eq!(row.latched, Some(1));
        assert_eq!(row.real_time, Some(0));
        assert_eq!(row.default, Some(0));
    }

    #[test]
    fn test_stats_rejects_unknown_port() {
        let io = FakeBar::new();
        let mac = mac(&io);
        assert!(matches!(mac.stats(Direction::Tx, 2), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_stats_reads_wide_counters() {
        let io = FakeBar::new();
        let mac = mac(&io);
        let stats_base = DCMAC_BASE + PORT_STRIDE + 0x200;
        io.preset(stats_base, 0x1234);
        io.preset(stats_base + 4, 0x1);
        io.preset(DCMAC_BASE + 0x1808, 1); // ready strobe
        let rows = mac.stats(Direction::Tx, 0).unwrap();
        let total_bytes = rows.iter().find(|(name, ..)| *name == "TOTAL_BYTES").unwrap();
        assert_eq!(total_bytes.1, 0x1_0000_1234);
        // the tick was pulsed 0 -> 1
        assert_eq!(io.writes_to(DCMAC_BASE + 0x10FC), vec![0, 1]);
    }
}
