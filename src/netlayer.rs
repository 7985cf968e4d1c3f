//! UDP offload network layer: ARP and socket table management, interface
//! addressing and the monitoring probes.
//!
//! The ARP table assumes a /24 subnet: 256 slots indexed by the low octet
//! of the peer IP, with validity flags packed four entries per 32-bit
//! word. Stored addresses are byte-reversed relative to host order.
//! Both tables live in hardware and survive the process, so reads always
//! go back to the registers instead of trusting software state.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use dcmac_regs::nl;
use tracing::{debug, info};

use crate::bar::Mmio;
use crate::utils::{ip_offset, render_table, reverse_bytes, Error, Result};

/// Base offset of offload interface 0 inside the BAR.
pub const NETLAYER_BASE: u64 = 0x400_0000;

/// Offload datapath clock, for probe throughput math.
const NL_CLOCK_MHZ: f64 = 390.625;

/// A 48-bit hardware address in transmission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub fn to_u64(self) -> u64 {
        self.0.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    pub fn from_u64(value: u64) -> Self {
        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = ((value >> ((5 - i) * 8)) & 0xFF) as u8;
        }
        Self(octets)
    }
}

impl FromStr for MacAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts
                .next()
                .ok_or_else(|| Error::InvalidArgument(format!("bad MAC address '{s}'")))?;
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidArgument(format!("bad MAC address '{s}'")))?;
        }
        if parts.next().is_some() {
            return Err(Error::InvalidArgument(format!("bad MAC address '{s}'")));
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// One valid row of the ARP table.
#[derive(Debug)]
pub struct ArpEntry {
    pub index: u8,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

/// One row of the socket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketEntry {
    pub peer_ip: Option<Ipv4Addr>,
    pub peer_port: u16,
    pub local_port: u16,
    pub valid: bool,
}

/// Interface addressing as read back from the hardware.
#[derive(Debug)]
pub struct NetworkInfo {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub mask: Ipv4Addr,
}

/// One monitoring probe reading.
#[derive(Debug)]
pub struct ProbeReading {
    pub name: &'static str,
    pub packets: u32,
    pub bytes: u32,
    pub cycles: u32,
}

impl ProbeReading {
    /// Observed throughput in Mb/s over the cycles the probe was active.
    pub fn throughput_mbps(&self) -> f64 {
        if self.cycles == 0 {
            return 0.0;
        }
        let seconds = f64::from(self.cycles) / (NL_CLOCK_MHZ * 1e6);
        f64::from(self.bytes) * 8.0 / seconds / 1e6
    }
}

/// Driver for one offload interface.
pub struct NetworkLayer<'a, M> {
    io: &'a M,
    base: u64,
}

impl<'a, M: Mmio> NetworkLayer<'a, M> {
    /// Attach to offload interface `interface` (two per MAC core).
    pub fn new(io: &'a M, interface: u32) -> Self {
        Self { io, base: ip_offset(NETLAYER_BASE, interface) }
    }

    fn rd(&self, offset: u64) -> Result<u32> {
        self.io.read(self.base + offset)
    }

    fn wr(&self, offset: u64, value: u32) -> Result<()> {
        self.io.write(self.base + offset, value.into())
    }

    /// Add one entry to the ARP table, keyed by the low octet of `ip`.
    /// The validity bit is OR-ed into its packed word, so neighbors in
    /// the same word stay valid.
    pub fn write_arp_entry(&self, mac: MacAddr, ip: Ipv4Addr) -> Result<()> {
        let index = u64::from(ip.octets()[3]);
        let stored_mac = reverse_bytes(mac.to_u64(), 6);
        let stored_ip = reverse_bytes(u32::from(ip).into(), 4) as u32;

        self.wr(nl::ARP_IP + index * 4, stored_ip)?;
        self.wr(nl::ARP_MAC + index * 8, (stored_mac & 0xFFFF_FFFF) as u32)?;
        self.wr(nl::ARP_MAC + index * 8 + 4, (stored_mac >> 32) as u32)?;

        let valid_addr = nl::ARP_VALID + (index / 4) * 4;
        let valid = self.rd(valid_addr)?;
        self.wr(valid_addr, valid | 1 << ((index % 4) * 8))?;
        debug!(%mac, %ip, index, "arp entry written");
        Ok(())
    }

    /// Read back the first `max_entries` ARP slots; only valid entries
    /// are returned unless `all` is set.
    pub fn arp_table(&self, max_entries: usize, all: bool) -> Result<Vec<ArpEntry>> {
        if max_entries > nl::ARP_ENTRIES {
            return Err(Error::InvalidArgument(format!(
                "number of entries cannot be bigger than {}",
                nl::ARP_ENTRIES
            )));
        }
        let mut entries = Vec::new();
        let mut valid_word = 0u32;
        for i in 0..max_entries as u64 {
            if i % 4 == 0 {
                valid_word = self.rd(nl::ARP_VALID + (i / 4) * 4)?;
            }
            let valid = (valid_word >> ((i % 4) * 8)) & 0x1 != 0;
            if !valid && !all {
                continue;
            }
            let lsb = self.rd(nl::ARP_MAC + i * 8)?;
            let msb = self.rd(nl::ARP_MAC + i * 8 + 4)?;
            let mac = MacAddr::from_u64(reverse_bytes((u64::from(msb) << 32) | u64::from(lsb), 6));
            let ip_raw = self.rd(nl::ARP_IP + i * 4)?;
            let ip = Ipv4Addr::from(reverse_bytes(ip_raw.into(), 4) as u32);
            entries.push(ArpEntry { index: i as u8, mac, ip });
        }
        Ok(entries)
    }

    /// Clear every validity word of the ARP table.
    pub fn invalidate_arp_table(&self) -> Result<()> {
        for word in 0..(nl::ARP_ENTRIES as u64 / 4) {
            self.wr(nl::ARP_VALID + word * 4, 0)?;
        }
        Ok(())
    }

    /// Kick off hardware ARP discovery (rising-edge trigger).
    pub fn arp_discovery(&self) -> Result<()> {
        info!("starting arp discovery");
        self.wr(nl::ARP_DISCOVERY, 0)?;
        self.wr(nl::ARP_DISCOVERY, 1)?;
        self.wr(nl::ARP_DISCOVERY, 0)
    }

    /// Socket table capacity as reported by the hardware.
    pub fn socket_capacity(&self) -> Result<usize> {
        Ok(self.rd(nl::UDP_NUM_SOCKETS)? as usize)
    }

    /// Write the socket table. Rejected, without touching any register,
    /// when `entries` exceeds the hardware capacity.
    pub fn populate_socket_table(&self, entries: &[SocketEntry], dump: bool) -> Result<()> {
        let capacity = self.socket_capacity()?;
        if entries.len() > capacity {
            return Err(Error::CapacityExceeded { requested: entries.len(), capacity });
        }
        for (i, entry) in entries.iter().enumerate() {
            let slot = i as u64 * nl::SOCKET_STRIDE;
            let peer_ip = entry.peer_ip.map_or(0, u32::from);
            self.wr(nl::UDP_THEIR_IP + slot, peer_ip)?;
            self.wr(nl::UDP_THEIR_PORT + slot, entry.peer_port.into())?;
            self.wr(nl::UDP_MY_PORT + slot, entry.local_port.into())?;
            self.wr(nl::UDP_VALID + slot, entry.valid.into())?;
        }
        if dump {
            for (i, entry) in self.socket_table()? {
                debug!(slot = i, ?entry, "socket table");
            }
        }
        Ok(())
    }

    /// Read back the valid socket table rows.
    pub fn socket_table(&self) -> Result<Vec<(usize, SocketEntry)>> {
        let capacity = self.socket_capacity()?;
        let mut entries = Vec::new();
        for i in 0..capacity {
            let slot = i as u64 * nl::SOCKET_STRIDE;
            if self.rd(nl::UDP_VALID + slot)? == 0 {
                continue;
            }
            let peer_raw = self.rd(nl::UDP_THEIR_IP + slot)?;
            entries.push((
                i,
                SocketEntry {
                    peer_ip: (peer_raw != 0).then(|| Ipv4Addr::from(peer_raw)),
                    peer_port: self.rd(nl::UDP_THEIR_PORT + slot)? as u16,
                    local_port: self.rd(nl::UDP_MY_PORT + slot)? as u16,
                    valid: true,
                },
            ));
        }
        Ok(entries)
    }

    /// Invalidate every socket slot the hardware has.
    pub fn invalidate_socket_table(&self) -> Result<()> {
        for i in 0..self.socket_capacity()? {
            self.wr(nl::UDP_VALID + i as u64 * nl::SOCKET_STRIDE, 0)?;
        }
        Ok(())
    }

    /// Set the interface IP. Without an explicit gateway the convention
    /// is host .1 of the interface's /24.
    pub fn set_ip_address(&self, ip: Ipv4Addr, gateway: Option<Ipv4Addr>) -> Result<()> {
        self.wr(nl::IP_ADDRESS, ip.into())?;
        let gateway = gateway.map_or((u32::from(ip) & 0xFFFF_FF00) + 1, u32::from);
        self.wr(nl::GATEWAY, gateway)?;
        info!(%ip, gateway = %Ipv4Addr::from(gateway), "interface address set");
        Ok(())
    }

    /// Set the interface MAC as a low/high word pair.
    pub fn set_mac_address(&self, mac: MacAddr) -> Result<()> {
        let value = mac.to_u64();
        self.wr(nl::MAC_ADDRESS, (value & 0xFFFF_FFFF) as u32)?;
        self.wr(nl::MAC_ADDRESS + 4, (value >> 32) as u32)?;
        info!(%mac, "interface mac set");
        Ok(())
    }

    pub fn network_info(&self) -> Result<NetworkInfo> {
        let low = self.rd(nl::MAC_ADDRESS)?;
        let high = self.rd(nl::MAC_ADDRESS + 4)?;
        Ok(NetworkInfo {
            mac: MacAddr::from_u64((u64::from(high) << 32) | u64::from(low)),
            ip: Ipv4Addr::from(self.rd(nl::IP_ADDRESS)?),
            gateway: Ipv4Addr::from(self.rd(nl::GATEWAY)?),
            mask: Ipv4Addr::from(self.rd(nl::IP_MASK)?),
        })
    }

    /// Offload clock frequency register.
    pub fn frequency(&self) -> Result<u32> {
        self.rd(nl::FREQUENCY)
    }

    pub fn reset_probe_counters(&self) -> Result<()> {
        self.wr(nl::DEBUG_RESET_COUNTERS, 1)
    }

    fn read_probes(&self, specs: &[nl::ProbeSpec]) -> Result<Vec<ProbeReading>> {
        specs
            .iter()
            .map(|p| {
                Ok(ProbeReading {
                    name: p.name,
                    packets: self.rd(p.offset)?,
                    bytes: self.rd(p.offset + 4)?,
                    cycles: self.rd(p.offset + 8)?,
                })
            })
            .collect()
    }

    /// The rx-path and tx-path monitoring probes.
    pub fn probes(&self) -> Result<(Vec<ProbeReading>, Vec<ProbeReading>)> {
        Ok((self.read_probes(nl::RX_PROBES)?, self.read_probes(nl::TX_PROBES)?))
    }

    pub fn print_probes(&self) -> Result<()> {
        let (rx, tx) = self.probes()?;
        for (path, readings) in [("rx_path", rx), ("tx_path", tx)] {
            let mut table = vec![vec![
                format!("Probe {path}"),
                "Packets".to_string(),
                "Bytes".to_string(),
                "Cycles".to_string(),
                "BW (Mb/s)".to_string(),
            ]];
            for probe in &readings {
                table.push(vec![
                    probe.name.to_string(),
                    probe.packets.to_string(),
                    probe.bytes.to_string(),
                    probe.cycles.to_string(),
                    format!("{:.2}", probe.throughput_mbps()),
                ]);
            }
            println!("Debug {path} probes");
            print!("{}", render_table(&table));
        }
        Ok(())
    }

    pub fn print_arp_table(&self, max_entries: usize, all: bool) -> Result<()> {
        let mut table = vec![vec![
            "Index".to_string(),
            "MAC Address".to_string(),
            "IP Address".to_string(),
        ]];
        for entry in self.arp_table(max_entries, all)? {
            table.push(vec![
                entry.index.to_string(),
                entry.mac.to_string(),
                entry.ip.to_string(),
            ]);
        }
        print!("{}", render_table(&table));
        Ok(())
    }

    pub fn print_socket_table(&self) -> Result<()> {
        let mut table = vec![vec![
            "Slot".to_string(),
            "Peer IP".to_string(),
            "Peer Port".to_string(),
            "Local Port".to_string(),
        ]];
        for (slot, entry) in self.socket_table()? {
            table.push(vec![
                slot.to_string(),
                entry.peer_ip.map_or_else(|| "-".to_string(), |ip| ip.to_string()),
                entry.peer_port.to_string(),
                entry.local_port.to_string(),
            ]);
        }
        println!("Number of sockets: {}", self.socket_capacity()?);
        print!("{}", render_table(&table));
        Ok(())
    }
}
