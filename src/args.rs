use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;

use crate::netlayer::MacAddr;
use crate::utils::hex_or_int;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub(crate) struct Args {
    /// PCIe bus id of the card, e.g. 'e2'
    #[clap(short, long, env = "DCMAC_DEV", default_value = "e2")]
    pub(crate) dev: String,
    /// MAC core index on the card, either 0 or 1
    #[clap(short = 'm', long, env = "DCMAC_ID", default_value_t = 0)]
    pub(crate) mac: u32,
    /// Print all log messages and debug information
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
    #[clap(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Full link initialization (GT, MAC Tx, MAC Rx) with retries
    Init,
    /// Re-align the receive path only
    AlignRx,
    /// Watch the link and re-run the bring-up whenever it drops
    KeepAlive,
    /// Print the MAC status registers
    Status {
        /// Include registers still at their default value
        #[clap(short, long)]
        all: bool,
    },
    /// Print the MAC configuration registers
    Config {
        #[clap(short, long)]
        all: bool,
    },
    /// Latch and print the MAC statistics counters
    Stats {
        /// Statistics port (0 or 1)
        #[clap(long, default_value_t = 0)]
        port: u64,
        /// Include counters that read zero
        #[clap(short, long)]
        all: bool,
        /// Show the counter addresses
        #[clap(long)]
        addresses: bool,
    },
    /// Force a reset of the transmitting MAC core
    ResetTx,
    /// Force a reset of the receiving MAC core
    ResetRx,
    /// Clear the latched status registers
    Clear,
    /// GT transceiver controls
    Gt {
        #[clap(subcommand)]
        command: GtCommand,
    },
    /// Show the GT reset-done monitor word
    Monitor,
    /// Raw access to the register window
    Mmio {
        #[clap(subcommand)]
        command: MmioCommand,
    },
    /// UDP offload network layer
    Net {
        /// Offload interface of this MAC core (0 or 1)
        #[clap(long, default_value_t = 0)]
        interface: u32,
        #[clap(subcommand)]
        command: NetCommand,
    },
    /// Traffic generator
    Tgen {
        /// Offload interface of this MAC core (0 or 1)
        #[clap(long, default_value_t = 0)]
        interface: u32,
        #[clap(subcommand)]
        command: TgenCommand,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum GtCommand {
    /// Show the decoded control word
    Status,
    /// Pulse the full GT reset
    Reset,
    /// Set the loopback mode, a 3-bit value
    Loopback {
        #[clap(value_parser = hex_or_int)]
        mode: u64,
    },
    /// Set the line-rate mode, an 8-bit value
    LineRate {
        #[clap(value_parser = hex_or_int)]
        rate: u64,
    },
    /// Set one named control field
    Set {
        field: String,
        #[clap(value_parser = hex_or_int)]
        value: u64,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum MmioCommand {
    /// Read one 32-bit word at a byte offset
    Read {
        #[clap(value_parser = hex_or_int)]
        offset: u64,
    },
    /// Write one 32-bit word at a byte offset
    Write {
        #[clap(value_parser = hex_or_int)]
        offset: u64,
        #[clap(value_parser = hex_or_int)]
        value: u64,
    },
    /// Read a named MAC register, decoded into fields where it has any
    Reg { name: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum NetCommand {
    /// Set the interface IP; the gateway defaults to host .1 of its /24
    SetIp { ip: Ipv4Addr, gateway: Option<Ipv4Addr> },
    /// Set the interface MAC address (xx:xx:xx:xx:xx:xx)
    SetMac { mac: MacAddr },
    /// Show the interface addressing as the hardware sees it
    Info,
    /// Add one ARP table entry
    ArpAdd { mac: MacAddr, ip: Ipv4Addr },
    /// Show the ARP table
    ArpTable {
        /// Entries to scan (up to 256)
        #[clap(long, default_value_t = 256)]
        entries: usize,
        /// Include invalid entries
        #[clap(short, long)]
        all: bool,
    },
    /// Trigger hardware ARP discovery
    ArpDiscover,
    /// Invalidate the whole ARP table
    ArpClear,
    /// Add a socket, preserving what the hardware table already holds
    SocketAdd {
        peer_ip: Ipv4Addr,
        peer_port: u16,
        local_port: u16,
    },
    /// Show the socket table
    Sockets,
    /// Invalidate the whole socket table
    SocketsClear,
    /// Show the monitoring probes
    Probes,
    /// Reset the monitoring probe counters
    ProbesReset,
}

#[derive(Subcommand, Debug)]
pub(crate) enum TgenCommand {
    /// Send a burst to a socket table slot
    Start {
        /// Number of 64-byte flits
        #[clap(short, long, default_value_t = 10)]
        flits: u32,
        /// Destination socket table slot
        #[clap(short, long, default_value_t = 0)]
        dest: u32,
    },
    /// Show the kernel control word
    Status,
}
