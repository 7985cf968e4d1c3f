mod args;
mod bar;
mod dcmac;
mod gt;
mod link;
mod netlayer;
mod tgen;
#[cfg(test)]
mod testio;
mod utils;

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use args::*;
use bar::{BarWindow, Mmio};
use dcmac::{Dcmac, Direction};
use gt::{GpioMonitor, GtController};
use link::LinkContext;
use netlayer::{NetworkLayer, SocketEntry};
use tgen::TrafficGenerator;
use utils::{render_table, Error};

/// Set by SIGINT; the keep-alive monitor checks it every iteration.
static STOP: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_signal: libc::c_int) {
    STOP.store(true, Ordering::Relaxed);
}

/// Narrow a CLI-supplied value to the 32-bit register width.
fn to_word(value: u64) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| Error::ValueTooWide { value, width: 32 })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let bar = BarWindow::open(&args.dev)
        .with_context(|| format!("opening the BAR of device '{}'", args.dev))?;

    match args.command {
        Command::Init => {
            let ctx = LinkContext::new(&bar, args.mac)?;
            ctx.establish(true)?;
        }
        Command::AlignRx => {
            let ctx = LinkContext::new(&bar, args.mac)?;
            ctx.establish(false)?;
        }
        Command::KeepAlive => {
            unsafe {
                libc::signal(libc::SIGINT, handle_sigint as libc::sighandler_t);
            }
            let ctx = LinkContext::new(&bar, args.mac)?;
            ctx.keep_alive(&STOP)?;
        }
        Command::Status { all } => {
            let mac = Dcmac::new(&bar, args.mac)?;
            mac.print_status(!all)?;
        }
        Command::Config { all } => {
            let mac = Dcmac::new(&bar, args.mac)?;
            mac.print_config(!all)?;
        }
        Command::Stats { port, all, addresses } => {
            let mac = Dcmac::new(&bar, args.mac)?;
            mac.print_stats(Direction::Tx, port, addresses, all)?;
            mac.print_stats(Direction::Rx, port, addresses, all)?;
        }
        Command::ResetTx => {
            let mac = Dcmac::new(&bar, args.mac)?;
            let ok = mac.reset_tx(true)?;
            info!(ok, "tx reset finished");
        }
        Command::ResetRx => {
            let mac = Dcmac::new(&bar, args.mac)?;
            let ok = mac.reset_rx(true)?;
            info!(ok, "rx reset finished");
        }
        Command::Clear => {
            let mac = Dcmac::new(&bar, args.mac)?;
            mac.clear_latched_flags()?;
        }
        Command::Gt { command } => {
            let gt = GtController::new(&bar, args.mac);
            match command {
                GtCommand::Status => {
                    let mut table = vec![vec!["Field".to_string(), "Value".to_string()]];
                    for (name, value) in gt.settings()? {
                        table.push(vec![name.to_string(), value.to_string()]);
                    }
                    print!("{}", render_table(&table));
                }
                GtCommand::Reset => gt.reset()?,
                GtCommand::Loopback { mode } => {
                    gt.set("loopback", to_word(mode)?)?;
                    info!(mode = gt.get("loopback")?, "loopback mode set");
                }
                GtCommand::LineRate { rate } => {
                    gt.set("gt_line_rate", to_word(rate)?)?;
                    info!(rate = gt.get("gt_line_rate")?, "line rate mode set");
                }
                GtCommand::Set { field, value } => {
                    gt.set(&field, to_word(value)?)?;
                    info!(field, value = gt.get(&field)?, "control field set");
                }
            }
        }
        Command::Monitor => {
            let monitor = GpioMonitor::new(&bar, args.mac);
            println!("{:#?}", monitor.word()?);
        }
        Command::Mmio { command } => match command {
            MmioCommand::Read { offset } => {
                println!("{:#010X}: {:#010X}", offset, bar.read(offset)?);
            }
            MmioCommand::Write { offset, value } => {
                bar.write(offset, value)?;
            }
            MmioCommand::Reg { name } => {
                let reg = dcmac_regs::lookup(&name)
                    .ok_or_else(|| Error::UnknownRegister(name.clone()))?;
                let mac = Dcmac::new(&bar, args.mac)?;
                let mut table = vec![vec!["Field".to_string(), "Value".to_string()]];
                for (field, value) in mac.decode(reg)? {
                    table.push(vec![field.to_string(), value.to_string()]);
                }
                println!("{} @ {:#x}", reg.name, reg.offset);
                print!("{}", render_table(&table));
            }
        },
        Command::Net { interface, command } => {
            let nl = NetworkLayer::new(&bar, 2 * args.mac + interface);
            match command {
                NetCommand::SetIp { ip, gateway } => nl.set_ip_address(ip, gateway)?,
                NetCommand::SetMac { mac } => nl.set_mac_address(mac)?,
                NetCommand::Info => {
                    let info = nl.network_info()?;
                    println!("HWaddr {}", info.mac);
                    println!("inet addr {}  gateway {}  mask {}", info.ip, info.gateway, info.mask);
                    println!("frequency {} MHz", nl.frequency()?);
                }
                NetCommand::ArpAdd { mac, ip } => nl.write_arp_entry(mac, ip)?,
                NetCommand::ArpTable { entries, all } => nl.print_arp_table(entries, all)?,
                NetCommand::ArpDiscover => nl.arp_discovery()?,
                NetCommand::ArpClear => nl.invalidate_arp_table()?,
                NetCommand::SocketAdd { peer_ip, peer_port, local_port } => {
                    // merge with what hardware already holds; the table is
                    // durable across processes
                    let capacity = nl.socket_capacity()?;
                    let mut table = vec![
                        SocketEntry { peer_ip: None, peer_port: 0, local_port: 0, valid: false };
                        capacity
                    ];
                    for (slot, entry) in nl.socket_table()? {
                        table[slot] = entry;
                    }
                    let slot = table
                        .iter()
                        .position(|e| !e.valid)
                        .context("socket table is full")?;
                    table[slot] =
                        SocketEntry { peer_ip: Some(peer_ip), peer_port, local_port, valid: true };
                    nl.populate_socket_table(&table, args.verbose > 0)?;
                    info!(slot, "socket added");
                }
                NetCommand::Sockets => nl.print_socket_table()?,
                NetCommand::SocketsClear => nl.invalidate_socket_table()?,
                NetCommand::Probes => nl.print_probes()?,
                NetCommand::ProbesReset => nl.reset_probe_counters()?,
            }
        }
        Command::Tgen { interface, command } => {
            let tgen = TrafficGenerator::new(&bar, 2 * args.mac + interface);
            match command {
                TgenCommand::Start { flits, dest } => {
                    tgen.set_flits(flits)?;
                    tgen.set_dest(dest)?;
                    tgen.start()?;
                }
                TgenCommand::Status => {
                    let mut table = vec![vec!["Field".to_string(), "Value".to_string()]];
                    for (name, value) in tgen.control()? {
                        table.push(vec![name.to_string(), value.to_string()]);
                    }
                    print!("{}", render_table(&table));
                }
            }
        }
    }

    bar.close();
    Ok(())
}
