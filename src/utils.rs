//! Shared helpers: the crate error type, address math and small codecs.

use thiserror::Error;

/// Byte stride between two instances of the same IP block.
pub const INSTANCE_STRIDE: u64 = 0x100_0000;

/// Errors surfaced by the drivers. Alignment and truncation are *not* in
/// here on purpose: the hardware tolerates both, so the window corrects
/// the access and emits a warning instead of failing the call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("PCIe resource {path} is unavailable")]
    DeviceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("BAR window is not open")]
    NotOpen,
    #[error("offset {offset:#x} is outside the {size:#x}-byte BAR window")]
    OutOfWindow { offset: u64, size: u64 },
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    #[error("register '{reg}' has no field '{field}'")]
    UnknownField { reg: &'static str, field: String },
    #[error("value {value:#x} does not fit in {width} bits")]
    ValueTooWide { value: u64, width: u32 },
    #[error("{0}")]
    InvalidArgument(String),
    #[error("socket table of {requested} entries exceeds hardware capacity of {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    #[error("link bring-up failed after {0} attempts")]
    BringUpFailed(u32),
    #[error("failed to decode {what}")]
    Decode { what: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Base offset of instance `index` of a block.
pub fn ip_offset(base: u64, index: u32) -> u64 {
    base + INSTANCE_STRIDE * index as u64
}

/// Reverse the order of the low `len` bytes of `value` (byte `i` moves to
/// position `len - 1 - i`). Applying it twice gives back the input.
pub fn reverse_bytes(value: u64, len: u32) -> u64 {
    let mut out = 0u64;
    for i in 0..len {
        let byte = (value >> ((len - 1 - i) * 8)) & 0xFF;
        out |= byte << (i * 8);
    }
    out
}

/// clap value parser accepting decimal or `0x`-prefixed hex.
pub fn hex_or_int(s: &str) -> std::result::Result<u64, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("'{s}' is not an integer or hexadecimal value"))
}

/// Render rows as a plain fixed-width table (header row first).
pub fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }
    let mut out = String::new();
    for (n, row) in rows.iter().enumerate() {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            line.push_str(&format!("| {:width$} ", cell, width = widths[i]));
        }
        line.push('|');
        out.push_str(line.trim_end());
        out.push('\n');
        if n == 0 {
            let mut rule = String::new();
            for w in &widths {
                rule.push_str(&format!("|{:-<width$}", "", width = w + 2));
            }
            rule.push('|');
            out.push_str(&rule);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_bytes_involution() {
        for len in [4, 6] {
            for value in [0u64, 0x0102_0304_0506, 0xFFFF_FFFF_FFFF, 0xDEAD_BEEF] {
                let masked = value & ((1u64 << (len * 8)) - 1);
                assert_eq!(reverse_bytes(reverse_bytes(masked, len), len), masked);
            }
        }
    }

    #[test]
    fn test_reverse_bytes_moves_octets() {
        assert_eq!(reverse_bytes(0x0102_0304, 4), 0x0403_0201);
        assert_eq!(reverse_bytes(0xB83F_D224_51C0, 6), 0xC051_24D2_3FB8);
    }

    #[test]
    fn test_hex_or_int() {
        assert_eq!(hex_or_int("42").unwrap(), 42);
        assert_eq!(hex_or_int("0x10F0").unwrap(), 0x10F0);
        assert_eq!(hex_or_int("0X10f0").unwrap(), 0x10F0);
        assert!(hex_or_int("zzz").is_err());
    }

    #[test]
    fn test_ip_offset() {
        assert_eq!(ip_offset(0x200_0000, 0), 0x200_0000);
        assert_eq!(ip_offset(0x200_0000, 1), 0x300_0000);
    }

    #[test]
    fn test_render_table_alignment() {
        let rows = vec![
            vec!["Register".to_string(), "Value".to_string()],
            vec!["GLOBAL_MODE".to_string(), "0x1".to_string()],
        ];
        let table = render_table(&rows);
        assert!(table.contains("| Register"));
        assert!(table.lines().count() == 3);
    }
}
