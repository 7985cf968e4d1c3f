//! In-memory stand-in for the BAR window, for exercising the drivers
//! without hardware. Reads can be scripted per offset to model status
//! bits that change over time (e.g. a fault bit that clears after a few
//! polls); every write is recorded so tests can assert on the exact
//! register traffic a procedure generates.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::bar::Mmio;
use crate::utils::Result;

#[derive(Default)]
pub struct FakeBar {
    mem: RefCell<HashMap<u64, u32>>,
    scripts: RefCell<HashMap<u64, VecDeque<u32>>>,
    writes: RefCell<Vec<(u64, u32)>>,
}

impl FakeBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a register value without it showing up in the write log.
    pub fn preset(&self, offset: u64, value: u32) {
        self.mem.borrow_mut().insert(offset, value);
    }

    /// Serve these values for successive reads of `offset`; the final
    /// value keeps being served once the queue is drained.
    pub fn script_reads(&self, offset: u64, values: &[u32]) {
        self.scripts
            .borrow_mut()
            .insert(offset, values.iter().copied().collect());
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }

    pub fn writes(&self) -> Vec<(u64, u32)> {
        self.writes.borrow().clone()
    }

    pub fn writes_to(&self, offset: u64) -> Vec<u32> {
        self.writes
            .borrow()
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn last_write(&self, offset: u64) -> Option<u32> {
        self.writes_to(offset).last().copied()
    }

    pub fn value(&self, offset: u64) -> u32 {
        *self.mem.borrow().get(&offset).unwrap_or(&0)
    }
}

impl Mmio for FakeBar {
    fn read(&self, byte_offset: u64) -> Result<u32> {
        if let Some(queue) = self.scripts.borrow_mut().get_mut(&byte_offset) {
            if queue.len() > 1 {
                return Ok(queue.pop_front().unwrap());
            }
            if let Some(&value) = queue.front() {
                return Ok(value);
            }
        }
        Ok(self.value(byte_offset))
    }

    fn write(&self, byte_offset: u64, value: u64) -> Result<()> {
        let word = value as u32;
        self.writes.borrow_mut().push((byte_offset, word));
        self.mem.borrow_mut().insert(byte_offset, word);
        Ok(())
    }
}
