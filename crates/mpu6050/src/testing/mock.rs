use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::interface::{Interface, sealed};
use crate::register::{Register, who_am_i};

/// Register-file mock shared between the test and the driver.
///
/// Clones share state, so a test can keep a handle while the driver owns
/// another and inject data or stall the bus from outside.
#[derive(Clone, Debug)]
pub(crate) struct MockInterface {
    shared: Arc<MockShared>,
}

#[derive(Debug)]
struct MockShared {
    state: Mutex<MockState>,
    gate: Condvar,
}

#[derive(Debug)]
struct MockState {
    regs: [u8; 256],
    writes: Vec<(u8, u8)>,
    reads: usize,
    stuck: Vec<(u8, u8)>,
    blocked: bool,
    waiting: usize,
    fail_reads: bool,
    panic_reads: bool,
}

impl Default for MockInterface {
    fn default() -> Self {
        let mut regs = [0u8; 256];
        regs[Register::WhoAmI.addr() as usize] = who_am_i::EXPECTED;
        Self {
            shared: Arc::new(MockShared {
                state: Mutex::new(MockState {
                    regs,
                    writes: Vec::new(),
                    reads: 0,
                    stuck: Vec::new(),
                    blocked: false,
                    waiting: 0,
                    fail_reads: false,
                    panic_reads: false,
                }),
                gate: Condvar::new(),
            }),
        }
    }
}

impl MockInterface {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.shared.state.lock().unwrap()
    }

    pub(crate) fn with_reg(self, reg: u8, value: u8) -> Self {
        self.set_reg(reg, value);
        self
    }

    /// Makes `reg` ignore writes and always read back `value`.
    pub(crate) fn with_stuck_reg(self, reg: u8, value: u8) -> Self {
        self.state().stuck.push((reg, value));
        self
    }

    pub(crate) fn set_reg(&self, reg: u8, value: u8) {
        self.state().regs[reg as usize] = value;
    }

    pub(crate) fn set_accel(&self, counts: [i16; 3]) {
        self.set_words(Register::AccelXoutH.addr(), counts);
    }

    pub(crate) fn set_gyro(&self, counts: [i16; 3]) {
        self.set_words(Register::GyroXoutH.addr(), counts);
    }

    pub(crate) fn set_temperature(&self, count: i16) {
        let [high, low] = count.to_be_bytes();
        let base = Register::TempOutH.addr();
        self.set_reg(base, high);
        self.set_reg(base + 1, low);
    }

    fn set_words(&self, base: u8, words: [i16; 3]) {
        let mut state = self.state();
        for (index, word) in words.iter().enumerate() {
            let [high, low] = word.to_be_bytes();
            let addr = base as usize + index * 2;
            state.regs[addr] = high;
            state.regs[addr + 1] = low;
        }
    }

    pub(crate) fn writes(&self) -> Vec<(u8, u8)> {
        self.state().writes.clone()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.state().writes.len()
    }

    pub(crate) fn read_count(&self) -> usize {
        self.state().reads
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    /// Makes every subsequent read panic, outside the mock's own lock.
    pub(crate) fn panic_on_reads(&self, panic: bool) {
        self.state().panic_reads = panic;
    }

    /// Stalls every subsequent read until [`unblock_reads`](Self::unblock_reads).
    pub(crate) fn block_reads(&self) {
        self.state().blocked = true;
    }

    pub(crate) fn unblock_reads(&self) {
        self.state().blocked = false;
        self.shared.gate.notify_all();
    }

    /// Waits until some thread is parked inside a stalled read.
    pub(crate) fn wait_for_blocked_reader(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state();
        while state.waiting == 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self.shared.gate.wait_timeout(state, deadline - now).unwrap().0;
        }
        true
    }

    /// Number of live handles, including the one owned by the driver.
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.shared)
    }

    fn read_into(&self, reg: u8, buffer: &mut [u8]) -> Result<(), Error> {
        let mut state = self.state();
        while state.blocked {
            state.waiting += 1;
            self.shared.gate.notify_all();
            state = self.shared.gate.wait(state).unwrap();
            state.waiting -= 1;
        }
        if state.panic_reads {
            drop(state);
            panic!("injected read panic at register {reg:#04x}");
        }
        if state.fail_reads {
            return Err(Error::Bus);
        }
        state.reads += 1;
        for (offset, slot) in buffer.iter_mut().enumerate() {
            let addr = reg.wrapping_add(offset as u8);
            *slot = match state.stuck.iter().find(|(stuck, _)| *stuck == addr) {
                Some(&(_, value)) => value,
                None => state.regs[addr as usize],
            };
        }
        Ok(())
    }
}

impl Interface for MockInterface {
    fn read_reg(&mut self, reg: u8) -> Result<u8, Error> {
        let mut buffer = [0u8];
        self.read_into(reg, &mut buffer)?;
        Ok(buffer[0])
    }

    fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error> {
        self.read_into(reg, buffer)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        let mut state = self.state();
        state.regs[reg as usize] = value;
        state.writes.push((reg, value));
        Ok(())
    }
}

impl sealed::Sealed for MockInterface {}
