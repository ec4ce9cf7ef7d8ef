//! Full machine state capture.
//!
//! A [`Snapshot`] owns its own copy of everything that defines where a
//! program is: memory, registers, I, PC, the call stack, the logical
//! framebuffer and both timers. The keypad is not part of it; restoring an
//! old state keeps whatever keys are held right now.

use serde::{Deserialize, Serialize};

use crate::constants::{DISPLAY_PIXELS, MEMORY_SIZE, REGISTER_COUNT};
use crate::error::SnapshotError;
use crate::framebuffer::FrameBuffer;
use crate::machine::Machine;
use emu_core::logging::{log, LogCategory, LogLevel};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRepr", into = "SnapshotRepr")]
pub struct Snapshot {
    memory: Box<[u8; MEMORY_SIZE]>,
    registers: [u8; REGISTER_COUNT],
    index: u16,
    pc: u16,
    stack: Vec<u16>,
    framebuffer: FrameBuffer,
    delay_timer: u8,
    sound_timer: u8,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("pc", &format_args!("{:#05X}", self.pc))
            .field("index", &format_args!("{:#05X}", self.index))
            .field("registers", &self.registers)
            .field("stack", &self.stack)
            .field("framebuffer", &self.framebuffer)
            .field("delay_timer", &self.delay_timer)
            .field("sound_timer", &self.sound_timer)
            .finish()
    }
}

impl Snapshot {
    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }
}

impl Machine {
    /// Deep copy of the current state
    pub fn capture(&self) -> Snapshot {
        Snapshot {
            memory: self.memory.clone(),
            registers: self.v,
            index: self.i,
            pc: self.pc,
            stack: self.stack.clone(),
            framebuffer: self.framebuffer.clone(),
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
        }
    }

    /// Return to a captured state. Clears a halt; keeps the keypad.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.memory.copy_from_slice(&snapshot.memory[..]);
        self.v = snapshot.registers;
        self.i = snapshot.index;
        self.pc = snapshot.pc;
        self.stack.clone_from(&snapshot.stack);
        self.framebuffer.clone_from(&snapshot.framebuffer);
        self.delay_timer = snapshot.delay_timer;
        self.sound_timer = snapshot.sound_timer;
        self.halted = None;

        log(LogCategory::Memory, LogLevel::Info, || {
            format!(
                "restored snapshot at pc={:#05X}, stack depth {}",
                snapshot.pc,
                snapshot.stack.len()
            )
        });
    }
}

/// Serialised layout, with the fixed-size arrays flattened to sequences
#[derive(Serialize, Deserialize)]
struct SnapshotRepr {
    memory: Vec<u8>,
    registers: [u8; REGISTER_COUNT],
    index: u16,
    pc: u16,
    stack: Vec<u16>,
    framebuffer: Vec<bool>,
    delay_timer: u8,
    sound_timer: u8,
}

impl From<Snapshot> for SnapshotRepr {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            memory: snapshot.memory.to_vec(),
            registers: snapshot.registers,
            index: snapshot.index,
            pc: snapshot.pc,
            stack: snapshot.stack,
            framebuffer: snapshot.framebuffer.pixels().to_vec(),
            delay_timer: snapshot.delay_timer,
            sound_timer: snapshot.sound_timer,
        }
    }
}

impl TryFrom<SnapshotRepr> for Snapshot {
    type Error = SnapshotError;

    fn try_from(repr: SnapshotRepr) -> Result<Self, Self::Error> {
        let memory_len = repr.memory.len();
        let memory: Box<[u8; MEMORY_SIZE]> = repr
            .memory
            .into_boxed_slice()
            .try_into()
            .map_err(|_| SnapshotError::MemorySize {
                len: memory_len,
                expected: MEMORY_SIZE,
            })?;

        let pixels: [bool; DISPLAY_PIXELS] = repr.framebuffer.as_slice().try_into().map_err(|_| {
            SnapshotError::FramebufferSize {
                len: repr.framebuffer.len(),
                expected: DISPLAY_PIXELS,
            }
        })?;

        Ok(Self {
            memory,
            registers: repr.registers,
            index: repr.index,
            pc: repr.pc,
            stack: repr.stack,
            framebuffer: FrameBuffer::from_pixels(pixels),
            delay_timer: repr.delay_timer,
            sound_timer: repr.sound_timer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_machine() -> Machine {
        // v0 = 3, call 0x208, ..., 0x208: delay = v0, draw glyph 0
        let program = [
            0x60, 0x03, 0x22, 0x08, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x15, 0xD1, 0x15,
        ];
        let mut machine = Machine::with_seed(3);
        machine.load(&program).unwrap();
        for _ in 0..4 {
            machine.step().unwrap();
        }
        machine
    }

    #[test]
    fn test_capture_copies_state() {
        let machine = busy_machine();
        let snapshot = machine.capture();
        assert_eq!(snapshot.pc(), machine.pc());
        assert_eq!(snapshot.stack(), &[0x204]);
        assert_eq!(snapshot.delay_timer(), 3);
        assert_eq!(snapshot.registers()[0], 3);
        assert_eq!(snapshot.framebuffer(), machine.framebuffer());
        assert_eq!(&snapshot.memory()[..], &machine.memory()[..]);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut machine = busy_machine();
        let snapshot = machine.capture();

        machine.tick_timers();
        machine.step().unwrap();
        machine.set_key(0xA, true);
        assert_ne!(machine.pc(), snapshot.pc());

        machine.restore(&snapshot);
        assert_eq!(machine.pc(), snapshot.pc());
        assert_eq!(machine.registers(), snapshot.registers());
        assert_eq!(machine.stack(), snapshot.stack());
        assert_eq!(machine.delay_timer(), 3);
        assert_eq!(machine.framebuffer(), snapshot.framebuffer());
        assert_eq!(&machine.memory()[..], &snapshot.memory()[..]);
        assert!(machine.is_key_pressed(0xA), "keypad keeps its live state");
    }

    #[test]
    fn test_snapshot_is_independent_of_machine() {
        let mut machine = busy_machine();
        let snapshot = machine.capture();
        let copy = snapshot.clone();
        for _ in 0..10 {
            let _ = machine.step();
        }
        assert_eq!(snapshot, copy);
    }

    #[test]
    fn test_restore_clears_halt() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0x00, 0xEE]).unwrap();
        let snapshot = machine.capture();
        assert!(machine.step().is_err());
        assert!(machine.is_halted());

        machine.restore(&snapshot);
        assert!(!machine.is_halted());
        assert_eq!(machine.pc(), 0x200);
    }

    #[test]
    fn test_serde_round_trip() {
        let snapshot = busy_machine().capture();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_deserialize_rejects_short_memory() {
        let snapshot = busy_machine().capture();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["memory"] = serde_json::json!([0, 1, 2]);
        let err = serde_json::from_value::<Snapshot>(value).unwrap_err();
        assert!(err.to_string().contains("memory is 3 bytes"), "{}", err);
    }

    #[test]
    fn test_deserialize_rejects_wrong_framebuffer() {
        let snapshot = busy_machine().capture();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["framebuffer"] = serde_json::json!([true]);
        let err = serde_json::from_value::<Snapshot>(value).unwrap_err();
        assert!(err.to_string().contains("framebuffer has 1 pixels"), "{}", err);
    }
}
