//! The CHIP-8 virtual machine.
//!
//! [`Machine`] owns memory, registers, the call stack, both timers, the
//! keypad latches and the logical framebuffer. It is driven from outside:
//!
//! - [`Machine::step`] runs one fetch-decode-execute cycle
//! - [`Machine::tick_timers`] decrements the timers and must be called at 60 Hz
//!   independently of how many steps run in between
//! - [`Machine::set_key`] updates the keypad latches between steps
//!
//! # Memory map
//!
//! ```text
//! 0x000-0x04F  hexadecimal font (16 glyphs x 5 bytes)
//! 0x050-0x1FF  reserved
//! 0x200-0xFFF  program and data
//! ```
//!
//! All memory accesses and PC are masked to 12 bits, so anything that runs
//! past 0xFFF wraps to the start of memory.
//!
//! # Key wait
//!
//! `Fx0A` never blocks the caller. With no key pressed it rewinds PC so the
//! same instruction runs again on the next step; the driver stays free to
//! poll input or stop stepping at any time.

use emu_core::logging::{log, LogCategory, LogLevel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{
    ADDRESS_MASK, DISPLAY_HEIGHT, DISPLAY_WIDTH, FLAG_REGISTER, FONT_GLYPH_SIZE, FONT_START,
    KEY_COUNT, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START, REGISTER_COUNT,
};
use crate::error::MachineError;
use crate::font::FONT_SET;
use crate::framebuffer::FrameBuffer;
use crate::instruction::{AluOp, Instruction};

/// Call depth of the COSMAC VIP interpreter; deeper stacks are allowed but logged
const HARDWARE_STACK_DEPTH: usize = 16;

#[derive(Clone)]
pub struct Machine {
    pub(crate) memory: Box<[u8; MEMORY_SIZE]>,
    pub(crate) v: [u8; REGISTER_COUNT],
    pub(crate) i: u16,
    pub(crate) pc: u16,
    pub(crate) stack: Vec<u16>,
    pub(crate) framebuffer: FrameBuffer,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    pub(crate) keypad: [bool; KEY_COUNT],
    /// Set by a fatal fault; every later step returns it again
    pub(crate) halted: Option<MachineError>,
    rng: StdRng,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Power-on state with the font loaded and a random source seeded from the OS
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Power-on state with a deterministic random source
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut memory = Box::new([0u8; MEMORY_SIZE]);
        let font_start = FONT_START as usize;
        memory[font_start..font_start + FONT_SET.len()].copy_from_slice(&FONT_SET);

        Self {
            memory,
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            stack: Vec::with_capacity(HARDWARE_STACK_DEPTH),
            framebuffer: FrameBuffer::new(),
            delay_timer: 0,
            sound_timer: 0,
            keypad: [false; KEY_COUNT],
            halted: None,
            rng,
        }
    }

    /// Copy a program to 0x200.
    ///
    /// Fails without touching memory if the program is larger than the 3584
    /// bytes above the reserved area. Registers, timers and the screen are
    /// left alone; load into a fresh machine.
    pub fn load(&mut self, program: &[u8]) -> Result<(), MachineError> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(MachineError::CapacityExceeded {
                size: program.len(),
                capacity: MAX_PROGRAM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        log(LogCategory::Memory, LogLevel::Info, || {
            format!("loaded {} byte program at {:#05X}", program.len(), start)
        });
        Ok(())
    }

    /// Execute one instruction.
    ///
    /// A halted machine returns its fault without executing anything.
    pub fn step(&mut self) -> Result<(), MachineError> {
        if let Some(fault) = &self.halted {
            return Err(fault.clone());
        }

        let word = self.fetch();
        let instruction = Instruction::decode(word);
        log(LogCategory::Cpu, LogLevel::Trace, || {
            format!(
                "{:04X} {:?} pc={:04X} i={:04X} v={:02X?}",
                word, instruction, self.pc, self.i, self.v
            )
        });

        if let Err(fault) = self.execute(instruction) {
            log(LogCategory::Cpu, LogLevel::Error, || {
                format!("machine halted: {}", fault)
            });
            self.halted = Some(fault.clone());
            return Err(fault);
        }
        Ok(())
    }

    /// Decrement both timers towards zero. Call at 60 Hz.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        if self.sound_timer == 1 {
            log(LogCategory::Timers, LogLevel::Debug, || {
                "sound timer expired".to_string()
            });
        }
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Latch a keypad key.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a key identifier (0x0-0xF).
    pub fn set_key(&mut self, index: u8, pressed: bool) {
        assert!(
            (index as usize) < KEY_COUNT,
            "key index {:#X} is outside the 16-key pad",
            index
        );
        if self.keypad[index as usize] != pressed {
            log(LogCategory::Input, LogLevel::Debug, || {
                format!(
                    "key {:X} {}",
                    index,
                    if pressed { "down" } else { "up" }
                )
            });
        }
        self.keypad[index as usize] = pressed;
    }

    pub fn is_key_pressed(&self, index: u8) -> bool {
        self.keypad[(index & 0xF) as usize]
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

    /// The buzzer sounds while the sound timer is nonzero
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    #[inline]
    fn read(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDRESS_MASK) as usize]
    }

    #[inline]
    fn write(&mut self, addr: u16, val: u8) {
        self.memory[(addr & ADDRESS_MASK) as usize] = val;
    }

    /// Read the big-endian word at PC and move PC past it
    fn fetch(&mut self) -> u16 {
        let hi = self.read(self.pc);
        let lo = self.read(self.pc.wrapping_add(1));
        self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK;
        u16::from_be_bytes([hi, lo])
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK;
        }
    }

    /// VF is written before Vx, so a result in VF overwrites the flag
    fn write_with_flag(&mut self, x: usize, flag: bool, value: u8) {
        self.v[FLAG_REGISTER] = flag as u8;
        self.v[x] = value;
    }

    fn execute(&mut self, instruction: Instruction) -> Result<(), MachineError> {
        match instruction {
            Instruction::Clear => {
                self.framebuffer.clear();
                log(LogCategory::Display, LogLevel::Trace, || {
                    "screen cleared".to_string()
                });
            }
            Instruction::Return => {
                self.pc = self.stack.pop().ok_or(MachineError::StackUnderflow {
                    pc: self.pc.wrapping_sub(2) & ADDRESS_MASK,
                })?;
            }
            Instruction::System(addr) => {
                log(LogCategory::Stubs, LogLevel::Debug, || {
                    format!("ignoring machine-code call to {:#05X}", addr)
                });
            }
            Instruction::Jump(addr) => self.pc = addr,
            Instruction::Call(addr) => {
                self.stack.push(self.pc);
                if self.stack.len() > HARDWARE_STACK_DEPTH {
                    log(LogCategory::Cpu, LogLevel::Debug, || {
                        format!("call depth {} exceeds hardware stack", self.stack.len())
                    });
                }
                self.pc = addr;
            }
            Instruction::SkipIfEqual { x, nn } => self.skip_if(self.v[x] == nn),
            Instruction::SkipIfNotEqual { x, nn } => self.skip_if(self.v[x] != nn),
            Instruction::SkipIfRegistersEqual { x, y } => self.skip_if(self.v[x] == self.v[y]),
            Instruction::SkipIfRegistersNotEqual { x, y } => {
                self.skip_if(self.v[x] != self.v[y])
            }
            Instruction::Load { x, nn } => self.v[x] = nn,
            Instruction::AddImmediate { x, nn } => self.v[x] = self.v[x].wrapping_add(nn),
            Instruction::Alu { op, x, y } => self.alu(op, x, y),
            Instruction::LoadIndex(addr) => self.i = addr,
            Instruction::JumpOffset(addr) => {
                self.pc = (addr + self.v[0] as u16) & ADDRESS_MASK;
            }
            Instruction::Random { x, nn } => self.v[x] = self.rng.gen::<u8>() & nn,
            Instruction::Draw { x, y, n } => self.draw(x, y, n),
            Instruction::SkipIfKeyPressed { x } => self.skip_if(self.is_key_pressed(self.v[x])),
            Instruction::SkipIfKeyReleased { x } => {
                self.skip_if(!self.is_key_pressed(self.v[x]))
            }
            Instruction::ReadDelay { x } => self.v[x] = self.delay_timer,
            Instruction::WaitForKey { x } => match self.keypad.iter().position(|&down| down) {
                Some(key) => {
                    self.v[x] = key as u8;
                    log(LogCategory::Input, LogLevel::Trace, || {
                        format!("key wait satisfied by {:X}", key)
                    });
                }
                None => self.pc = self.pc.wrapping_sub(2) & ADDRESS_MASK,
            },
            Instruction::SetDelay { x } => self.delay_timer = self.v[x],
            Instruction::SetSound { x } => self.sound_timer = self.v[x],
            Instruction::AddIndex { x } => {
                self.i = self.i.wrapping_add(self.v[x] as u16) & ADDRESS_MASK;
            }
            Instruction::FontAddress { x } => {
                self.i = FONT_START + self.v[x] as u16 * FONT_GLYPH_SIZE;
            }
            Instruction::StoreBcd { x } => {
                let value = self.v[x];
                self.write(self.i, value / 100);
                self.write(self.i.wrapping_add(1), (value / 10) % 10);
                self.write(self.i.wrapping_add(2), value % 10);
            }
            Instruction::StoreRegisters { x } => {
                for r in 0..=x {
                    self.write(self.i.wrapping_add(r as u16), self.v[r]);
                }
            }
            Instruction::LoadRegisters { x } => {
                for r in 0..=x {
                    self.v[r] = self.read(self.i.wrapping_add(r as u16));
                }
            }
            Instruction::Unknown(word) => {
                log(LogCategory::Stubs, LogLevel::Warn, || {
                    format!(
                        "unknown opcode {:04X} at {:#05X}",
                        word,
                        self.pc.wrapping_sub(2) & ADDRESS_MASK
                    )
                });
            }
        }
        Ok(())
    }

    fn alu(&mut self, op: AluOp, x: usize, y: usize) {
        let (vx, vy) = (self.v[x], self.v[y]);
        match op {
            AluOp::Copy => self.v[x] = vy,
            AluOp::Or => self.v[x] = vx | vy,
            AluOp::And => self.v[x] = vx & vy,
            AluOp::Xor => self.v[x] = vx ^ vy,
            AluOp::Add => {
                let (sum, carry) = vx.overflowing_add(vy);
                self.write_with_flag(x, carry, sum);
            }
            AluOp::Sub => self.write_with_flag(x, vx >= vy, vx.wrapping_sub(vy)),
            AluOp::ShiftRight => self.write_with_flag(x, vx & 0x01 != 0, vx >> 1),
            AluOp::SubReversed => self.write_with_flag(x, vy >= vx, vy.wrapping_sub(vx)),
            AluOp::ShiftLeft => self.write_with_flag(x, vx & 0x80 != 0, vx << 1),
        }
    }

    /// XOR an 8-pixel-wide, `n`-row sprite from memory at I onto the screen.
    /// Coordinates wrap; VF reports whether any lit pixel was turned off.
    fn draw(&mut self, x: usize, y: usize, n: u8) {
        let origin_x = self.v[x] as usize % DISPLAY_WIDTH;
        let origin_y = self.v[y] as usize % DISPLAY_HEIGHT;
        self.v[FLAG_REGISTER] = 0;

        let mut collision = false;
        for row in 0..n as usize {
            let sprite = self.read(self.i.wrapping_add(row as u16));
            for col in 0..8 {
                if sprite & (0x80 >> col) != 0 {
                    collision |= self.framebuffer.toggle(origin_x + col, origin_y + row);
                }
            }
        }
        self.v[FLAG_REGISTER] = collision as u8;

        log(LogCategory::Display, LogLevel::Trace, || {
            format!(
                "draw {}x8 at ({}, {}) from {:#05X}, collision={}",
                n, origin_x, origin_y, self.i, collision
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Machine with `words` assembled at 0x200
    fn machine_with(words: &[u16]) -> Machine {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        let mut machine = Machine::with_seed(7);
        machine.load(&bytes).unwrap();
        machine
    }

    fn run(machine: &mut Machine, steps: usize) {
        for _ in 0..steps {
            machine.step().unwrap();
        }
    }

    #[test]
    fn test_power_on_state() {
        let machine = Machine::with_seed(0);
        assert_eq!(machine.pc(), 0x200);
        assert_eq!(machine.index(), 0);
        assert!(machine.stack().is_empty());
        assert!(machine.framebuffer().is_blank());
        assert_eq!(&machine.memory()[0..80], &FONT_SET[..]);
        assert!(machine.memory()[0x200..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_copies_at_program_start() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(&machine.memory()[0x200..0x203], &[0x12, 0x34, 0x56]);
        assert_eq!(&machine.memory()[0..80], &FONT_SET[..]);
    }

    #[test]
    fn test_load_accepts_exact_capacity() {
        let mut machine = Machine::with_seed(0);
        let program = vec![0xAB; MAX_PROGRAM_SIZE];
        assert!(machine.load(&program).is_ok());
        assert_eq!(machine.memory()[0xFFF], 0xAB);
    }

    #[test]
    fn test_load_rejects_oversized_program_without_partial_write() {
        let mut machine = Machine::with_seed(0);
        let program = vec![0xAB; MAX_PROGRAM_SIZE + 1];
        assert_eq!(
            machine.load(&program),
            Err(MachineError::CapacityExceeded {
                size: 3585,
                capacity: 3584
            })
        );
        assert!(machine.memory()[0x200..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_00e0_clears_screen() {
        let mut machine = machine_with(&[0x00E0]);
        machine.framebuffer.toggle(10, 10);
        machine.framebuffer.toggle(63, 31);
        run(&mut machine, 1);
        assert!(machine.framebuffer().is_blank());
        assert_eq!(machine.pc(), 0x202);
    }

    #[test]
    fn test_call_and_return() {
        // 0x200: call 0x206; 0x202: (return lands here); 0x206: return
        let mut machine = machine_with(&[0x2206, 0x0000, 0x0000, 0x00EE]);
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x206);
        assert_eq!(machine.stack(), &[0x202]);
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x202);
        assert!(machine.stack().is_empty());
    }

    #[test]
    fn test_return_on_empty_stack_halts() {
        let mut machine = machine_with(&[0x00EE]);
        let fault = MachineError::StackUnderflow { pc: 0x200 };
        assert_eq!(machine.step(), Err(fault.clone()));
        assert!(machine.is_halted());

        let pc = machine.pc();
        assert_eq!(machine.step(), Err(fault));
        assert_eq!(machine.pc(), pc, "halted machine must not execute");
    }

    #[test]
    fn test_stack_grows_past_hardware_depth() {
        // Recursive call to itself
        let mut machine = machine_with(&[0x2200]);
        run(&mut machine, 20);
        assert_eq!(machine.stack().len(), 20);
    }

    #[test]
    fn test_1nnn_jump() {
        let mut machine = machine_with(&[0x1ABC]);
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0xABC);
    }

    #[test]
    fn test_bnnn_jump_with_offset() {
        let mut machine = machine_with(&[0xB300]);
        machine.v[0] = 0x12;
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x312);
    }

    #[test]
    fn test_skip_immediate() {
        let mut machine = machine_with(&[0x3142, 0x0000, 0x4142]);
        machine.v[1] = 0x42;
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x204, "3xnn skips when equal");
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x206, "4xnn does not skip when equal");
    }

    #[test]
    fn test_skip_register() {
        let mut machine = machine_with(&[0x5120, 0x9120]);
        machine.v[1] = 3;
        machine.v[2] = 4;
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x202, "5xy0 does not skip when different");
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x206, "9xy0 skips when different");
    }

    #[test]
    fn test_non_control_flow_advances_by_two() {
        let words = [
            0x6A12, 0x7A01, 0x8AB0, 0x8AB1, 0x8AB2, 0x8AB3, 0x8AB4, 0x8AB5, 0x8AB6, 0x8AB7,
            0x8ABE, 0xA300, 0xCA0F, 0xD001, 0xFA07, 0xFA15, 0xFA18, 0xFA1E, 0xFA29, 0xFA33,
            0xFA55, 0xFA65, 0x0123, 0xFAFF,
        ];
        let mut machine = machine_with(&words);
        for n in 0..words.len() {
            let before = machine.pc();
            machine.step().unwrap();
            assert_eq!(
                machine.pc(),
                before + 2,
                "instruction {} ({:04X}) must advance PC by 2",
                n,
                words[n]
            );
        }
    }

    #[test]
    fn test_6xnn_and_7xnn() {
        let mut machine = machine_with(&[0x63FF, 0x7302]);
        run(&mut machine, 2);
        assert_eq!(machine.registers()[3], 0x01);
        assert_eq!(machine.registers()[0xF], 0, "7xnn never sets VF");
    }

    #[test]
    fn test_logic_ops_leave_flag() {
        let mut machine = machine_with(&[0x8121, 0x8122, 0x8123]);
        machine.v[1] = 0b1100;
        machine.v[2] = 0b1010;
        machine.v[0xF] = 0x77;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0b1110);
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0b1010);
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0);
        assert_eq!(machine.v[0xF], 0x77);
    }

    #[test]
    fn test_8xy4_add_overflow() {
        let mut machine = machine_with(&[0x8124]);
        machine.v[1] = 0xFF;
        machine.v[2] = 0x01;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0x00);
        assert_eq!(machine.v[0xF], 1);
    }

    #[test]
    fn test_8xy4_add_no_carry() {
        let mut machine = machine_with(&[0x8124]);
        machine.v[1] = 0xEE;
        machine.v[2] = 0x11;
        machine.v[0xF] = 1;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0xFF);
        assert_eq!(machine.v[0xF], 0);
    }

    #[test]
    fn test_8xy5_subtract_without_borrow() {
        let mut machine = machine_with(&[0x8125]);
        machine.v[1] = 0x05;
        machine.v[2] = 0x03;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0x02);
        assert_eq!(machine.v[0xF], 1);
    }

    #[test]
    fn test_8xy5_subtract_with_borrow_and_equal() {
        let mut machine = machine_with(&[0x8125, 0x8345]);
        machine.v[1] = 0x03;
        machine.v[2] = 0x05;
        machine.v[3] = 0x09;
        machine.v[4] = 0x09;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0xFE);
        assert_eq!(machine.v[0xF], 0);
        run(&mut machine, 1);
        assert_eq!(machine.v[3], 0);
        assert_eq!(machine.v[0xF], 1, "equal operands do not borrow");
    }

    #[test]
    fn test_8xy6_shift_right() {
        let mut machine = machine_with(&[0x8106, 0x8106]);
        machine.v[1] = 0b101;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0b10);
        assert_eq!(machine.v[0xF], 1);
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0b1);
        assert_eq!(machine.v[0xF], 0);
    }

    #[test]
    fn test_8xy7_reverse_subtract() {
        let mut machine = machine_with(&[0x8127, 0x8347]);
        machine.v[1] = 0x11;
        machine.v[2] = 0x33;
        machine.v[3] = 0x12;
        machine.v[4] = 0x11;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0x22);
        assert_eq!(machine.v[0xF], 1);
        run(&mut machine, 1);
        assert_eq!(machine.v[3], 0xFF);
        assert_eq!(machine.v[0xF], 0);
    }

    #[test]
    fn test_8xye_shift_left() {
        let mut machine = machine_with(&[0x810E, 0x810E]);
        machine.v[1] = 0xC1;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0x82);
        assert_eq!(machine.v[0xF], 1);
        machine.v[1] = 0x04;
        run(&mut machine, 1);
        assert_eq!(machine.v[1], 0x08);
        assert_eq!(machine.v[0xF], 0);
    }

    #[test]
    fn test_result_in_vf_overwrites_flag() {
        // VF = 0xFF + 0x01: the flag (1) is written first, then the result (0)
        let mut machine = machine_with(&[0x8F14, 0x8F06]);
        machine.v[0xF] = 0xFF;
        machine.v[1] = 0x01;
        run(&mut machine, 1);
        assert_eq!(machine.v[0xF], 0x00);

        // 3 >> 1: flag 1 then result 1
        machine.v[0xF] = 0x03;
        run(&mut machine, 1);
        assert_eq!(machine.v[0xF], 0x01);
    }

    #[test]
    fn test_annn_and_fx1e_index() {
        let mut machine = machine_with(&[0xAFFE, 0xF11E]);
        machine.v[1] = 0x03;
        run(&mut machine, 1);
        assert_eq!(machine.index(), 0xFFE);
        run(&mut machine, 1);
        assert_eq!(machine.index(), 0x001, "I wraps at 4096");
    }

    #[test]
    fn test_cxnn_masks_random_byte() {
        let mut machine = machine_with(&[0xC10F, 0xC200]);
        run(&mut machine, 2);
        assert_eq!(machine.v[1] & 0xF0, 0);
        assert_eq!(machine.v[2], 0);
    }

    #[test]
    fn test_cxnn_is_deterministic_per_seed() {
        let program: Vec<u8> = [0xC1FF_u16, 0xC2FF, 0xC3FF]
            .iter()
            .flat_map(|w| w.to_be_bytes())
            .collect();
        let mut a = Machine::with_seed(99);
        let mut b = Machine::with_seed(99);
        a.load(&program).unwrap();
        b.load(&program).unwrap();
        run(&mut a, 3);
        run(&mut b, 3);
        assert_eq!(a.registers(), b.registers());
    }

    #[test]
    fn test_dxyn_draws_font_glyph() {
        // Draw glyph "0" at (1, 1)
        let mut machine = machine_with(&[0xD005]);
        machine.v[0] = 1;
        run(&mut machine, 1);
        let fb = machine.framebuffer();
        let rows = [
            [true, true, true, true],
            [true, false, false, true],
            [true, false, false, true],
            [true, false, false, true],
            [true, true, true, true],
        ];
        for (dy, row) in rows.iter().enumerate() {
            for (dx, &lit) in row.iter().enumerate() {
                assert_eq!(fb.get(1 + dx, 1 + dy), lit, "pixel ({}, {})", 1 + dx, 1 + dy);
            }
        }
        assert_eq!(fb.lit_count(), 14);
        assert_eq!(machine.v[0xF], 0);
    }

    #[test]
    fn test_dxyn_same_sprite_twice_restores_screen() {
        let mut machine = machine_with(&[0xA00A, 0xD125, 0xD125]);
        machine.v[1] = 20;
        machine.v[2] = 10;
        machine.framebuffer.toggle(0, 0);
        let before = machine.framebuffer().clone();

        run(&mut machine, 2);
        assert_ne!(machine.framebuffer(), &before);
        assert_eq!(machine.v[0xF], 0);

        run(&mut machine, 1);
        assert_eq!(machine.framebuffer(), &before);
        assert_eq!(machine.v[0xF], 1);
    }

    #[test]
    fn test_dxyn_resets_flag_without_collision() {
        let mut machine = machine_with(&[0xD001]);
        machine.v[0xF] = 1;
        machine.v[0] = 8;
        run(&mut machine, 1);
        assert_eq!(machine.v[0xF], 0);
    }

    #[test]
    fn test_dxyn_wraps_toroidally() {
        // One byte of 0xFF drawn at (60, 31) wraps columns 64..67 to 0..3
        let mut machine = machine_with(&[0xA300, 0xD121]);
        machine.memory[0x300] = 0xFF;
        machine.v[1] = 60;
        machine.v[2] = 31;
        run(&mut machine, 2);
        let fb = machine.framebuffer();
        for x in [60, 61, 62, 63, 0, 1, 2, 3] {
            assert!(fb.get(x, 31), "column {} should be lit", x);
        }
        assert_eq!(fb.lit_count(), 8);
    }

    #[test]
    fn test_dxyn_start_coordinates_wrap() {
        let mut machine = machine_with(&[0xA300, 0xD121]);
        machine.memory[0x300] = 0x80;
        machine.v[1] = 64 + 5;
        machine.v[2] = 32 + 7;
        run(&mut machine, 2);
        assert!(machine.framebuffer().get(5, 7));
    }

    #[test]
    fn test_ex9e_exa1_key_skips() {
        let mut machine = machine_with(&[0xE19E, 0x0000, 0xE1A1]);
        machine.v[1] = 0xE;
        machine.set_key(0xE, true);
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x204);
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x206, "ExA1 must not skip while the key is down");
    }

    #[test]
    fn test_exa1_skips_when_released() {
        let mut machine = machine_with(&[0xE1A1]);
        machine.v[1] = 0x3;
        run(&mut machine, 1);
        assert_eq!(machine.pc(), 0x204);
    }

    #[test]
    fn test_timer_opcodes() {
        let mut machine = machine_with(&[0xF115, 0xF218, 0xF307]);
        machine.v[1] = 0x20;
        machine.v[2] = 0x30;
        run(&mut machine, 2);
        assert_eq!(machine.delay_timer(), 0x20);
        assert_eq!(machine.sound_timer(), 0x30);
        assert!(machine.sound_active());
        machine.tick_timers();
        run(&mut machine, 1);
        assert_eq!(machine.v[3], 0x1F);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let mut machine = Machine::with_seed(0);
        machine.delay_timer = 5;
        machine.sound_timer = 5;
        for _ in 0..5 {
            machine.tick_timers();
        }
        assert_eq!(machine.delay_timer(), 0);
        assert_eq!(machine.sound_timer(), 0);
        assert!(!machine.sound_active());

        machine.tick_timers();
        assert_eq!(machine.delay_timer(), 0);
        assert_eq!(machine.sound_timer(), 0);
    }

    #[test]
    fn test_fx0a_waits_without_blocking() {
        let mut machine = machine_with(&[0xF50A]);
        for _ in 0..5 {
            run(&mut machine, 1);
            assert_eq!(machine.pc(), 0x200);
        }

        machine.set_key(0x9, true);
        machine.set_key(0x4, true);
        run(&mut machine, 1);
        assert_eq!(machine.v[5], 0x4, "lowest pressed key wins");
        assert_eq!(machine.pc(), 0x202);
    }

    #[test]
    fn test_fx29_font_address() {
        let mut machine = machine_with(&[0xF129]);
        machine.v[1] = 0xA;
        run(&mut machine, 1);
        assert_eq!(machine.index(), 50);
        let glyph = &machine.memory()[50..55];
        assert_eq!(glyph, &[0xF0, 0x90, 0xF0, 0x90, 0x90]);
    }

    #[test]
    fn test_fx33_bcd() {
        let mut machine = machine_with(&[0xA300, 0xF133]);
        machine.v[1] = 156;
        run(&mut machine, 2);
        assert_eq!(&machine.memory()[0x300..0x303], &[1, 5, 6]);
        assert_eq!(machine.index(), 0x300);
    }

    #[test]
    fn test_fx33_wraps_at_end_of_memory() {
        let mut machine = machine_with(&[0xAFFF, 0xF133]);
        machine.v[1] = 255;
        run(&mut machine, 2);
        assert_eq!(machine.memory()[0xFFF], 2);
        assert_eq!(machine.memory()[0x000], 5);
        assert_eq!(machine.memory()[0x001], 5);
    }

    #[test]
    fn test_fx55_fx65_register_dump_and_load() {
        let mut machine = machine_with(&[0xA300, 0xF355, 0x6000, 0x6100, 0xF265]);
        machine.v[0..5].copy_from_slice(&[1, 2, 3, 4, 5]);
        run(&mut machine, 2);
        assert_eq!(&machine.memory()[0x300..0x305], &[1, 2, 3, 4, 0]);
        assert_eq!(machine.index(), 0x300, "I is left unchanged");

        run(&mut machine, 3);
        assert_eq!(&machine.registers()[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_opcode_is_ignored() {
        let mut machine = machine_with(&[0xE1FF, 0xF1FF, 0x812F]);
        let registers = *machine.registers();
        run(&mut machine, 3);
        assert_eq!(machine.pc(), 0x206);
        assert_eq!(machine.registers(), &registers);
    }

    #[test]
    fn test_fetch_wraps_at_end_of_memory() {
        let mut machine = Machine::with_seed(0);
        machine.pc = 0xFFF;
        machine.memory[0xFFF] = 0x60;
        machine.memory[0x000] = 0x42;
        run(&mut machine, 1);
        assert_eq!(machine.v[0], 0x42);
        assert_eq!(machine.pc(), 0x001);
    }

    #[test]
    #[should_panic(expected = "outside the 16-key pad")]
    fn test_set_key_rejects_out_of_range_index() {
        let mut machine = Machine::with_seed(0);
        machine.set_key(16, true);
    }

    #[test]
    fn test_set_key_latches() {
        let mut machine = Machine::with_seed(0);
        machine.set_key(0xF, true);
        assert!(machine.is_key_pressed(0xF));
        machine.set_key(0xF, false);
        assert!(!machine.is_key_pressed(0xF));
    }
}
