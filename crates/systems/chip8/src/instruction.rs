//! Instruction decoding.
//!
//! Every instruction is a big-endian 16-bit word. The top nibble selects the
//! opcode family; the remaining nibbles are operands:
//!
//! ```text
//! [F x y n]   F   family
//!             x   register index (second nibble)
//!             y   register index (third nibble)
//!             n   4-bit immediate (low nibble)
//!             nn  8-bit immediate (low byte)
//!             nnn 12-bit address (low three nibbles)
//! ```
//!
//! Operands are masked to their nibble width here, so register and key
//! indices taken from a decoded instruction are always in range.

/// Raw instruction word with operand accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    #[inline]
    pub fn family(self) -> u8 {
        (self.0 >> 12) as u8
    }

    #[inline]
    pub fn x(self) -> usize {
        ((self.0 >> 8) & 0xF) as usize
    }

    #[inline]
    pub fn y(self) -> usize {
        ((self.0 >> 4) & 0xF) as usize
    }

    #[inline]
    pub fn n(self) -> u8 {
        (self.0 & 0xF) as u8
    }

    #[inline]
    pub fn nn(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    #[inline]
    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}

/// Register-to-register operations of the `8xy_` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    /// `8xy0` Vx = Vy
    Copy,
    /// `8xy1` Vx |= Vy
    Or,
    /// `8xy2` Vx &= Vy
    And,
    /// `8xy3` Vx ^= Vy
    Xor,
    /// `8xy4` Vx += Vy, VF = carry
    Add,
    /// `8xy5` Vx -= Vy, VF = no borrow
    Sub,
    /// `8xy6` Vx >>= 1, VF = dropped bit
    ShiftRight,
    /// `8xy7` Vx = Vy - Vx, VF = no borrow
    SubReversed,
    /// `8xyE` Vx <<= 1, VF = dropped bit
    ShiftLeft,
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`
    Clear,
    /// `00EE`
    Return,
    /// `0nnn` machine-code routine; not supported by interpreters and ignored
    System(u16),
    /// `1nnn`
    Jump(u16),
    /// `2nnn`
    Call(u16),
    /// `3xnn`
    SkipIfEqual { x: usize, nn: u8 },
    /// `4xnn`
    SkipIfNotEqual { x: usize, nn: u8 },
    /// `5xy_`
    SkipIfRegistersEqual { x: usize, y: usize },
    /// `6xnn`
    Load { x: usize, nn: u8 },
    /// `7xnn`
    AddImmediate { x: usize, nn: u8 },
    /// `8xy_`
    Alu { op: AluOp, x: usize, y: usize },
    /// `9xy_`
    SkipIfRegistersNotEqual { x: usize, y: usize },
    /// `Annn`
    LoadIndex(u16),
    /// `Bnnn`
    JumpOffset(u16),
    /// `Cxnn`
    Random { x: usize, nn: u8 },
    /// `Dxyn`
    Draw { x: usize, y: usize, n: u8 },
    /// `Ex9E`
    SkipIfKeyPressed { x: usize },
    /// `ExA1`
    SkipIfKeyReleased { x: usize },
    /// `Fx07`
    ReadDelay { x: usize },
    /// `Fx0A`
    WaitForKey { x: usize },
    /// `Fx15`
    SetDelay { x: usize },
    /// `Fx18`
    SetSound { x: usize },
    /// `Fx1E`
    AddIndex { x: usize },
    /// `Fx29`
    FontAddress { x: usize },
    /// `Fx33`
    StoreBcd { x: usize },
    /// `Fx55`
    StoreRegisters { x: usize },
    /// `Fx65`
    LoadRegisters { x: usize },
    /// Any word outside the instruction set
    Unknown(u16),
}

impl Instruction {
    pub fn decode(word: u16) -> Self {
        let op = Opcode(word);
        let (x, y) = (op.x(), op.y());
        match op.family() {
            0x0 => match word {
                0x00E0 => Instruction::Clear,
                0x00EE => Instruction::Return,
                _ => Instruction::System(op.nnn()),
            },
            0x1 => Instruction::Jump(op.nnn()),
            0x2 => Instruction::Call(op.nnn()),
            0x3 => Instruction::SkipIfEqual { x, nn: op.nn() },
            0x4 => Instruction::SkipIfNotEqual { x, nn: op.nn() },
            0x5 => Instruction::SkipIfRegistersEqual { x, y },
            0x6 => Instruction::Load { x, nn: op.nn() },
            0x7 => Instruction::AddImmediate { x, nn: op.nn() },
            0x8 => {
                let alu = match op.n() {
                    0x0 => AluOp::Copy,
                    0x1 => AluOp::Or,
                    0x2 => AluOp::And,
                    0x3 => AluOp::Xor,
                    0x4 => AluOp::Add,
                    0x5 => AluOp::Sub,
                    0x6 => AluOp::ShiftRight,
                    0x7 => AluOp::SubReversed,
                    0xE => AluOp::ShiftLeft,
                    _ => return Instruction::Unknown(word),
                };
                Instruction::Alu { op: alu, x, y }
            }
            0x9 => Instruction::SkipIfRegistersNotEqual { x, y },
            0xA => Instruction::LoadIndex(op.nnn()),
            0xB => Instruction::JumpOffset(op.nnn()),
            0xC => Instruction::Random { x, nn: op.nn() },
            0xD => Instruction::Draw { x, y, n: op.n() },
            0xE => match op.nn() {
                0x9E => Instruction::SkipIfKeyPressed { x },
                0xA1 => Instruction::SkipIfKeyReleased { x },
                _ => Instruction::Unknown(word),
            },
            0xF => match op.nn() {
                0x07 => Instruction::ReadDelay { x },
                0x0A => Instruction::WaitForKey { x },
                0x15 => Instruction::SetDelay { x },
                0x18 => Instruction::SetSound { x },
                0x1E => Instruction::AddIndex { x },
                0x29 => Instruction::FontAddress { x },
                0x33 => Instruction::StoreBcd { x },
                0x55 => Instruction::StoreRegisters { x },
                0x65 => Instruction::LoadRegisters { x },
                _ => Instruction::Unknown(word),
            },
            _ => unreachable!("opcode family is a 4-bit value"),
        }
    }
}
