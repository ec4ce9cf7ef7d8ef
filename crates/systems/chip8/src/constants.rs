//! Machine dimensions and defaults.

/// Addressable memory in bytes
pub const MEMORY_SIZE: usize = 4096;
/// Mask applied to every memory address (12-bit address space)
pub const ADDRESS_MASK: u16 = 0x0FFF;
/// Programs are loaded here and execution starts here
pub const PROGRAM_START: u16 = 0x200;
/// Largest program that fits above the reserved area
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

pub const REGISTER_COUNT: usize = 16;
/// VF doubles as carry, borrow and collision flag
pub const FLAG_REGISTER: usize = 0xF;
pub const KEY_COUNT: usize = 16;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_PIXELS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// Address of the built-in hexadecimal glyphs
pub const FONT_START: u16 = 0x000;
/// Bytes per glyph (8x5 sprite)
pub const FONT_GLYPH_SIZE: u16 = 5;

/// Timer decrement rate; also the simulation tick rate
pub const TIMER_HZ: u32 = 60;
/// Instructions per second when no profile overrides it
pub const DEFAULT_IPS: u32 = 700;

/// Per-frame intensity multiplier for unlit pixels when ghosting is enabled
pub const DEFAULT_DECAY_FACTOR: f32 = 0.90;
/// Intensities at or below this are not drawn
pub const INTENSITY_EPSILON: f32 = 0.01;
