//! CHIP-8 system implementation
//!
//! The [`Machine`] is the interpreter proper and knows nothing about wall
//! clocks, colours or windows. [`Chip8System`] wraps it for frontends: it
//! owns the mounted program, paces the machine in 1/60 s ticks, runs the
//! [`Compositor`] and turns intensities into an ARGB [`Frame`].

pub mod compositor;
pub mod constants;
mod error;
pub mod font;
pub mod framebuffer;
pub mod instruction;
mod machine;
mod snapshot;

pub use compositor::Compositor;
pub use error::{MachineError, SnapshotError};
pub use framebuffer::FrameBuffer;
pub use instruction::{AluOp, Instruction, Opcode};
pub use machine::Machine;
pub use snapshot::Snapshot;

use constants::{DEFAULT_DECAY_FACTOR, DEFAULT_IPS, DISPLAY_HEIGHT, DISPLAY_WIDTH, TIMER_HZ};
use emu_core::graphics::ColorOps;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::{types::Frame, MountPointInfo, System};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

const MOUNT_POINT: &str = "Program";
const SAVE_STATE_VERSION: u64 = 1;
const SYSTEM_ID: &str = "chip8";

/// Runtime settings a frontend can change between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chip8Config {
    /// Instructions per second; each tick runs `ips / 60` of them
    pub ips: u32,
    pub decay_enabled: bool,
    pub decay_factor: f32,
    /// ARGB colour for intensity 0.0
    pub background: u32,
    /// ARGB colour for intensity 1.0
    pub foreground: u32,
}

impl Default for Chip8Config {
    fn default() -> Self {
        Self {
            ips: DEFAULT_IPS,
            decay_enabled: true,
            decay_factor: DEFAULT_DECAY_FACTOR,
            background: 0xFF0A140A,
            foreground: 0xFF00FF00,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Chip8Error {
    #[error(transparent)]
    Machine(#[from] MachineError),
    #[error("No program loaded")]
    NoProgram,
    #[error("Invalid mount point: {0}")]
    InvalidMountPoint(String),
}

pub struct Chip8System {
    machine: Machine,
    compositor: Compositor,
    config: Chip8Config,
    program: Option<Vec<u8>>,
    seed: Option<u64>,
}

impl Default for Chip8System {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8System {
    pub fn new() -> Self {
        Self::build(Chip8Config::default(), None)
    }

    /// Deterministic `Cxnn` results, also across resets
    pub fn with_seed(seed: u64) -> Self {
        Self::build(Chip8Config::default(), Some(seed))
    }

    pub fn with_config(config: Chip8Config) -> Self {
        Self::build(config, None)
    }

    fn build(config: Chip8Config, seed: Option<u64>) -> Self {
        Self {
            machine: Self::power_on(seed),
            compositor: Compositor::new(config.decay_factor),
            config,
            program: None,
            seed,
        }
    }

    fn power_on(seed: Option<u64>) -> Machine {
        match seed {
            Some(seed) => Machine::with_seed(seed),
            None => Machine::new(),
        }
    }

    pub fn config(&self) -> &Chip8Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Chip8Config) {
        self.compositor.set_decay_factor(config.decay_factor);
        self.config = config;
    }

    /// Used by rainbow mode, which recolours every frame
    pub fn set_foreground(&mut self, color: u32) {
        self.config.foreground = color;
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.machine.set_key(key, pressed);
    }

    pub fn sound_active(&self) -> bool {
        self.machine.sound_active()
    }

    pub fn capture(&self) -> Snapshot {
        self.machine.capture()
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.machine.restore(snapshot);
    }

    /// Instructions executed per tick at the configured rate
    pub fn steps_per_tick(&self) -> u32 {
        self.config.ips / TIMER_HZ
    }

    /// Run one 1/60 s slice: `ips / 60` instructions, then one timer decrement.
    pub fn run_tick(&mut self) -> Result<(), Chip8Error> {
        if self.program.is_none() {
            return Err(Chip8Error::NoProgram);
        }
        for _ in 0..self.steps_per_tick() {
            self.machine.step()?;
        }
        self.machine.tick_timers();
        Ok(())
    }

    /// Composite the current framebuffer and map intensities to colours.
    pub fn render(&mut self) -> Frame {
        let Chip8Config {
            decay_enabled,
            background,
            foreground,
            ..
        } = self.config;

        let mut frame = Frame::new(DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32);
        let intensities = self
            .compositor
            .composite(self.machine.framebuffer(), decay_enabled);
        for (pixel, &intensity) in frame.pixels.iter_mut().zip(intensities) {
            *pixel = if Compositor::is_visible(intensity) {
                ColorOps::lerp(background, foreground, intensity)
            } else {
                background
            };
        }
        frame
    }
}

impl System for Chip8System {
    type Error = Chip8Error;

    fn reset(&mut self) {
        self.machine = Self::power_on(self.seed);
        self.compositor.clear();
        if let Some(program) = &self.program {
            if let Err(e) = self.machine.load(program) {
                log(LogCategory::Memory, LogLevel::Error, || {
                    format!("reload after reset failed: {}", e)
                });
            }
        }
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        self.run_tick()?;
        Ok(self.render())
    }

    fn save_state(&self) -> serde_json::Value {
        serde_json::json!({
            "version": SAVE_STATE_VERSION,
            "system": SYSTEM_ID,
            "snapshot": self.machine.capture(),
        })
    }

    fn load_state(&mut self, v: &serde_json::Value) -> Result<(), serde_json::Error> {
        let version = v.get("version").and_then(|v| v.as_u64());
        if version != Some(SAVE_STATE_VERSION) {
            return Err(serde_json::Error::custom(format!(
                "unsupported save state version {:?}",
                version
            )));
        }
        let system = v.get("system").and_then(|v| v.as_str());
        if system != Some(SYSTEM_ID) {
            return Err(serde_json::Error::custom(format!(
                "save state belongs to {:?}, not {}",
                system, SYSTEM_ID
            )));
        }
        let snapshot = v
            .get("snapshot")
            .ok_or_else(|| serde_json::Error::missing_field("snapshot"))?;
        let snapshot = Snapshot::deserialize(snapshot)?;
        self.machine.restore(&snapshot);
        Ok(())
    }

    fn supports_save_states(&self) -> bool {
        true
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        vec![MountPointInfo {
            id: MOUNT_POINT.to_string(),
            name: "Program ROM".to_string(),
            extensions: vec!["ch8".to_string()],
            required: true,
        }]
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        if mount_point_id != MOUNT_POINT {
            return Err(Chip8Error::InvalidMountPoint(mount_point_id.to_string()));
        }

        let mut machine = Self::power_on(self.seed);
        machine.load(data)?;
        self.machine = machine;
        self.compositor.clear();
        self.program = Some(data.to_vec());
        Ok(())
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        if mount_point_id != MOUNT_POINT {
            return Err(Chip8Error::InvalidMountPoint(mount_point_id.to_string()));
        }

        self.program = None;
        self.reset();
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        mount_point_id == MOUNT_POINT && self.program.is_some()
    }
}
