//! One running program and everything the window loop does to it.
//!
//! The loop in `main.rs` only translates window events into calls here, so
//! pausing, hotkeys and presentation can be tested without a display.

use crate::profiles::{Profile, ProfileStore};
use crate::save_state::{self, SlotStore};
use crate::ui_render;
use emu_chip8::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use emu_chip8::{Chip8Error, Chip8System, Snapshot};
use emu_core::graphics::ColorOps;
use emu_core::timing::TickAccumulator;
use emu_core::System;
use std::path::Path;
use std::time::Duration;

pub const SCALE: usize = 12;
pub const WIDTH: usize = DISPLAY_WIDTH * SCALE;
pub const HEIGHT: usize = DISPLAY_HEIGHT * SCALE;
/// Degrees of hue per frame in rainbow mode
const RAINBOW_STEP: f32 = 2.0;
/// How long a status message stays up, in frames
const STATUS_FRAMES: u32 = 120;

pub fn window_title(profile: &str, paused: bool) -> String {
    format!(
        "hemu8 | Profile: {}{}",
        profile,
        if paused { " [PAUSED]" } else { "" }
    )
}

pub struct Session {
    sys: Chip8System,
    rom_path: Option<String>,
    slots: Option<SlotStore>,
    profile: Profile,
    quick_save: Option<Snapshot>,
    slot: u8,
    paused: bool,
    /// Paused because the machine stopped, not by the user
    stopped: bool,
    hue: f32,
    status: Option<(String, u32)>,
    accumulator: TickAccumulator,
}

impl Session {
    pub fn new(profile: Profile) -> Self {
        Self {
            sys: Chip8System::with_config(profile.chip8_config()),
            rom_path: None,
            slots: None,
            profile,
            quick_save: None,
            slot: 1,
            paused: false,
            stopped: false,
            hue: 0.0,
            status: None,
            accumulator: TickAccumulator::default(),
        }
    }

    /// Mount `data` read from `path` and switch to `profile`. Save slots are
    /// looked up under `saves_dir`.
    pub fn open(
        &mut self,
        path: &str,
        data: &[u8],
        profile: Profile,
        saves_dir: &Path,
    ) -> Result<(), Chip8Error> {
        self.sys.mount("Program", data)?;
        self.sys.set_config(profile.chip8_config());
        self.profile = profile;
        self.slots = Some(SlotStore::open(saves_dir, data));
        self.rom_path = Some(path.to_string());
        self.quick_save = None;
        self.paused = false;
        self.stopped = false;
        self.hue = 0.0;
        self.accumulator.reset();
        Ok(())
    }

    pub fn loaded(&self) -> bool {
        self.rom_path.is_some()
    }

    pub fn system(&self) -> &Chip8System {
        &self.sys
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn title(&self) -> String {
        window_title(&self.profile.name, self.paused)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|(message, _)| message.as_str())
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        println!("{}", message);
        self.status = Some((message, STATUS_FRAMES));
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.stopped = false;
        if !self.paused {
            self.accumulator.reset();
        }
    }

    /// The machine was put back into a runnable state; undo a pause caused by a fault.
    fn recover(&mut self) {
        if self.stopped {
            self.stopped = false;
            self.paused = false;
            self.accumulator.reset();
        }
    }

    pub fn reset(&mut self) {
        self.sys.reset();
        self.recover();
        self.notify("Reset");
    }

    pub fn quick_save(&mut self) {
        self.quick_save = Some(self.sys.capture());
        self.notify("Quick saved");
    }

    pub fn quick_load(&mut self) {
        if let Some(snapshot) = self.quick_save.clone() {
            self.sys.restore(&snapshot);
            self.recover();
            self.notify("Quick loaded");
        }
    }

    pub fn save_slot(&mut self) {
        let state = self.sys.save_state();
        let slot = self.slot;
        let result = match self.slots.as_mut() {
            Some(slots) => slots.save_slot(slot, &state),
            None => return,
        };
        match result {
            Ok(()) => self.notify(format!("Saved slot {}", slot)),
            Err(e) => self.notify(format!("Save failed: {}", e)),
        }
    }

    pub fn next_slot(&mut self) {
        self.slot = save_state::next_slot(self.slot);
        let slot = self.slot;
        let used = self.slots.as_ref().map_or(false, |s| s.has_slot(slot));
        self.notify(format!(
            "Slot {}{}",
            slot,
            if used { "" } else { " (empty)" }
        ));
    }

    pub fn load_slot(&mut self) {
        let slot = self.slot;
        let state = match self.slots.as_ref().map(|s| s.load_slot(slot)) {
            Some(Ok(state)) => state,
            Some(Err(e)) => return self.notify(format!("Load failed: {}", e)),
            None => return,
        };
        match self.sys.load_state(&state) {
            Ok(()) => {
                self.recover();
                self.notify(format!("Loaded slot {}", slot));
            }
            Err(e) => self.notify(format!("Load failed: {}", e)),
        }
    }

    /// Flip the favourite mark of the open ROM in `store`
    pub fn toggle_favorite(&mut self, store: &mut ProfileStore) {
        let Some(path) = self.rom_path.clone() else {
            return;
        };
        let favorite = store.toggle_favorite(&path);
        self.notify(if favorite {
            "Added to favorites"
        } else {
            "Removed from favorites"
        });
    }

    pub fn set_keys(&mut self, pressed: &[bool; 16]) {
        for (key, &down) in pressed.iter().enumerate() {
            self.sys.set_key(key as u8, down);
        }
    }

    /// Run the ticks due after `elapsed` of wall-clock time. Nothing runs while paused.
    pub fn advance(&mut self, elapsed: Duration) {
        if !self.loaded() || self.paused {
            return;
        }
        for _ in 0..self.accumulator.advance(elapsed) {
            if let Err(e) = self.sys.run_tick() {
                self.paused = true;
                self.stopped = true;
                self.notify(format!("Stopped: {}", e));
                break;
            }
        }
    }

    /// Whether the buzzer should sound this frame
    pub fn sound_on(&self) -> bool {
        self.profile.audio_enabled && !self.paused && self.sys.sound_active()
    }

    /// Window contents for this frame. The machine image is recomposited
    /// every frame, paused or not.
    pub fn present(&mut self, show_help: bool) -> Vec<u32> {
        let mut buffer = if self.loaded() {
            if self.profile.rainbow_enabled {
                self.hue = (self.hue + RAINBOW_STEP) % 360.0;
                self.sys.set_foreground(ColorOps::from_hue(self.hue));
            }
            let frame = self.sys.render();
            ui_render::upscale(&frame.pixels, DISPLAY_WIDTH, DISPLAY_HEIGHT, SCALE)
        } else {
            ui_render::create_splash_screen(WIDTH, HEIGHT)
        };
        if show_help {
            buffer = ui_render::create_help_overlay(WIDTH, HEIGHT);
        }

        if let Some((message, frames)) = self.status.as_mut() {
            ui_render::draw_status(&mut buffer, WIDTH, HEIGHT, message);
            *frames -= 1;
            if *frames == 0 {
                self.status = None;
            }
        }
        buffer
    }
}
