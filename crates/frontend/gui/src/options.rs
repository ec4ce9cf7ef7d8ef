//! Command line for `hemu8`

use crate::library::DEFAULT_LIBRARY_DIR;
use crate::profiles::Profile;
use clap::{Args, Parser, Subcommand};
use emu_chip8::constants::DEFAULT_IPS;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hemu8",
    about = "CHIP-8 interpreter with phosphor ghosting",
    args_conflicts_with_subcommands = true
)]
pub struct Options {
    /// Program to run (.ch8); the last one played when omitted
    pub rom: Option<String>,

    /// Run the program with this profile and remember the choice
    #[arg(long)]
    pub profile: Option<String>,

    /// Core log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Profile store commands; each acts and exits without opening a window
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List all profiles
    Profiles,
    /// List the ROM library, favourites first
    Library {
        #[arg(default_value = DEFAULT_LIBRARY_DIR)]
        dir: PathBuf,
    },
    /// Toggle a ROM's favourite mark
    Favorite { rom: String },
    /// Delete a profile; its ROMs fall back to Default
    DeleteProfile { name: String },
    /// Create or update a profile
    SaveProfile(ProfileArgs),
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct ProfileArgs {
    pub name: String,

    /// Background colour as #rrggbb
    #[arg(long, default_value = "#0a140a")]
    pub bg: String,

    /// Foreground colour as #rrggbb
    #[arg(long, default_value = "#00ff00")]
    pub fg: String,

    /// Instructions per second (clamped to 100..=3000)
    #[arg(long, default_value_t = DEFAULT_IPS)]
    pub ips: u32,

    #[arg(long, default_value_t = false)]
    pub no_decay: bool,

    #[arg(long, default_value_t = false)]
    pub no_audio: bool,

    /// Cycle the foreground colour through the hue wheel
    #[arg(long, default_value_t = false)]
    pub rainbow: bool,
}

impl ProfileArgs {
    pub fn to_profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            bg_color: self.bg.clone(),
            fg_color: self.fg.clone(),
            decay_enabled: !self.no_decay,
            ips: self.ips,
            audio_enabled: !self.no_audio,
            rainbow_enabled: self.rainbow,
        }
    }
}
