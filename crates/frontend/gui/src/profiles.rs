//! Display/speed profiles, ROM assignments and favourites.
//!
//! Everything lives in one `profiles.json` next to the executable. A
//! protected `Default` profile always exists; ROMs without an assignment, or
//! whose profile was deleted, use it.

use emu_chip8::{constants::DEFAULT_IPS, Chip8Config};
use emu_core::graphics::ColorOps;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE: &str = "Default";
/// Speed range offered by the profile editor
pub const MIN_IPS: u32 = 100;
pub const MAX_IPS: u32 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("the Default profile cannot be deleted")]
    Protected,
    #[error("no profile named {0:?}")]
    Unknown(String),
    #[error("profile name must not be empty")]
    EmptyName,
    #[error("invalid colour {0:?}, expected #rrggbb")]
    InvalidColor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub bg_color: String,
    pub fg_color: String,
    /// Phosphor ghosting
    pub decay_enabled: bool,
    pub ips: u32,
    pub audio_enabled: bool,
    #[serde(default)]
    pub rainbow_enabled: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE.to_string(),
            bg_color: "#0a140a".to_string(),
            fg_color: "#00ff00".to_string(),
            decay_enabled: true,
            ips: DEFAULT_IPS,
            audio_enabled: true,
            rainbow_enabled: false,
        }
    }
}

impl Profile {
    /// Named copy of the default settings, as the editor starts out
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Machine settings for this profile. Colours that fail to parse fall back to the defaults.
    pub fn chip8_config(&self) -> Chip8Config {
        let defaults = Chip8Config::default();
        Chip8Config {
            ips: self.ips,
            decay_enabled: self.decay_enabled,
            background: ColorOps::parse_hex(&self.bg_color).unwrap_or(defaults.background),
            foreground: ColorOps::parse_hex(&self.fg_color).unwrap_or(defaults.foreground),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
    /// ROM path -> profile name
    #[serde(default)]
    rom_profiles: BTreeMap<String, String>,
    #[serde(default)]
    favorites: BTreeSet<String>,
    #[serde(default)]
    pub last_rom_path: Option<String>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self {
            profiles: vec![Profile::default()],
            rom_profiles: BTreeMap::new(),
            favorites: BTreeSet::new(),
            last_rom_path: None,
            path: None,
        }
    }
}

impl ProfileStore {
    /// Get the store path relative to the executable
    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("profiles.json");
        path
    }

    /// Load the store next to the executable
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, falling back to a fresh store on error
    pub fn load_from(path: &Path) -> Self {
        let mut store = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(store) => store,
                Err(e) => {
                    log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            // Not created yet
            Err(_) => Self::default(),
        };
        store.path = Some(path.to_path_buf());
        store.ensure_default();
        store
    }

    /// Write the store back to where it was loaded from
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.path.clone().unwrap_or_else(Self::config_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn ensure_default(&mut self) {
        if self.profile(DEFAULT_PROFILE).is_none() {
            self.profiles.insert(0, Profile::default());
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Insert or update by name. IPS is clamped to the editor's range.
    pub fn save_profile(&mut self, mut profile: Profile) -> Result<(), ProfileError> {
        profile.name = profile.name.trim().to_string();
        if profile.name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        for color in [&profile.bg_color, &profile.fg_color] {
            if ColorOps::parse_hex(color).is_none() {
                return Err(ProfileError::InvalidColor(color.clone()));
            }
        }
        profile.ips = profile.ips.clamp(MIN_IPS, MAX_IPS);

        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    /// Remove a profile; ROMs assigned to it go back to `Default`.
    pub fn delete_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        if name == DEFAULT_PROFILE {
            return Err(ProfileError::Protected);
        }
        let before = self.profiles.len();
        self.profiles.retain(|p| p.name != name);
        if self.profiles.len() == before {
            return Err(ProfileError::Unknown(name.to_string()));
        }
        for assigned in self.rom_profiles.values_mut() {
            if assigned == name {
                *assigned = DEFAULT_PROFILE.to_string();
            }
        }
        Ok(())
    }

    pub fn assign_profile(&mut self, rom_path: &str, name: &str) -> Result<(), ProfileError> {
        if self.profile(name).is_none() {
            return Err(ProfileError::Unknown(name.to_string()));
        }
        self.rom_profiles
            .insert(rom_path.to_string(), name.to_string());
        Ok(())
    }

    /// The profile a ROM runs with; `Default` when unassigned
    pub fn profile_for_rom(&self, rom_path: &str) -> Profile {
        self.rom_profiles
            .get(rom_path)
            .and_then(|name| self.profile(name))
            .or_else(|| self.profile(DEFAULT_PROFILE))
            .cloned()
            .unwrap_or_default()
    }

    /// Flip a ROM's favourite mark; returns whether it is now a favourite
    pub fn toggle_favorite(&mut self, rom_path: &str) -> bool {
        if self.favorites.remove(rom_path) {
            false
        } else {
            self.favorites.insert(rom_path.to_string());
            true
        }
    }

    pub fn is_favorite(&self, rom_path: &str) -> bool {
        self.favorites.contains(rom_path)
    }

    pub fn favorites(&self) -> impl Iterator<Item = &str> {
        self.favorites.iter().map(String::as_str)
    }
}
