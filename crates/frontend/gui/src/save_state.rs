use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Save slots per program
pub const MAX_SAVE_SLOTS: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("slot must be between 1 and 5, got {0}")]
    InvalidSlot(u8),
    #[error("no save data in slot {0}")]
    Empty(u8),
    #[error("save state in slot {0} was created with a different program")]
    HashMismatch(u8),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSlot {
    /// Base64 of the JSON save state
    pub data: String,
    pub timestamp: u64,
    pub rom_hash: String,
}

/// On-disk slots for one program, stored under `<dir>/<sha256>/states.json`.
#[derive(Debug, Clone)]
pub struct SlotStore {
    path: PathBuf,
    rom_hash: String,
    slots: BTreeMap<u8, SaveSlot>,
}

/// SHA-256 of the program bytes as lowercase hex
pub fn rom_hash(rom_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rom_data);
    format!("{:x}", hasher.finalize())
}

/// Slot after `slot`, wrapping back to 1
pub fn next_slot(slot: u8) -> u8 {
    if slot >= MAX_SAVE_SLOTS {
        1
    } else {
        slot + 1
    }
}

/// `saves/` next to the executable
pub fn default_saves_dir() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("saves");
    path
}

impl SlotStore {
    /// Open the slots for `rom_data`; a missing or unreadable file gives empty slots.
    pub fn open(saves_dir: &Path, rom_data: &[u8]) -> Self {
        let rom_hash = rom_hash(rom_data);
        let path = saves_dir.join(&rom_hash).join("states.json");
        let slots = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Failed to parse {}: {}. Using empty saves.", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            rom_hash,
            slots,
        }
    }

    pub fn rom_hash(&self) -> &str {
        &self.rom_hash
    }

    pub fn has_slot(&self, slot: u8) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Store `state` in `slot` and write the file
    pub fn save_slot(&mut self, slot: u8, state: &serde_json::Value) -> Result<(), SlotError> {
        check_slot(slot)?;
        let data = BASE64.encode(serde_json::to_vec(state)?);
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.slots.insert(
            slot,
            SaveSlot {
                data,
                timestamp,
                rom_hash: self.rom_hash.clone(),
            },
        );

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.slots)?)?;
        Ok(())
    }

    /// Decode the state in `slot`, refusing states from another program
    pub fn load_slot(&self, slot: u8) -> Result<serde_json::Value, SlotError> {
        check_slot(slot)?;
        let save = self.slots.get(&slot).ok_or(SlotError::Empty(slot))?;
        if save.rom_hash != self.rom_hash {
            return Err(SlotError::HashMismatch(slot));
        }
        let bytes = BASE64.decode(&save.data)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn check_slot(slot: u8) -> Result<(), SlotError> {
    if (1..=MAX_SAVE_SLOTS).contains(&slot) {
        Ok(())
    } else {
        Err(SlotError::InvalidSlot(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_rom_hash() {
        let hash = rom_hash(&[0x00, 0xE0]);
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, rom_hash(&[0x00, 0xE0]));
        assert_ne!(hash, rom_hash(&[0x00, 0xEE]));
    }

    #[test]
    fn test_next_slot_wraps() {
        assert_eq!(next_slot(1), 2);
        assert_eq!(next_slot(4), 5);
        assert_eq!(next_slot(5), 1);
    }

    #[test]
    fn test_slot_range() {
        let mut store = SlotStore::open(&temp_dir("hemu8_test_slot_range"), &[0x12, 0x00]);
        assert!(matches!(
            store.save_slot(0, &json!({})),
            Err(SlotError::InvalidSlot(0))
        ));
        assert!(matches!(store.load_slot(6), Err(SlotError::InvalidSlot(6))));
        assert!(matches!(store.load_slot(3), Err(SlotError::Empty(3))));
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = temp_dir("hemu8_test_slots");
        let rom = [0x60, 0x05, 0x12, 0x02];
        let state = json!({"version": 1, "system": "chip8", "snapshot": {"pc": 514}});

        let mut store = SlotStore::open(&dir, &rom);
        store.save_slot(2, &state).unwrap();
        assert!(store.has_slot(2));
        assert!(!store.has_slot(1));

        let reopened = SlotStore::open(&dir, &rom);
        assert_eq!(reopened.load_slot(2).unwrap(), state);

        // Another program does not see these slots
        let other = SlotStore::open(&dir, &[0x00, 0xE0]);
        assert!(!other.has_slot(2));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_hash_mismatch_rejected() {
        let dir = temp_dir("hemu8_test_slot_hash");
        let mut store = SlotStore::open(&dir, &[0x00, 0xE0]);
        store.save_slot(1, &json!({"a": 1})).unwrap();
        store.slots.get_mut(&1).unwrap().rom_hash = rom_hash(b"something else");

        assert!(matches!(store.load_slot(1), Err(SlotError::HashMismatch(1))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
