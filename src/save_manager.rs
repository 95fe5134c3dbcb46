use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app_config::SaveConfig;
use crate::errors::SaveError;
use crate::scenario::SceneId;

// @module: Save slots for playback progress

/// Subtitle text size preference
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Player settings captured with a save
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettings {
    pub bgm_volume: f32,
    pub voice_volume: f32,
    pub se_volume: f32,
    pub subtitles_enabled: bool,
    #[serde(default)]
    pub subtitle_size: SubtitleSize,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            bgm_volume: 0.5,
            voice_volume: 1.0,
            se_volume: 1.0,
            subtitles_enabled: true,
            subtitle_size: SubtitleSize::Medium,
        }
    }
}

// @struct: One saved position
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    // @field: Saved scene
    pub scene_id: SceneId,

    // @field: When it was saved
    pub timestamp: DateTime<Utc>,

    // @field: Thumbnail image path
    #[serde(default)]
    pub thumbnail: String,

    // @field: Player settings
    #[serde(default)]
    pub settings: SaveSettings,
}

impl SaveData {
    /// Save data stamped with the current time
    pub fn new(scene_id: SceneId, thumbnail: &str, settings: SaveSettings) -> Self {
        Self {
            scene_id,
            timestamp: Utc::now(),
            thumbnail: thumbnail.to_string(),
            settings,
        }
    }
}

/// A slot and its contents, `None` when empty
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSlot {
    pub slot_id: usize,
    pub data: Option<SaveData>,
}

/// Fixed set of numbered save slots (1-based). Storage is left to the host:
/// `to_json`/`from_json` give it a serialized form to keep wherever it likes.
#[derive(Debug, Clone)]
pub struct SaveManager {
    slots: BTreeMap<usize, SaveData>,
    max_slots: usize,
}

impl SaveManager {
    pub fn new(max_slots: usize) -> Self {
        Self {
            slots: BTreeMap::new(),
            max_slots,
        }
    }

    /// Empty manager sized by the `saves` configuration section
    pub fn from_config(config: &SaveConfig) -> Self {
        Self::new(config.max_slots)
    }

    fn check_slot(&self, slot: usize) -> Result<(), SaveError> {
        if slot < 1 || slot > self.max_slots {
            return Err(SaveError::InvalidSlot {
                slot,
                max: self.max_slots,
            });
        }
        Ok(())
    }

    /// Store data in a slot, replacing what was there
    pub fn save(&mut self, slot: usize, data: SaveData) -> Result<(), SaveError> {
        self.check_slot(slot)?;
        info!("Saved scene {} to slot {}", data.scene_id, slot);
        self.slots.insert(slot, data);
        Ok(())
    }

    /// Contents of a slot
    pub fn load(&self, slot: usize) -> Result<Option<&SaveData>, SaveError> {
        self.check_slot(slot)?;
        Ok(self.slots.get(&slot))
    }

    /// Empty a slot
    pub fn delete(&mut self, slot: usize) -> Result<(), SaveError> {
        self.check_slot(slot)?;
        if self.slots.remove(&slot).is_some() {
            info!("Deleted slot {}", slot);
        }
        Ok(())
    }

    /// Every slot in order, empty ones included
    pub fn list(&self) -> Vec<SaveSlot> {
        (1..=self.max_slots)
            .map(|slot_id| SaveSlot {
                slot_id,
                data: self.slots.get(&slot_id).cloned(),
            })
            .collect()
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Serialize all filled slots as `{"slot1": {...}, ...}`
    pub fn to_json(&self) -> Result<String, SaveError> {
        let map: BTreeMap<String, &SaveData> = self
            .slots
            .iter()
            .map(|(slot, data)| (format!("slot{}", slot), data))
            .collect();
        Ok(serde_json::to_string_pretty(&map)?)
    }

    /// Rebuild from `to_json` output. Entries outside the slot range are skipped.
    pub fn from_json(content: &str, max_slots: usize) -> Result<Self, SaveError> {
        let map: BTreeMap<String, SaveData> = serde_json::from_str(content)?;
        let mut manager = Self::new(max_slots);
        for (key, data) in map {
            match key.strip_prefix("slot").and_then(|n| n.parse::<usize>().ok()) {
                Some(slot) if slot >= 1 && slot <= max_slots => {
                    manager.slots.insert(slot, data);
                }
                _ => debug!("Skipping save entry '{}'", key),
            }
        }
        Ok(manager)
    }
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::from_config(&SaveConfig::default())
    }
}
