use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::LoadError;

// @module: Scenario document model

/// Scene identifier as written in the scenario document
pub type SceneId = u32;

// @struct: Whole scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    // @field: Work title
    pub title: String,

    // @field: Author name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    // @field: Document version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    // @field: Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // @field: Ordered scenes
    #[serde(default)]
    pub scenes: Vec<Scene>,

    // @field: Optional catalogue metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ScenarioMetadata>,
}

/// Catalogue metadata attached to a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetadata {
    /// Declared scene count
    #[serde(default)]
    pub total_scenes: usize,

    /// Declared duration estimate in ms
    #[serde(default)]
    pub estimated_duration: u64,

    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Audience rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

/// Background media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

// @struct: One timed unit of playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    // @field: Scene id
    pub id: SceneId,

    // @field: Background media kind
    #[serde(rename = "type", default)]
    pub media_type: MediaType,

    // @field: Background media path
    #[serde(default)]
    pub source: String,

    // @field: Nominal duration in ms
    #[serde(rename = "duration", default)]
    pub duration_ms: u64,

    // @field: Continuous audio tracks
    #[serde(default)]
    pub audio: SceneAudio,

    // @field: Subtitles in declaration order
    #[serde(default)]
    pub subtitles: Vec<Subtitle>,

    // @field: Where to go next
    #[serde(rename = "transitions", alias = "transition", default)]
    pub transition: Transition,
}

/// Optional paths for the continuous tracks of a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SceneAudio {
    /// Narration track
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Background music
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm: Option<String>,

    /// Sound effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub se: Option<String>,
}

// @struct: One line of dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    // @field: Speaker name
    #[serde(default)]
    pub speaker: String,

    // @field: Line text
    #[serde(default)]
    pub text: String,

    // @field: Start offset in ms from scene start
    #[serde(rename = "start")]
    pub start_ms: u64,

    // @field: End offset in ms from scene start
    #[serde(rename = "end")]
    pub end_ms: u64,

    // @field: Voice clip bound to this line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl Subtitle {
    /// Creates a subtitle line without a voice clip
    pub fn new(speaker: &str, text: &str, start_ms: u64, end_ms: u64) -> Self {
        Self {
            speaker: speaker.to_string(),
            text: text.to_string(),
            start_ms,
            end_ms,
            voice: None,
        }
    }

    /// Attaches a voice clip path
    pub fn with_voice(mut self, voice: &str) -> Self {
        self.voice = Some(voice.to_string());
        self
    }

    /// Whether the closed interval [start, end] contains `elapsed_ms`
    pub fn contains(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.start_ms && elapsed_ms <= self.end_ms
    }
}

impl fmt::Display for Subtitle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.speaker.is_empty() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{}: {}", self.speaker, self.text)
        }
    }
}

/// Visual effect used when leaving a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEffect {
    Fade,
    Slide,
    #[default]
    None,
}

/// Outgoing edge of a scene. `next_scene_id == None` marks a terminal scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Next scene id
    #[serde(default)]
    pub next_scene_id: Option<SceneId>,

    /// Effect applied on the way out
    #[serde(default)]
    pub effect: TransitionEffect,
}

impl Scene {
    /// Creates an image scene with no audio or subtitles
    pub fn new(id: SceneId, source: &str, duration_ms: u64, next_scene_id: Option<SceneId>) -> Self {
        Self {
            id,
            media_type: MediaType::Image,
            source: source.to_string(),
            duration_ms,
            audio: SceneAudio::default(),
            subtitles: Vec::new(),
            transition: Transition {
                next_scene_id,
                effect: TransitionEffect::None,
            },
        }
    }

    /// Whether this scene ends the story
    pub fn is_terminal(&self) -> bool {
        self.transition.next_scene_id.is_none()
    }
}

impl ScenarioDocument {
    /// Creates a document from a title and scenes
    pub fn new(title: &str, scenes: Vec<Scene>) -> Self {
        Self {
            title: title.to_string(),
            author: None,
            version: None,
            description: None,
            scenes,
            metadata: None,
        }
    }

    /// Parse a scenario from its JSON text and validate it
    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        let document: ScenarioDocument =
            serde_json::from_str(content).map_err(|e| LoadError::Malformed(e.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Read, parse and validate a scenario file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoadError::Io(format!("{}: {}", path.display(), e)))?;
        debug!("Read scenario file {} ({} bytes)", path.display(), content.len());
        Self::from_json_str(&content)
    }

    /// Check the structural invariants the engine relies on
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.scenes.is_empty() {
            return Err(LoadError::EmptyScenario);
        }

        let mut seen = HashSet::with_capacity(self.scenes.len());
        for scene in &self.scenes {
            if !seen.insert(scene.id) {
                return Err(LoadError::DuplicateSceneId(scene.id));
            }

            for (index, subtitle) in scene.subtitles.iter().enumerate() {
                if subtitle.start_ms > subtitle.end_ms {
                    return Err(LoadError::InvalidSubtitle {
                        scene_id: scene.id,
                        index,
                        start_ms: subtitle.start_ms,
                        end_ms: subtitle.end_ms,
                    });
                }
            }
        }

        if let Some(metadata) = &self.metadata {
            if metadata.total_scenes != 0 && metadata.total_scenes != self.scenes.len() {
                warn!(
                    "Scenario metadata declares {} scenes but document has {}",
                    metadata.total_scenes,
                    self.scenes.len()
                );
            }
        }

        Ok(())
    }

    /// Find a scene by id
    pub fn find_scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Number of scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Sum of nominal scene durations
    pub fn total_duration_ms(&self) -> u64 {
        self.scenes.iter().map(|s| s.duration_ms).sum()
    }

    /// Whether scene ids are exactly 1..=N in document order
    pub fn has_dense_ids(&self) -> bool {
        self.scenes
            .iter()
            .enumerate()
            .all(|(i, s)| s.id as usize == i + 1)
    }
}

/// Scene id to document position lookup, built once per loaded document
#[derive(Debug, Clone, Default)]
pub struct SceneIndex {
    positions: HashMap<SceneId, usize>,
}

impl SceneIndex {
    /// Build the lookup table for a document
    pub fn build(document: &ScenarioDocument) -> Self {
        let positions = document
            .scenes
            .iter()
            .enumerate()
            .map(|(pos, scene)| (scene.id, pos))
            .collect();
        Self { positions }
    }

    /// Document position of a scene id
    pub fn position(&self, id: SceneId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
