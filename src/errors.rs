/*!
 * Error types for the novelplay engine.
 *
 * Only document-level and navigation-level errors cross the engine
 * boundary. Media errors are defined here so backends and resolvers can
 * report them, but the engine absorbs them and keeps playing.
 */

use thiserror::Error;

use crate::scenario::SceneId;

/// Errors that can occur while loading a scenario document
#[derive(Error, Debug)]
pub enum LoadError {
    /// The document has no scenes to play
    #[error("Scenario contains no scenes")]
    EmptyScenario,

    /// The document could not be parsed
    #[error("Malformed scenario: {0}")]
    Malformed(String),

    /// Two scenes share the same id
    #[error("Duplicate scene id: {0}")]
    DuplicateSceneId(SceneId),

    /// A subtitle ends before it starts
    #[error("Invalid subtitle interval in scene {scene_id} (line {index}): start {start_ms}ms > end {end_ms}ms")]
    InvalidSubtitle {
        /// Scene holding the subtitle
        scene_id: SceneId,
        /// Declaration index of the subtitle within the scene
        index: usize,
        /// Start offset in ms
        start_ms: u64,
        /// End offset in ms
        end_ms: u64,
    },

    /// The document file could not be read
    #[error("Failed to read scenario: {0}")]
    Io(String),
}

/// Errors that can occur while moving between scenes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// No scenario has been loaded yet
    #[error("Scenario data not loaded")]
    NotLoaded,

    /// The referenced scene id is absent from the document
    #[error("Scene {0} not found")]
    SceneNotFound(SceneId),
}

/// Media-level failures. Logged and absorbed, never propagated by the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    /// The asset could not be loaded or decoded
    #[error("Failed to load media '{source_path}': {reason}")]
    Load {
        /// Source that failed
        source_path: String,
        /// Backend supplied reason
        reason: String,
    },

    /// Playback was rejected (autoplay policy, decode failure)
    #[error("Playback rejected for '{source_path}': {reason}")]
    Play {
        /// Source that failed
        source_path: String,
        /// Backend supplied reason
        reason: String,
    },

    /// The resolver could not produce any source for the path
    #[error("Unresolvable asset path: '{0}'")]
    Unresolvable(String),
}

/// Errors that can occur when working with save slots
#[derive(Error, Debug)]
pub enum SaveError {
    /// Slot id outside 1..=max
    #[error("Invalid slot ID: {slot} (expected 1..={max})")]
    InvalidSlot {
        /// Requested slot
        slot: usize,
        /// Number of available slots
        max: usize,
    },

    /// Save data could not be (de)serialized
    #[error("Save serialization error: {0}")]
    Serialization(String),
}

/// Main error type that wraps all other errors
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Error loading the scenario document
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Error navigating between scenes
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Error with save slots
    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for PlayerError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for PlayerError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
