//! Ошибки ядра multihitbox
//!
//! - `ProfileError` — битый профиль (ловится при загрузке контента)
//! - `PartStateError` — нарушение lifecycle PartEntityManager
//! - `SyncError` — пакет синхронизации не декодируется (observer сохраняет старую таблицу)
//!
//! Damage routing ошибок не имеет: Block/Proceed — обычный control flow.

use thiserror::Error;

/// Errors that can occur while validating or loading a hitbox profile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// Two part configs share a name
    #[error("Duplicate part name '{name}' in hitbox profile")]
    DuplicatePartName { name: String },

    /// Main hitbox width or height is zero, negative or NaN
    #[error("Main hitbox size must be positive, got {width}x{height}")]
    NonPositiveMainSize { width: f32, height: f32 },

    /// Part size component is zero, negative or NaN
    #[error("Part '{name}' size must be positive, got {width}x{height}")]
    NonPositivePartSize { name: String, width: f32, height: f32 },

    /// Main hitbox size is infinite (NaN ловится как non-positive)
    #[error("Main hitbox size must be finite, got {width}x{height}")]
    NonFiniteMainSize { width: f32, height: f32 },

    /// Part size component is infinite
    #[error("Part '{name}' size must be finite, got {width}x{height}")]
    NonFinitePartSize { name: String, width: f32, height: f32 },

    /// Part offset has a NaN or infinite component
    #[error("Part '{name}' offset must be finite, got {offset:?}")]
    NonFiniteOffset { name: String, offset: [f32; 3] },

    /// Resource key is not `namespace:path`
    #[error("Invalid resource key '{key}': {reason}")]
    InvalidResourceKey { key: String, reason: &'static str },

    /// JSON content could not be parsed
    #[error("Hitbox profile JSON error: {0}")]
    Json(String),
}

/// Errors reported by `PartEntityManager` lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartStateError {
    /// `initialize` called on a manager that was already initialized
    #[error("PartEntityManager is already initialized")]
    AlreadyInitialized,

    /// The master reserved fewer identifiers than `part_count + 1`
    #[error("Network id block too small: {required} ids required, {reserved} reserved")]
    InsufficientIdSpace { required: u32, reserved: u32 },

    /// A block of `span` ids starting at `first` does not fit into `u32`
    #[error("Network id space exhausted: {span} ids requested at {first}")]
    IdSpaceExhausted { first: u32, span: u32 },
}

/// Errors that can occur while encoding or decoding a content sync packet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Packet bytes are not a valid envelope
    #[error("Malformed sync packet: {0}")]
    Malformed(String),

    /// The same key appears twice in one packet
    #[error("Duplicate key '{key}' in sync packet")]
    DuplicateKey { key: String },

    /// An entry decoded but failed content validation
    #[error("Invalid entry '{key}': {reason}")]
    InvalidEntry { key: String, reason: String },

    /// A table value could not be encoded
    #[error("Failed to encode '{key}': {reason}")]
    Encode { key: String, reason: String },
}
