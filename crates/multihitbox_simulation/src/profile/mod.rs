//! Hitbox profiles — декларативное описание составного актора
//!
//! # Архитектура
//!
//! **HitboxProfile** — immutable blueprint (main hitbox + упорядоченные части):
//! - Хранится в `ProfileRegistry` resource (`Arc`, lookup по `ActorTypeId`)
//! - Создаётся один раз при загрузке контента (JSON) или приходит от authority
//! - Замена профиля = пересборка всего набора частей актора
//!
//! **PartConfig** — одна часть: имя (уникальное в профиле), offset, size, rotation policy.
//!
//! # Пример JSON
//!
//! ```json
//! {
//!   "main_hitbox": { "can_receive_damage": false, "width": 2.0, "height": 3.0 },
//!   "parts": [
//!     { "name": "head", "offset": [0.0, 1.0, 0.0], "size": [0.5, 0.5] },
//!     { "name": "body", "offset": [0.0, 0.0, 0.0], "size": [1.5, 2.0], "rotation_mode": "fixed" }
//!   ],
//!   "sync_to_model": false
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ProfileError;

pub mod key;
pub mod registry;

pub use key::{ActorTypeId, ResourceKey, DEFAULT_NAMESPACE};
pub use registry::{ProfileRegistry, ProfilesReloaded};

// ============================================================================
// MainHitboxConfig
// ============================================================================

/// Main (master) hitbox
///
/// Инвариант: width > 0, height > 0
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MainHitboxConfig {
    /// false → тело иммунно к прямым ударам, урон только через части
    pub can_receive_damage: bool,
    pub width: f32,
    pub height: f32,
}

impl Default for MainHitboxConfig {
    fn default() -> Self {
        Self {
            can_receive_damage: true,
            width: 1.0,
            height: 1.0,
        }
    }
}

// ============================================================================
// PartConfig
// ============================================================================

/// Как часть наследует ориентацию при геометрическом выравнивании
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Offset и ориентация поворачиваются по yaw мастера
    #[default]
    FollowMaster,
    /// Поза задаётся костью модели; без bone data — как FollowMaster
    FollowBone,
    /// Offset в мировых осях, ориентация identity
    Fixed,
}

/// Одна часть профиля
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    /// Уникальное в профиле имя (совпадает с именем кости при sync_to_model)
    pub name: String,
    /// Смещение от позиции мастера (локальные оси мастера)
    pub offset: Vec3,
    /// (width, height) коллайдера части
    pub size: (f32, f32),
    #[serde(default)]
    pub rotation_mode: RotationMode,
}

impl PartConfig {
    pub fn new(name: impl Into<String>, offset: Vec3, size: (f32, f32)) -> Self {
        Self {
            name: name.into(),
            offset,
            size,
            rotation_mode: RotationMode::FollowMaster,
        }
    }

    pub fn with_rotation_mode(mut self, rotation_mode: RotationMode) -> Self {
        self.rotation_mode = rotation_mode;
        self
    }
}

// ============================================================================
// HitboxProfile
// ============================================================================

/// Immutable hitbox profile (shared через `Arc` всеми акторами одного типа)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitboxProfile {
    pub main_hitbox: MainHitboxConfig,
    #[serde(default)]
    pub parts: Vec<PartConfig>,
    /// true → части выравниваются по костям модели, не геометрически
    #[serde(default)]
    pub sync_to_model: bool,
}

impl HitboxProfile {
    pub fn new(main_hitbox: MainHitboxConfig, parts: Vec<PartConfig>, sync_to_model: bool) -> Self {
        Self {
            main_hitbox,
            parts,
            sync_to_model,
        }
    }

    pub fn main_hitbox(&self) -> &MainHitboxConfig {
        &self.main_hitbox
    }

    pub fn parts(&self) -> &[PartConfig] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, name: &str) -> Option<&PartConfig> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn sync_to_model(&self) -> bool {
        self.sync_to_model
    }

    pub fn can_receive_damage(&self) -> bool {
        self.main_hitbox.can_receive_damage
    }

    /// Все имена уникальны, размеры > 0 и конечны, offsets конечны
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Как `is_valid`, но называет первое нарушение
    pub fn validate(&self) -> Result<(), ProfileError> {
        let main = &self.main_hitbox;
        if !(main.width > 0.0 && main.height > 0.0) {
            return Err(ProfileError::NonPositiveMainSize {
                width: main.width,
                height: main.height,
            });
        }
        // serde_json пишет inf/NaN как null, такой профиль не переживёт sync
        if !(main.width.is_finite() && main.height.is_finite()) {
            return Err(ProfileError::NonFiniteMainSize {
                width: main.width,
                height: main.height,
            });
        }

        let mut seen = HashSet::with_capacity(self.parts.len());
        for part in &self.parts {
            if !seen.insert(part.name.as_str()) {
                return Err(ProfileError::DuplicatePartName {
                    name: part.name.clone(),
                });
            }
            let (width, height) = part.size;
            if !(width > 0.0 && height > 0.0) {
                return Err(ProfileError::NonPositivePartSize {
                    name: part.name.clone(),
                    width,
                    height,
                });
            }
            if !(width.is_finite() && height.is_finite()) {
                return Err(ProfileError::NonFinitePartSize {
                    name: part.name.clone(),
                    width,
                    height,
                });
            }
            if !part.offset.is_finite() {
                return Err(ProfileError::NonFiniteOffset {
                    name: part.name.clone(),
                    offset: part.offset.to_array(),
                });
            }
        }

        Ok(())
    }

    /// Parse + validate одного профиля из JSON
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let profile: HitboxProfile =
            serde_json::from_str(json).map_err(|e| ProfileError::Json(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }
}
