//! Конфигурация multihitbox симуляции
//!
//! Resource с Default — plugin вставляет его, если host не вставил свой раньше.

use bevy::prelude::*;

use crate::logger::LogLevel;

/// Роль процесса в content sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncRole {
    /// Source of truth: рассылает таблицы observers
    #[default]
    Authority,
    /// Mirror: принимает таблицы от authority
    Observer,
}

#[derive(Resource, Debug, Clone)]
pub struct MultipartConfig {
    /// Частота FixedUpdate (Hz)
    pub fixed_hz: f64,
    pub role: SyncRole,
    /// Вешать ли на мастера sensor collider по main hitbox
    pub main_hitbox_collider: bool,
    /// None — не трогать глобальный уровень логгера
    pub log_level: Option<LogLevel>,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 60.0,
            role: SyncRole::Authority,
            main_hitbox_collider: true,
            log_level: None,
        }
    }
}

impl MultipartConfig {
    pub fn authority() -> Self {
        Self::default()
    }

    pub fn observer() -> Self {
        Self {
            role: SyncRole::Observer,
            ..Self::default()
        }
    }

    pub fn with_fixed_hz(mut self, hz: f64) -> Self {
        self.fixed_hz = hz;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn without_main_collider(mut self) -> Self {
        self.main_hitbox_collider = false;
        self
    }
}

/// Run condition: процесс — authority
pub fn is_authority(config: Res<MultipartConfig>) -> bool {
    config.role == SyncRole::Authority
}

/// Run condition: процесс — observer
pub fn is_observer(config: Res<MultipartConfig>) -> bool {
    config.role == SyncRole::Observer
}
