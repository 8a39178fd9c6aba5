//! ProfileRegistry — `ActorTypeId → HitboxProfile`
//!
//! Resource поверх `SyncTable<HitboxProfile>`:
//! - authority: наполняется из контента (JSON), reload → resend всем observers
//! - observer: заменяется целиком пакетами от authority
//!
//! Каждое изменение содержимого увеличивает `reload_generation`;
//! `detect_profile_reloads` превращает это в `ProfilesReloaded` event.

use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ActorTypeId, HitboxProfile, ResourceKey};
use crate::error::{ProfileError, SyncError};
use crate::sync::{ApplyOutcome, ChannelId, SyncTable, SyncedContent};

/// Событие: набор профилей изменился (onReload)
#[derive(Event, Debug, Clone)]
pub struct ProfilesReloaded {
    pub generation: u64,
    pub profile_count: usize,
}

#[derive(Resource, Debug, Default)]
pub struct ProfileRegistry {
    table: SyncTable<HitboxProfile>,
    reload_generation: u64,
}

impl SyncedContent for HitboxProfile {
    const CHANNEL: ChannelId = ChannelId::HITBOX_PROFILES;
    const TABLE_NAME: &'static str = "hitbox_profiles";

    fn validate(&self) -> Result<(), String> {
        HitboxProfile::validate(self).map_err(|e| e.to_string())
    }
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup профиля по типу актора
    pub fn lookup(&self, actor_type: &ActorTypeId) -> Option<Arc<HitboxProfile>> {
        self.table.get(actor_type)
    }

    /// Добавить/заменить один профиль (с валидацией)
    pub fn insert(&mut self, key: ResourceKey, profile: HitboxProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        self.table.insert(key, profile);
        self.bump_generation();
        Ok(())
    }

    /// Reload: валидируем всё, потом заменяем таблицу целиком
    ///
    /// Один невалидный профиль → ничего не меняется.
    pub fn reload(&mut self, profiles: HashMap<ResourceKey, HitboxProfile>) -> Result<(), ProfileError> {
        for profile in profiles.values() {
            profile.validate()?;
        }

        let mut incoming = SyncTable::from_entries(profiles);
        incoming.set_version_tag(Some(self.reload_generation + 1));
        self.table.replace(incoming);
        self.bump_generation();

        crate::logger::log_info(&format!(
            "ProfileRegistry: reloaded {} hitbox profiles (generation {})",
            self.table.len(),
            self.reload_generation
        ));
        Ok(())
    }

    /// Загрузить один профиль из JSON
    pub fn load_json_str(&mut self, key: &str, json: &str) -> Result<(), ProfileError> {
        let key = ResourceKey::parse(key)?;
        let profile = HitboxProfile::from_json_str(json)?;
        self.insert(key, profile)
    }

    /// Собрать registry из JSON объекта `{ "ns:key": <profile>, ... }`
    pub fn from_json_map(json: &str) -> Result<Self, ProfileError> {
        let profiles: HashMap<ResourceKey, HitboxProfile> =
            serde_json::from_str(json).map_err(|e| ProfileError::Json(e.to_string()))?;

        let mut registry = Self::new();
        registry.reload(profiles)?;
        Ok(registry)
    }

    /// Observer: заменить таблицу декодированной от authority
    pub fn replace_table(&mut self, table: SyncTable<HitboxProfile>) -> ApplyOutcome {
        let outcome = self.table.replace(table);
        if outcome == ApplyOutcome::Replaced {
            self.bump_generation();
        }
        outcome
    }

    pub fn table(&self) -> &SyncTable<HitboxProfile> {
        &self.table
    }

    /// Сырой доступ для observer flush. Generation не меняется —
    /// после Replaced caller обязан вызвать `mark_replaced`
    pub(crate) fn table_mut(&mut self) -> &mut SyncTable<HitboxProfile> {
        &mut self.table
    }

    pub(crate) fn mark_replaced(&mut self) {
        self.bump_generation();
    }

    pub fn reload_generation(&self) -> u64 {
        self.reload_generation
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn bump_generation(&mut self) {
        self.reload_generation += 1;
    }
}

/// Observer-side helper: декодировать пакет и применить к registry
pub fn apply_profile_packet(
    registry: &mut ProfileRegistry,
    bytes: &[u8],
) -> Result<ApplyOutcome, SyncError> {
    let table = crate::sync::decode_table::<HitboxProfile>(bytes)?;
    Ok(registry.replace_table(table))
}

/// Система: registry изменился → `ProfilesReloaded`
pub fn detect_profile_reloads(
    registry: Res<ProfileRegistry>,
    mut last_seen: Local<u64>,
    mut reloaded_events: EventWriter<ProfilesReloaded>,
) {
    let generation = registry.reload_generation();
    if generation == *last_seen {
        return;
    }
    *last_seen = generation;

    reloaded_events.write(ProfilesReloaded {
        generation,
        profile_count: registry.len(),
    });
}
