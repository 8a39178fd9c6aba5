//! ECS компоненты составного актора

use bevy::prelude::*;

use super::manager::PartEntityManager;
use crate::damage::{DamageRouter, Health};
use crate::profile::ActorTypeId;

/// Мастер составного актора
///
/// Автоматически добавляет Transform, Health, PartEntityManager (пустая оболочка)
/// и DamageRouter через Required Components. Части строятся на первом тике
/// после spawn по профилю `actor_type`.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Transform, Health, PartEntityManager, DamageRouter)]
pub struct MultipartActor {
    pub actor_type: ActorTypeId,
}

impl MultipartActor {
    pub fn new(actor_type: ActorTypeId) -> Self {
        Self { actor_type }
    }
}

/// Entity части (collision volume + rendering hook)
///
/// `master` — back-reference на владельца; часть не живёт без мастера.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct HitboxPart {
    pub master: Entity,
    pub name: String,
    pub local_index: usize,
    pub visible: bool,
}

/// Маркер: движок сам считает актора составным (свой механизм частей)
///
/// OR'ится с `PartEntityManager::is_composite`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct EngineComposite;

/// Событие: уничтожить мастера вместе со всеми частями
#[derive(Event, Debug, Clone)]
pub struct DespawnMultipart {
    pub master: Entity,
}

/// Событие: части мастера построены
#[derive(Event, Debug, Clone)]
pub struct PartsInitialized {
    pub master: Entity,
    pub part_count: usize,
    /// None → id space исчерпан, части без network id
    pub master_network_id: Option<u32>,
}
