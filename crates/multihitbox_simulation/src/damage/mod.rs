//! Damage module — роутинг урона между мастером и частями
//!
//! ECS ответственность:
//! - Health мастера (единственная цель урона)
//! - DamageRouter: policy иммунного тела + форвард урона частей
//! - Events: HitboxHit (вход), DamageDealt / DamageBlocked / EntityDied (выход)
//!
//! Hit detection (какая часть задета) — ответственность host'а: он шлёт `HitboxHit`.

use bevy::prelude::*;

pub mod health;
pub mod router;
pub mod systems;

#[cfg(test)]
mod router_tests;

pub use health::Health;
pub use router::{DamageDecision, DamageKind, DamagePath, DamageRouter, DamageSource};
pub use systems::{route_hitbox_hits, DamageBlocked, DamageDealt, EntityDied, HitboxHit};

use crate::MultipartSet;

/// Damage Plugin
///
/// `route_hitbox_hits` идёт после выравнивания частей и до публикации Transform.
pub struct DamagePlugin;

impl Plugin for DamagePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<HitboxHit>()
            .add_event::<DamageDealt>()
            .add_event::<DamageBlocked>()
            .add_event::<EntityDied>();

        app.add_systems(FixedUpdate, route_hitbox_hits.in_set(MultipartSet::Damage));
    }
}
