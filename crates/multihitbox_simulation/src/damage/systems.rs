//! Damage routing система
//!
//! Host (collision / weapon код) шлёт `HitboxHit` с entity, в которую попали:
//! - часть (`HitboxPart`) → форвард на мастера через `DamageRouter::on_part_damage`
//! - мастер или обычный актор с Health → `on_incoming_damage` с `DamagePath::Direct`

use bevy::prelude::*;
use std::convert::Infallible;

use super::health::Health;
use super::router::{DamageDecision, DamagePath, DamageRouter, DamageSource};
use crate::parts::HitboxPart;

/// Событие: попадание в hitbox (main или часть)
#[derive(Event, Debug, Clone)]
pub struct HitboxHit {
    pub target: Entity,
    pub source: DamageSource,
    pub amount: f32,
}

impl HitboxHit {
    pub fn new(target: Entity, source: DamageSource, amount: f32) -> Self {
        Self {
            target,
            source,
            amount,
        }
    }
}

/// Событие: урон применён к Health
///
/// `target` — всегда владелец Health (мастер), `part` — через какую часть пришёл.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub target: Entity,
    pub part: Option<String>,
    pub attacker: Option<Entity>,
    pub amount: f32,
    pub target_died: bool,
}

/// Событие: прямой удар по иммунному телу отклонён
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageBlocked {
    pub target: Entity,
    pub attacker: Option<Entity>,
    pub amount: f32,
}

/// Событие: entity умер (health <= 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Система: HitboxHit → DamageRouter → Health
///
/// Порядок событий сохраняется: два удара в один тик применяются последовательно.
pub fn route_hitbox_hits(
    mut hits: EventReader<HitboxHit>,
    parts: Query<&HitboxPart>,
    mut targets: Query<(&mut Health, Option<&mut DamageRouter>)>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut blocked_events: EventWriter<DamageBlocked>,
    mut died_events: EventWriter<EntityDied>,
) {
    for hit in hits.read() {
        let (target, part_name) = match parts.get(hit.target) {
            Ok(part) => (part.master, Some(part.name.as_str())),
            Err(_) => (hit.target, None),
        };

        let Ok((mut health, router)) = targets.get_mut(target) else {
            crate::logger::log_warning(&format!(
                "route_hitbox_hits: target {:?} has no Health (hit entity {:?})",
                target, hit.target
            ));
            continue;
        };

        // Актор без DamageRouter — обычное тело, принимает урон
        let mut fallback = DamageRouter::default();
        let router = match router {
            Some(router) => router.into_inner(),
            None => &mut fallback,
        };

        let was_alive = health.is_alive();
        let mut removed = 0.0;

        match part_name {
            Some(part) => {
                router.on_part_damage(part, &hit.source, hit.amount, |_path, _source, amount| {
                    removed = apply_to_health(&mut health, amount);
                    Ok::<_, Infallible>(removed > 0.0)
                });
            }
            None => match router.on_incoming_damage(&hit.source, hit.amount, &DamagePath::Direct) {
                DamageDecision::Block => {
                    blocked_events.write(DamageBlocked {
                        target,
                        attacker: hit.source.attacker,
                        amount: hit.amount,
                    });
                    continue;
                }
                DamageDecision::Proceed => {
                    removed = apply_to_health(&mut health, hit.amount);
                }
            },
        }

        if removed <= 0.0 {
            continue;
        }

        let target_died = was_alive && !health.is_alive();
        dealt_events.write(DamageDealt {
            target,
            part: part_name.map(str::to_string),
            attacker: hit.source.attacker,
            amount: removed,
            target_died,
        });

        if target_died {
            died_events.write(EntityDied {
                entity: target,
                killer: hit.source.attacker,
            });
            crate::logger::log_info(&format!(
                "Entity {:?} killed by {:?} (via {})",
                target,
                hit.source.attacker,
                part_name.unwrap_or("main hitbox")
            ));
        }
    }
}

/// Обычный damage path: мёртвого не бьём, возвращаем реально снятое HP
fn apply_to_health(health: &mut Health, amount: f32) -> f32 {
    if !health.is_alive() {
        return 0.0;
    }
    health.take_damage(amount)
}
