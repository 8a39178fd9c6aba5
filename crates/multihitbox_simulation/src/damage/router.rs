//! DamageRouter — master ↔ part делегирование урона
//!
//! # Правила
//!
//! ```text
//! OutOfWorld source        → Proceed (void обходит hitbox policy)
//! body immune + Direct     → Block
//! body immune + FromPart   → Proceed
//! body vulnerable          → Proceed
//! ```
//!
//! Путь удара (`DamagePath`) передаётся явно в каждый вызов — никакого
//! долгоживущего флага "урон пришёл от части". `hurt_from_part()` виден только
//! пока идёт forwarding-вызов; `PartForwardGuard` сбрасывает его на drop,
//! в том числе при unwinding из `apply`.

use bevy::prelude::*;

use crate::profile::HitboxProfile;

/// Категория источника урона
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum DamageKind {
    #[default]
    Generic,
    Melee,
    Ranged,
    Environmental,
    /// Падение в void / out of world — всегда проходит
    OutOfWorld,
}

/// Описание источника урона
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct DamageSource {
    pub kind: DamageKind,
    pub attacker: Option<Entity>,
}

impl DamageSource {
    pub fn new(kind: DamageKind, attacker: Option<Entity>) -> Self {
        Self { kind, attacker }
    }

    pub fn melee(attacker: Entity) -> Self {
        Self::new(DamageKind::Melee, Some(attacker))
    }

    pub fn ranged(attacker: Entity) -> Self {
        Self::new(DamageKind::Ranged, Some(attacker))
    }

    pub fn out_of_world() -> Self {
        Self::new(DamageKind::OutOfWorld, None)
    }

    pub fn is_out_of_world(&self) -> bool {
        self.kind == DamageKind::OutOfWorld
    }
}

/// Откуда пришёл удар по мастеру
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DamagePath {
    /// Удар прямо в main hitbox
    Direct,
    /// Удар в часть, форвард на мастера
    FromPart { part: String },
}

impl DamagePath {
    pub fn from_part(part: impl Into<String>) -> Self {
        Self::FromPart { part: part.into() }
    }

    pub fn is_from_part(&self) -> bool {
        matches!(self, DamagePath::FromPart { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageDecision {
    Proceed,
    Block,
}

/// Per-master damage policy
///
/// Вешается на мастера (`MultipartActor` требует его), настраивается из профиля
/// при инициализации частей. Без профиля тело принимает урон как обычно.
#[derive(Component, Debug, Clone, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct DamageRouter {
    body_can_receive_damage: bool,
    hurt_from_part: bool,
}

impl Default for DamageRouter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DamageRouter {
    pub fn new(body_can_receive_damage: bool) -> Self {
        Self {
            body_can_receive_damage,
            hurt_from_part: false,
        }
    }

    pub fn for_profile(profile: Option<&HitboxProfile>) -> Self {
        Self::new(profile.map_or(true, |p| p.can_receive_damage()))
    }

    pub fn body_can_receive_damage(&self) -> bool {
        self.body_can_receive_damage
    }

    /// true только внутри `on_part_damage`
    pub fn hurt_from_part(&self) -> bool {
        self.hurt_from_part
    }

    /// Решение по входящему удару
    pub fn on_incoming_damage(
        &self,
        source: &DamageSource,
        amount: f32,
        path: &DamagePath,
    ) -> DamageDecision {
        decide(self.body_can_receive_damage, source, amount, path)
    }

    /// Форвард удара по части на мастера
    ///
    /// `apply` — обычный damage path мастера; возвращает применился ли урон.
    /// `Err` из `apply` → `false`. Флаг сбрасывается и при `Err`, и при панике.
    pub fn on_part_damage<E: std::fmt::Display>(
        &mut self,
        part: &str,
        source: &DamageSource,
        amount: f32,
        apply: impl FnOnce(&DamagePath, &DamageSource, f32) -> Result<bool, E>,
    ) -> bool {
        let path = DamagePath::from_part(part);
        let _guard = PartForwardGuard::enter(&mut self.hurt_from_part);

        match decide(self.body_can_receive_damage, source, amount, &path) {
            DamageDecision::Block => false,
            DamageDecision::Proceed => match apply(&path, source, amount) {
                Ok(applied) => applied,
                Err(err) => {
                    crate::logger::log_warning(&format!(
                        "DamageRouter: forwarded hit from part '{}' failed: {}",
                        part, err
                    ));
                    false
                }
            },
        }
    }

    /// Можно ли выбрать мастера лучом (курсор, прицел)
    ///
    /// Иммунное тело не pickable — выбирать надо части.
    pub fn is_pickable(&self, engine_pickable: bool) -> bool {
        engine_pickable && self.body_can_receive_damage
    }
}

fn decide(
    body_can_receive_damage: bool,
    source: &DamageSource,
    _amount: f32,
    path: &DamagePath,
) -> DamageDecision {
    if source.is_out_of_world() {
        return DamageDecision::Proceed;
    }

    if !body_can_receive_damage && !path.is_from_part() {
        return DamageDecision::Block;
    }

    DamageDecision::Proceed
}

/// RAII: выставляет флаг forwarding, снимает на drop
struct PartForwardGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> PartForwardGuard<'a> {
    fn enter(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for PartForwardGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}
