//! PartEntityManager — части одного мастера
//!
//! # Ownership
//!
//! Мастер эксклюзивно владеет своими `PartInstance`. Две view на одно множество:
//! - `slots`: index → part (index = network id offset)
//! - `by_name`: name → index (O(1) lookup)
//!
//! Профиль фиксирован на время жизни мастера: initialize ровно один раз,
//! части не пересоздаются.

use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use super::bones::BoneInformation;
use crate::error::PartStateError;
use crate::profile::{ActorTypeId, HitboxProfile, PartConfig, RotationMode};

/// Одна часть мастера
#[derive(Debug, Clone, PartialEq)]
pub struct PartInstance {
    name: String,
    local_index: usize,
    network_id: Option<u32>,
    size: (f32, f32),
    transform: Transform,
    previous_transform: Transform,
    visible: bool,
    age: u32,
    entity: Option<Entity>,
}

impl PartInstance {
    fn from_config(config: &PartConfig) -> Self {
        Self {
            name: config.name.clone(),
            local_index: 0,
            network_id: None,
            size: config.size,
            transform: Transform::IDENTITY,
            previous_transform: Transform::IDENTITY,
            visible: true,
            age: 0,
            entity: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_index(&self) -> usize {
        self.local_index
    }

    pub fn network_id(&self) -> Option<u32> {
        self.network_id
    }

    pub fn size(&self) -> (f32, f32) {
        self.size
    }

    /// Текущая мировая поза (rendering hook)
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Поза на начало тика (для интерполяции рендера)
    pub fn previous_transform(&self) -> &Transform {
        &self.previous_transform
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Сколько тиков часть прожила
    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    fn tick(&mut self) {
        self.previous_transform = self.transform;
        self.age = self.age.saturating_add(1);
    }
}

/// Capability: актор с частями
///
/// Host может реализовать для своего типа; в ECS её реализует `PartEntityManager`.
pub trait HasParts {
    fn part_by_name(&self, name: &str) -> Option<&PartInstance>;

    fn part_count(&self) -> usize;

    fn sync_with_model(&self) -> bool;

    fn is_composite(&self) -> bool {
        self.part_count() > 0
    }

    /// Свой сигнал OR сигнал движка (у движка может быть свой механизм частей)
    fn is_multipart(&self, engine_reports_composite: bool) -> bool {
        engine_reports_composite || self.is_composite()
    }
}

/// Компонент мастера: профиль + владение частями
///
/// Default — пустая оболочка (ноль частей), до и без профиля.
#[derive(Component, Debug, Default)]
pub struct PartEntityManager {
    actor_type: Option<ActorTypeId>,
    profile: Option<Arc<HitboxProfile>>,
    slots: Vec<Option<PartInstance>>,
    by_name: HashMap<String, usize>,
    initialized: bool,
    master_network_id: Option<u32>,
}

impl PartEntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Построить части из профиля
    ///
    /// `None` профиль → пустая оболочка, не ошибка.
    /// Повторный вызов → `AlreadyInitialized`, состояние не меняется.
    pub fn initialize(
        &mut self,
        actor_type: ActorTypeId,
        profile: Option<Arc<HitboxProfile>>,
    ) -> Result<(), PartStateError> {
        if self.initialized {
            return Err(PartStateError::AlreadyInitialized);
        }
        self.initialized = true;
        self.actor_type = Some(actor_type);

        let Some(profile) = profile else {
            return Ok(());
        };

        self.slots = vec![None; profile.part_count()];
        self.by_name = HashMap::with_capacity(profile.part_count());
        for config in profile.parts() {
            self.store(PartInstance::from_config(config));
        }
        self.profile = Some(profile);

        Ok(())
    }

    /// First-free-slot: первый пустой slot слева
    ///
    /// Вставка идёт в порядке профиля в свежий массив → index == позиция в профиле.
    fn store(&mut self, mut part: PartInstance) {
        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };

        part.local_index = index;
        self.by_name.insert(part.name.clone(), index);
        self.slots[index] = Some(part);
    }

    /// `part.network_id = master_id + local_index + 1`
    ///
    /// Мастер обязан заранее зарезервировать `part_count + 1` подряд идущих id
    /// (`NetworkIdAllocator::reserve`). Меньший блок или блок за `u32::MAX` →
    /// ошибка, ничего не назначено.
    pub fn assign_network_ids(&mut self, master_id: u32, reserved_span: u32) -> Result<(), PartStateError> {
        let required = self.required_id_span();
        if reserved_span < required {
            return Err(PartStateError::InsufficientIdSpace {
                required,
                reserved: reserved_span,
            });
        }

        // Старшая часть должна влезть в u32 до того, как что-то назначено
        if master_id.checked_add(required - 1).is_none() {
            return Err(PartStateError::IdSpaceExhausted {
                first: master_id,
                span: required,
            });
        }

        self.master_network_id = Some(master_id);
        for part in self.slots.iter_mut().flatten() {
            part.network_id = Some(master_id + part.local_index as u32 + 1);
        }
        Ok(())
    }

    /// Сколько id нужно мастеру: он сам + части
    pub fn required_id_span(&self) -> u32 {
        self.part_count() as u32 + 1
    }

    /// Tick всех частей (no-op без частей)
    pub fn tick(&mut self) {
        for part in self.slots.iter_mut().flatten() {
            part.tick();
        }
    }

    /// Геометрическое выравнивание по мастеру
    ///
    /// No-op для `sync_to_model` профилей — там позы приходят из костей.
    pub fn align(&mut self, master: &Transform) {
        if self.sync_with_model() {
            return;
        }
        self.align_geometric(master);
    }

    /// Начальная расстановка частей (для любого режима выравнивания)
    ///
    /// Model-driven части стартуют с геометрической позы, а не из origin.
    pub fn seed_transforms(&mut self, master: &Transform) {
        self.align_geometric(master);
        for part in self.slots.iter_mut().flatten() {
            part.previous_transform = part.transform;
        }
    }

    fn align_geometric(&mut self, master: &Transform) {
        let Some(profile) = self.profile.clone() else {
            return;
        };

        let (yaw, _, _) = master.rotation.to_euler(EulerRot::YXZ);
        let yaw_rotation = Quat::from_rotation_y(yaw);

        for config in profile.parts() {
            let Some(part) = self
                .by_name
                .get(&config.name)
                .and_then(|&index| self.slots[index].as_mut())
            else {
                continue;
            };

            part.transform = geometric_pose(master.translation, yaw_rotation, config);
        }
    }

    /// Применить кадр костей (model-driven выравнивание)
    ///
    /// Совпавшая кость → поза + visibility части. Лишние кости игнорируются,
    /// части без кости держат последнюю позу. Для не-model профилей — no-op.
    /// Возвращает число обновлённых частей.
    pub fn process_bone_information(&mut self, bones: &HashMap<String, BoneInformation>) -> usize {
        if !self.sync_with_model() {
            return 0;
        }

        let mut matched = 0;
        for (bone_name, bone) in bones {
            let Some(&index) = self.by_name.get(bone_name) else {
                continue;
            };
            if let Some(part) = self.slots[index].as_mut() {
                part.transform = bone.pose;
                part.visible = bone.visible;
                matched += 1;
            }
        }
        matched
    }

    /// O(1) lookup по имени
    pub fn lookup_by_name(&self, name: &str) -> Option<&PartInstance> {
        self.by_name
            .get(name)
            .and_then(|&index| self.slots.get(index))
            .and_then(Option::as_ref)
    }

    pub fn part_by_index(&self, index: usize) -> Option<&PartInstance> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Части в порядке index
    pub fn parts(&self) -> impl Iterator<Item = &PartInstance> {
        self.slots.iter().flatten()
    }

    /// Привязать ECS entity к части (после spawn)
    pub fn bind_entity(&mut self, index: usize, entity: Entity) -> bool {
        match self.slots.get_mut(index).and_then(Option::as_mut) {
            Some(part) => {
                part.entity = Some(entity);
                true
            }
            None => false,
        }
    }

    /// Entities всех частей (для despawn вместе с мастером)
    pub fn part_entities(&self) -> Vec<Entity> {
        self.parts().filter_map(PartInstance::entity).collect()
    }

    pub fn profile(&self) -> Option<&Arc<HitboxProfile>> {
        self.profile.as_ref()
    }

    pub fn actor_type(&self) -> Option<&ActorTypeId> {
        self.actor_type.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn master_network_id(&self) -> Option<u32> {
        self.master_network_id
    }

    pub fn is_pickable(&self, engine_pickable: bool) -> bool {
        engine_pickable && self.profile.as_ref().map_or(true, |p| p.can_receive_damage())
    }
}

impl HasParts for PartEntityManager {
    fn part_by_name(&self, name: &str) -> Option<&PartInstance> {
        self.lookup_by_name(name)
    }

    fn part_count(&self) -> usize {
        self.by_name.len()
    }

    fn sync_with_model(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.sync_to_model())
    }
}

/// `master ⊕ offset` по rotation policy части
pub fn geometric_pose(master_translation: Vec3, master_yaw: Quat, config: &PartConfig) -> Transform {
    match config.rotation_mode {
        RotationMode::FollowMaster | RotationMode::FollowBone => Transform {
            translation: master_translation + master_yaw * config.offset,
            rotation: master_yaw,
            scale: Vec3::ONE,
        },
        RotationMode::Fixed => Transform::from_translation(master_translation + config.offset),
    }
}
