//! Bone information — model-driven выравнивание частей
//!
//! Animation evaluator (вне ядра) раз в кадр шлёт `BoneFrame`:
//! имя кости → поза + видимость. Для профилей с `sync_to_model` это
//! полностью заменяет геометрическое выравнивание.

use bevy::prelude::*;
use std::collections::HashMap;

/// Поза одной кости за кадр
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInformation {
    pub pose: Transform,
    pub visible: bool,
}

impl BoneInformation {
    pub fn new(pose: Transform) -> Self {
        Self { pose, visible: true }
    }

    pub fn hidden(pose: Transform) -> Self {
        Self { pose, visible: false }
    }
}

/// Событие: кадр костей для одного мастера
#[derive(Event, Debug, Clone)]
pub struct BoneFrame {
    pub master: Entity,
    pub bones: HashMap<String, BoneInformation>,
}

impl BoneFrame {
    pub fn new(master: Entity) -> Self {
        Self {
            master,
            bones: HashMap::new(),
        }
    }

    pub fn with_bone(mut self, name: impl Into<String>, bone: BoneInformation) -> Self {
        self.bones.insert(name.into(), bone);
        self
    }
}
