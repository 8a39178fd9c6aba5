//! Part entities — составной актор = мастер + именованные части
//!
//! ECS ответственность:
//! - `PartEntityManager` на мастере: профиль, slots, name index, network ids
//! - Entities частей: `HitboxPart` + Transform + sensor Collider (rendering/collision hook)
//! - Lifecycle: initialize (первый тик) → tick → align/bones → despawn вместе с мастером
//!
//! Внешние источники:
//! - `ProfileRegistry` — профиль по типу актора
//! - `BoneFrame` events — позы костей от animation evaluator

use bevy::prelude::*;

pub mod bones;
pub mod components;
pub mod manager;
pub mod network_id;
pub mod systems;


pub use bones::{BoneFrame, BoneInformation};
pub use components::{DespawnMultipart, EngineComposite, HitboxPart, MultipartActor, PartsInitialized};
pub use manager::{geometric_pose, HasParts, PartEntityManager, PartInstance};
pub use network_id::{IdBlock, NetworkId, NetworkIdAllocator};
pub use systems::*;

use crate::profile::ProfileRegistry;
use crate::MultipartSet;

/// Parts Plugin
///
/// Регистрирует part системы в FixedUpdate:
/// 1. initialize_multipart_actors — построение частей новых мастеров
/// 2. tick_parts
/// 3. process_bone_frames — model-driven позы
/// 4. align_parts — геометрические позы
/// 5. publish_part_transforms — позы → Transform entities частей
/// 6. despawn_multipart_actors / reap_orphaned_parts
pub struct PartsPlugin;

impl Plugin for PartsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProfileRegistry>()
            .init_resource::<NetworkIdAllocator>()
            .add_event::<BoneFrame>()
            .add_event::<DespawnMultipart>()
            .add_event::<PartsInitialized>();

        app.add_systems(
            FixedUpdate,
            (
                initialize_multipart_actors.in_set(MultipartSet::Initialize),
                (tick_parts, process_bone_frames, align_parts)
                    .chain()
                    .in_set(MultipartSet::Simulate),
                publish_part_transforms.in_set(MultipartSet::Publish),
                (despawn_multipart_actors, reap_orphaned_parts)
                    .chain()
                    .in_set(MultipartSet::Cleanup),
            ),
        );
    }
}
