//! Part lifecycle systems (FixedUpdate)
//!
//! Порядок внутри тика задаёт `MultipartSet`:
//! initialize → tick → bones → align → (damage) → publish → cleanup

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::bones::BoneFrame;
use super::components::{DespawnMultipart, EngineComposite, HitboxPart, MultipartActor, PartsInitialized};
use super::manager::{HasParts, PartEntityManager};
use super::network_id::{NetworkId, NetworkIdAllocator};
use crate::config::MultipartConfig;
use crate::damage::DamageRouter;
use crate::profile::ProfileRegistry;

/// Система: построить части для только что заспавненных мастеров
///
/// 1. Lookup профиля по `actor_type` (нет профиля → пустая оболочка)
/// 2. `initialize` + резерв блока network id (мастер + части)
/// 3. Spawn entity на каждую часть: HitboxPart + Transform + sensor Collider
pub fn initialize_multipart_actors(
    mut commands: Commands,
    registry: Res<ProfileRegistry>,
    config: Res<MultipartConfig>,
    mut allocator: ResMut<NetworkIdAllocator>,
    mut masters: Query<
        (Entity, &MultipartActor, &Transform, &mut PartEntityManager, &mut DamageRouter),
        Added<MultipartActor>,
    >,
    mut initialized_events: EventWriter<PartsInitialized>,
) {
    for (master, actor, transform, mut manager, mut router) in masters.iter_mut() {
        let profile = registry.lookup(&actor.actor_type);

        if let Err(err) = manager.initialize(actor.actor_type.clone(), profile.clone()) {
            crate::logger::log_warning(&format!(
                "initialize_multipart_actors: {:?} ({}): {}",
                master, actor.actor_type, err
            ));
            continue;
        }

        *router = DamageRouter::for_profile(profile.as_deref());

        // Исчерпанный id space: части строятся, но без network id
        let block = allocator
            .reserve(manager.required_id_span())
            .and_then(|block| manager.assign_network_ids(block.first, block.len).map(|_| block));
        let block = match block {
            Ok(block) => Some(block),
            Err(err) => {
                crate::logger::log_error(&format!(
                    "initialize_multipart_actors: {:?} network ids not assigned: {}",
                    master, err
                ));
                None
            }
        };
        manager.seed_transforms(transform);

        let mut master_commands = commands.entity(master);
        if let Some(block) = block {
            master_commands.insert(NetworkId(block.first));
        }
        if let (true, Some(profile)) = (config.main_hitbox_collider, profile.as_ref()) {
            let main = profile.main_hitbox();
            master_commands.insert((
                Collider::cuboid(main.width / 2.0, main.height / 2.0, main.width / 2.0),
                Sensor,
            ));
        }

        let spawned: Vec<(usize, Entity)> = manager
            .parts()
            .map(|part| {
                let (width, height) = part.size();
                let mut part_entity = commands.spawn((
                    HitboxPart {
                        master,
                        name: part.name().to_string(),
                        local_index: part.local_index(),
                        visible: part.visible(),
                    },
                    *part.transform(),
                    Collider::cuboid(width / 2.0, height / 2.0, width / 2.0),
                    Sensor,
                ));
                if let Some(id) = part.network_id() {
                    part_entity.insert(NetworkId(id));
                }
                (part.local_index(), part_entity.id())
            })
            .collect();

        for (index, entity) in spawned {
            manager.bind_entity(index, entity);
        }

        crate::logger::log(&format!(
            "Multipart {:?} ({}): {} parts, network ids {:?}",
            master,
            actor.actor_type,
            manager.part_count(),
            block.and_then(|block| block.last().map(|last| block.first..=last))
        ));

        initialized_events.write(PartsInitialized {
            master,
            part_count: manager.part_count(),
            master_network_id: block.map(|block| block.first),
        });
    }
}

/// Составной ли актор: свои части или маркер движка
pub fn is_multipart(manager: Option<&PartEntityManager>, engine: Option<&EngineComposite>) -> bool {
    let engine_reports_composite = engine.is_some();
    match manager {
        Some(manager) => manager.is_multipart(engine_reports_composite),
        None => engine_reports_composite,
    }
}

/// Система: tick всех частей
pub fn tick_parts(mut masters: Query<&mut PartEntityManager>) {
    for mut manager in masters.iter_mut() {
        if !manager.is_composite() {
            continue;
        }
        manager.tick();
    }
}

/// Система: кадры костей → позы частей (только sync_to_model профили)
pub fn process_bone_frames(
    mut frames: EventReader<BoneFrame>,
    mut masters: Query<&mut PartEntityManager>,
) {
    for frame in frames.read() {
        let Ok(mut manager) = masters.get_mut(frame.master) else {
            crate::logger::log_warning(&format!(
                "process_bone_frames: master {:?} has no PartEntityManager",
                frame.master
            ));
            continue;
        };

        if !manager.sync_with_model() {
            // Геометрический профиль: кости не нужны
            crate::logger::log(&format!(
                "process_bone_frames: {:?} uses geometric alignment, bone frame skipped",
                frame.master
            ));
            continue;
        }

        manager.process_bone_information(&frame.bones);
    }
}

/// Система: геометрическое выравнивание частей по мастеру
pub fn align_parts(mut masters: Query<(&Transform, &mut PartEntityManager)>) {
    for (transform, mut manager) in masters.iter_mut() {
        if !manager.is_composite() {
            continue;
        }
        manager.align(transform);
    }
}

/// Система: позы частей → Transform их entities (rendering hook + colliders)
pub fn publish_part_transforms(
    masters: Query<&PartEntityManager>,
    mut parts: Query<(&mut Transform, &mut HitboxPart)>,
) {
    for manager in masters.iter() {
        for part in manager.parts() {
            let Some(entity) = part.entity() else {
                continue;
            };
            let Ok((mut transform, mut hitbox_part)) = parts.get_mut(entity) else {
                continue;
            };

            if *transform != *part.transform() {
                *transform = *part.transform();
            }
            if hitbox_part.visible != part.visible() {
                hitbox_part.visible = part.visible();
            }
        }
    }
}

/// Despawn мастера и всех его частей в одной пачке команд
///
/// `manager` = None — мастер без `PartEntityManager`, удаляется только он сам.
pub fn despawn_multipart(commands: &mut Commands, master: Entity, manager: Option<&PartEntityManager>) {
    if let Some(manager) = manager {
        for part in manager.part_entities() {
            if let Ok(mut part_commands) = commands.get_entity(part) {
                part_commands.despawn();
            }
        }
    }

    if let Ok(mut master_commands) = commands.get_entity(master) {
        master_commands.despawn();
        crate::logger::log(&format!("Despawning multipart {:?} with parts", master));
    }
}

/// Система: обработка `DespawnMultipart` событий
pub fn despawn_multipart_actors(
    mut commands: Commands,
    mut despawn_events: EventReader<DespawnMultipart>,
    masters: Query<&PartEntityManager>,
) {
    for event in despawn_events.read() {
        despawn_multipart(&mut commands, event.master, masters.get(event.master).ok());
    }
}

/// Система: части, чей мастер исчез в обход `DespawnMultipart`
///
/// Мастер мог быть удалён напрямую; части не переживают тик.
pub fn reap_orphaned_parts(
    mut commands: Commands,
    parts: Query<(Entity, &HitboxPart)>,
    masters: Query<(), With<PartEntityManager>>,
) {
    for (entity, part) in parts.iter() {
        if masters.contains(part.master) {
            continue;
        }
        if let Ok(mut part_commands) = commands.get_entity(entity) {
            part_commands.despawn();
        }
    }
}
