/// PROPERTY-BASED TESTS: part indexing, network ids, table sync
///
/// Uses proptest to verify invariants across random profiles and tables.
///
/// Key invariants:
/// 1. initialize создаёт ровно parts.len() частей, каждая доступна по имени и index
/// 2. network id части = master_id + index + 1, без повторов
/// 3. encode → decode даёт ту же таблицу при любом порядке вставки
/// 4. Повторное применение той же таблицы — Unchanged
/// 5. Любой f32 (inf, NaN, subnormal): профиль либо отбракован, либо переживает sync
/// 6. Блок id у самого u32::MAX: либо влезает целиком, либо ошибка без wrap

use bevy::prelude::*;
use multihitbox_simulation::sync::{decode_table, encode_table, ApplyOutcome, SyncTable};
use multihitbox_simulation::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

// Strategy: уникальные имена частей
fn part_names_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z][a-z0-9_]{0,8}", 0..24).prop_map(|names| {
        let mut names: Vec<_> = names.into_iter().collect();
        names.sort();
        names
    })
}

fn size_strategy() -> impl Strategy<Value = f32> {
    (1u32..500u32).prop_map(|n| n as f32 / 10.0)
}

fn profile_strategy() -> impl Strategy<Value = HitboxProfile> {
    (
        part_names_strategy(),
        any::<bool>(),
        any::<bool>(),
        size_strategy(),
        size_strategy(),
    )
        .prop_map(|(names, can_receive_damage, sync_to_model, width, height)| {
            let parts = names
                .into_iter()
                .enumerate()
                .map(|(i, name)| PartConfig::new(name, Vec3::new(0.0, i as f32 * 0.5, 0.0), (width, height)))
                .collect();
            HitboxProfile::new(
                MainHitboxConfig {
                    can_receive_damage,
                    width,
                    height,
                },
                parts,
                sync_to_model,
            )
        })
}

// Strategy: произвольные f32, включая inf/NaN, плюс нормальные размеры
fn raw_f32_strategy() -> impl Strategy<Value = f32> {
    prop_oneof![any::<f32>(), 0.01f32..50.0f32]
}

fn raw_profile_strategy() -> impl Strategy<Value = HitboxProfile> {
    (
        part_names_strategy(),
        (raw_f32_strategy(), raw_f32_strategy()),
        prop::collection::vec(
            (raw_f32_strategy(), raw_f32_strategy(), raw_f32_strategy(), raw_f32_strategy(), raw_f32_strategy()),
            24,
        ),
    )
        .prop_map(|(names, (width, height), dims)| {
            let parts = names
                .into_iter()
                .zip(dims)
                .map(|(name, (x, y, z, w, h))| PartConfig::new(name, Vec3::new(x, y, z), (w, h)))
                .collect();
            HitboxProfile::new(
                MainHitboxConfig {
                    can_receive_damage: true,
                    width,
                    height,
                },
                parts,
                false,
            )
        })
}

// Strategy: first id и далеко от края, и вплотную к u32::MAX
fn first_id_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![1u32..1_000_000u32, (u32::MAX - 64)..=u32::MAX]
}

// Strategy: таблица с уникальными ключами
fn table_entries_strategy() -> impl Strategy<Value = Vec<(ResourceKey, HitboxProfile)>> {
    prop::collection::btree_map("[a-z]{1,6}:[a-z_/]{1,10}", profile_strategy(), 0..12).prop_map(|map| {
        map.into_iter()
            .map(|(k, v)| (ResourceKey::parse(&k).unwrap(), v))
            .collect()
    })
}

fn actor_key() -> ResourceKey {
    ResourceKey::parse("bosses:generated").unwrap()
}

proptest! {
    /// Каждая часть доступна по имени и по уникальному index в [0, count)
    #[test]
    fn prop_initialize_indexes_every_part(profile in profile_strategy()) {
        let expected = profile.part_count();
        let names: Vec<String> = profile.parts().iter().map(|p| p.name.clone()).collect();

        let mut manager = PartEntityManager::new();
        prop_assert!(manager.initialize(actor_key(), Some(Arc::new(profile))).is_ok());

        prop_assert_eq!(manager.part_count(), expected);
        let mut seen = HashSet::new();
        for name in &names {
            let part = manager.lookup_by_name(name);
            prop_assert!(part.is_some(), "part '{}' not reachable by name", name);
            let index = part.unwrap().local_index();
            prop_assert!(index < expected);
            prop_assert!(seen.insert(index), "index {} assigned twice", index);
            prop_assert_eq!(manager.part_by_index(index).unwrap().name(), name.as_str());
        }
    }

    /// network id = master + index + 1, без повторов внутри мастера
    #[test]
    fn prop_network_ids_follow_master(profile in profile_strategy(), first in first_id_strategy()) {
        let mut manager = PartEntityManager::new();
        manager.initialize(actor_key(), Some(Arc::new(profile))).unwrap();

        let span = manager.required_id_span();
        let mut allocator = NetworkIdAllocator::starting_at(first);
        let block = match allocator.reserve(span) {
            Ok(block) => block,
            Err(err) => {
                // Ошибка только если блок правда не влезает, allocator не сдвинут
                prop_assert!(first.checked_add(span).is_none());
                prop_assert_eq!(err, PartStateError::IdSpaceExhausted { first, span });
                prop_assert_eq!(allocator.peek_next(), first);
                prop_assert!(manager.assign_network_ids(first, span).is_err());
                prop_assert!(manager.parts().all(|p| p.network_id().is_none()));
                return Ok(());
            }
        };
        prop_assert!(manager.assign_network_ids(block.first, block.len).is_ok());
        prop_assert!(block.last().is_some());

        let mut seen = HashSet::new();
        prop_assert!(seen.insert(block.first));
        for part in manager.parts() {
            let id = part.network_id().unwrap();
            prop_assert_eq!(id, block.first + part.local_index() as u32 + 1);
            prop_assert!(block.contains(id));
            prop_assert!(seen.insert(id), "network id {} assigned twice", id);
        }
        prop_assert_eq!(allocator.peek_next(), block.first + block.len);
    }

    /// Round-trip не зависит от порядка вставки
    #[test]
    fn prop_table_round_trip_any_insertion_order(entries in table_entries_strategy(), seed in any::<u64>()) {
        let original = SyncTable::from_entries(entries.clone());

        let mut shuffled = entries;
        DeterministicRng::new(seed).shuffle(&mut shuffled);
        let reordered = SyncTable::from_entries(shuffled);

        let bytes = encode_table(&original).unwrap();
        prop_assert_eq!(&bytes, &encode_table(&reordered).unwrap());

        let decoded = decode_table::<HitboxProfile>(&bytes).unwrap();
        prop_assert!(decoded.same_entries(&original));
        prop_assert_eq!(decoded.len(), original.len());
    }

    /// Профиль с любыми f32: registry его отвергает, либо observer его принимает
    #[test]
    fn prop_any_floats_rejected_or_synced(profile in raw_profile_strategy()) {
        let key = actor_key();
        let mut registry = ProfileRegistry::new();
        let table = SyncTable::from_entries([(key.clone(), profile.clone())]);

        if profile.validate().is_err() {
            prop_assert!(registry.insert(key, profile).is_err());
            prop_assert!(registry.is_empty());
            prop_assert!(matches!(encode_table(&table), Err(SyncError::Encode { .. })), "expected Err(SyncError::Encode)");
            return Ok(());
        }

        prop_assert!(registry.insert(key.clone(), profile.clone()).is_ok());
        let bytes = encode_table(registry.table()).unwrap();
        let decoded = decode_table::<HitboxProfile>(&bytes);
        prop_assert!(decoded.is_ok(), "valid profile failed to decode: {:?}", decoded);

        let decoded = decoded.unwrap();
        let mirrored = decoded.get(&key).unwrap();
        prop_assert_eq!(mirrored.part_count(), profile.part_count());
        prop_assert!(mirrored.is_valid());
        for (sent, received) in profile.parts().iter().zip(mirrored.parts()) {
            prop_assert_eq!(&sent.name, &received.name);
            prop_assert!(received.offset.is_finite());
        }
    }

    /// Вторая замена той же таблицей ничего не меняет
    #[test]
    fn prop_replace_is_idempotent(entries in table_entries_strategy()) {
        let bytes = encode_table(&SyncTable::from_entries(entries)).unwrap();
        let mut observer = ContentObserver::<HitboxProfile>::new();
        let mut mirror = SyncTable::new();

        observer.apply(&bytes, &mut mirror).unwrap();
        let snapshot = mirror.clone();

        prop_assert_eq!(observer.apply(&bytes, &mut mirror).unwrap(), ApplyOutcome::Unchanged);
        prop_assert!(mirror.same_entries(&snapshot));
    }
}
