//! Content sync integration test
//!
//! Authority App + observer Apps, пакеты через loopback.
//!
//! Проверяем:
//! - connect → полная таблица только новому observer
//! - reload → broadcast всем подключённым
//! - Битый пакет → таблица observer не меняется
//! - Таблица применяется до построения частей в том же тике

use bevy::prelude::*;
use multihitbox_simulation::sync::{deliver_loopback, OutgoingPacket};
use multihitbox_simulation::*;
use std::collections::HashMap;

fn key(s: &str) -> ResourceKey {
    ResourceKey::parse(s).unwrap()
}

fn profile(part_names: &[&str]) -> HitboxProfile {
    let parts = part_names
        .iter()
        .enumerate()
        .map(|(i, name)| PartConfig::new(*name, Vec3::new(i as f32, 0.0, 0.0), (0.5, 0.5)))
        .collect();
    HitboxProfile::new(
        MainHitboxConfig {
            can_receive_damage: false,
            width: 2.0,
            height: 2.0,
        },
        parts,
        false,
    )
}

fn create_authority_app() -> App {
    let mut app = create_headless_app(7);
    app.add_plugins(MultipartPlugin::new(MultipartConfig::authority()));

    let mut profiles = HashMap::new();
    profiles.insert(key("bosses:dragon"), profile(&["head", "body"]));
    profiles.insert(key("bosses:golem"), profile(&["core"]));
    app.world_mut()
        .resource_mut::<ProfileRegistry>()
        .reload(profiles)
        .unwrap();
    app
}

fn create_observer_app() -> App {
    let mut app = create_headless_app(7);
    app.add_plugins(MultipartPlugin::new(MultipartConfig::observer()));
    app
}

fn connect(app: &mut App, observer: ObserverId) {
    app.world_mut().send_event(ObserverConnected { observer });
}

fn drain_outbox(app: &mut App) -> Vec<OutgoingPacket> {
    app.world_mut().resource_mut::<SyncOutbox>().drain()
}

/// Authority outbox → inbox одного observer
fn pump(authority: &mut App, observer: &mut App, observer_id: ObserverId) {
    let mut outbox = std::mem::take(&mut *authority.world_mut().resource_mut::<SyncOutbox>());
    let mut inbox = observer.world_mut().resource_mut::<SyncInbox>();
    deliver_loopback(&mut outbox, observer_id, &mut inbox);
}

fn reloaded_count(app: &App) -> usize {
    app.world()
        .resource::<Events<ProfilesReloaded>>()
        .iter_current_update_events()
        .count()
}

#[test]
fn test_connect_sends_full_table_to_new_observer_only() {
    let mut authority = create_authority_app();
    connect(&mut authority, ObserverId(1));
    run_fixed_tick(&mut authority);

    let packets = drain_outbox(&mut authority);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].target, SyncTarget::Observer(ObserverId(1)));
    assert_eq!(packets[0].channel, ChannelId::HITBOX_PROFILES);

    // Повторный connect того же observer ничего не шлёт
    connect(&mut authority, ObserverId(1));
    run_fixed_tick(&mut authority);
    assert!(drain_outbox(&mut authority).is_empty());
}

#[test]
fn test_observer_mirrors_authority_table() {
    let mut authority = create_authority_app();
    let mut observer = create_observer_app();

    connect(&mut authority, ObserverId(1));
    run_fixed_tick(&mut authority);
    pump(&mut authority, &mut observer, ObserverId(1));
    run_fixed_tick(&mut observer);

    let source = authority.world().resource::<ProfileRegistry>();
    let mirror = observer.world().resource::<ProfileRegistry>();
    assert_eq!(mirror.len(), 2);
    assert!(mirror.table().same_entries(source.table()));
    assert_eq!(mirror.table().version_tag(), source.table().version_tag());
    assert_eq!(reloaded_count(&observer), 1);
}

#[test]
fn test_reload_broadcasts_to_connected_observers() {
    let mut authority = create_authority_app();
    connect(&mut authority, ObserverId(1));
    connect(&mut authority, ObserverId(2));
    run_fixed_tick(&mut authority);
    assert_eq!(drain_outbox(&mut authority).len(), 2);

    let mut profiles = HashMap::new();
    profiles.insert(key("bosses:dragon"), profile(&["head", "body", "tail"]));
    authority
        .world_mut()
        .resource_mut::<ProfileRegistry>()
        .reload(profiles)
        .unwrap();
    run_fixed_tick(&mut authority);

    let packets = drain_outbox(&mut authority);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].target, SyncTarget::Broadcast);

    let table = sync::decode_table::<HitboxProfile>(&packets[0].bytes).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(&key("bosses:dragon")).unwrap().part_count(), 3);
}

#[test]
fn test_reload_without_observers_sends_nothing() {
    let mut authority = create_authority_app();
    connect(&mut authority, ObserverId(1));
    run_fixed_tick(&mut authority);
    drain_outbox(&mut authority);

    authority
        .world_mut()
        .send_event(ObserverDisconnected { observer: ObserverId(1) });
    run_fixed_tick(&mut authority);

    authority
        .world_mut()
        .resource_mut::<ProfileRegistry>()
        .insert(key("critters:rat"), profile(&[]))
        .unwrap();
    run_fixed_tick(&mut authority);

    assert!(drain_outbox(&mut authority).is_empty());
    assert!(!authority
        .world()
        .resource::<ContentAuthority<HitboxProfile>>()
        .is_connected(ObserverId(1)));
}

#[test]
fn test_bad_packet_keeps_previous_table() {
    let mut authority = create_authority_app();
    let mut observer = create_observer_app();

    connect(&mut authority, ObserverId(1));
    run_fixed_tick(&mut authority);
    pump(&mut authority, &mut observer, ObserverId(1));
    run_fixed_tick(&mut observer);

    observer
        .world_mut()
        .resource_mut::<SyncInbox>()
        .push(ChannelId::HITBOX_PROFILES, b"{\"entries\": 12}".to_vec());
    run_fixed_tick(&mut observer);

    let mirror = observer.world().resource::<ProfileRegistry>();
    assert_eq!(mirror.len(), 2);
    assert!(mirror.lookup(&key("bosses:dragon")).is_some());

    let rejected = observer.world().resource::<Events<SyncPacketRejected>>();
    let errors: Vec<_> = rejected.iter_current_update_events().collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].error, SyncError::Malformed(_)));
    // Отброшенный пакет не считается reload
    assert_eq!(reloaded_count(&observer), 1);
}

#[test]
fn test_identical_resend_is_not_a_reload() {
    let mut authority = create_authority_app();
    let mut observer = create_observer_app();

    connect(&mut authority, ObserverId(1));
    run_fixed_tick(&mut authority);
    let packet = drain_outbox(&mut authority).remove(0);

    for _ in 0..2 {
        observer
            .world_mut()
            .resource_mut::<SyncInbox>()
            .push(packet.channel, packet.bytes.clone());
        run_fixed_tick(&mut observer);
    }

    assert_eq!(observer.world().resource::<ProfileRegistry>().reload_generation(), 1);
    assert_eq!(reloaded_count(&observer), 1);
}

#[test]
fn test_table_applied_before_parts_initialize() {
    let mut authority = create_authority_app();
    let mut observer = create_observer_app();

    connect(&mut authority, ObserverId(1));
    run_fixed_tick(&mut authority);
    pump(&mut authority, &mut observer, ObserverId(1));

    // Пакет и мастер приходят в одном тике: initialize видит новую таблицу
    let dragon = observer
        .world_mut()
        .spawn(MultipartActor::new(key("bosses:dragon")))
        .id();
    run_fixed_tick(&mut observer);

    let manager = observer.world().get::<PartEntityManager>(dragon).unwrap();
    assert_eq!(manager.part_count(), 2);
    assert!(manager.lookup_by_name("head").is_some());
}

#[test]
fn test_observer_ignores_authority_events() {
    let mut observer = create_observer_app();
    connect(&mut observer, ObserverId(9));
    run_fixed_tick(&mut observer);

    assert!(drain_outbox(&mut observer).is_empty());
}
