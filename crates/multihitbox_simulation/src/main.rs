//! Headless демо MULTIHITBOX
//!
//! Два App в одном процессе: authority (держит профили) и observer (mirror).
//! Пакеты ходят через in-process loopback вместо сети.

use bevy::prelude::*;
use multihitbox_simulation::sync::deliver_loopback;
use multihitbox_simulation::{
    create_headless_app, log_info, run_fixed_tick, update_multipart_events, DamageDealt, DamageSource, HitboxHit, HitboxPart,
    MultipartActor, MultipartConfig, MultipartPlugin, ObserverConnected, ObserverId, ProfileRegistry,
    ResourceKey, SyncInbox, SyncOutbox,
};

const DRAGON_PROFILES: &str = r#"{
    "bosses:dragon": {
        "main_hitbox": { "can_receive_damage": false, "width": 4.0, "height": 3.0 },
        "parts": [
            { "name": "head", "offset": [0.0, 2.0, 3.0], "size": [1.0, 1.0] },
            { "name": "body", "offset": [0.0, 1.0, 0.0], "size": [3.0, 2.0] },
            { "name": "tail", "offset": [0.0, 0.5, -4.0], "size": [0.8, 0.8], "rotation_mode": "follow_bone" }
        ],
        "sync_to_model": false
    }
}"#;

fn main() {
    let seed = 42;
    println!("Starting MULTIHITBOX headless demo (seed: {})", seed);

    let registry = match ProfileRegistry::from_json_map(DRAGON_PROFILES) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("Failed to load profiles: {}", err);
            std::process::exit(1);
        }
    };

    let mut authority = create_headless_app(seed);
    authority
        .add_plugins(MultipartPlugin::new(MultipartConfig::authority()))
        .insert_resource(registry);

    let mut observer = create_headless_app(seed);
    observer.add_plugins(MultipartPlugin::new(MultipartConfig::observer()));

    let observer_id = ObserverId(1);
    authority
        .world_mut()
        .send_event(ObserverConnected { observer: observer_id });

    let dragon_type = match ResourceKey::parse("bosses:dragon") {
        Ok(key) => key,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    let dragon = authority
        .world_mut()
        .spawn((MultipartActor::new(dragon_type), Transform::from_xyz(0.0, 0.0, 10.0)))
        .id();

    let mut dealt: Vec<DamageDealt> = Vec::new();
    for tick in 0..120 {
        run_fixed_tick(&mut authority);
        pump(&mut authority, &mut observer, observer_id);
        run_fixed_tick(&mut observer);

        // Забираем урон до swap buffers, иначе через тик он пропадёт
        dealt.extend(
            authority
                .world()
                .resource::<Events<DamageDealt>>()
                .iter_current_update_events()
                .cloned(),
        );
        update_multipart_events(authority.world_mut());
        update_multipart_events(observer.world_mut());

        if tick == 1 {
            strike(&mut authority, dragon);
        }

        if tick % 30 == 0 {
            let mirrored = observer.world().resource::<ProfileRegistry>().len();
            log_info(&format!(
                "Tick {}: authority {} entities, observer mirrors {} profiles",
                tick,
                authority.world().entities().len(),
                mirrored
            ));
        }
    }

    for event in &dealt {
        println!(
            "Damage: {:?} took {} via {}{}",
            event.target,
            event.amount,
            event.part.as_deref().unwrap_or("main hitbox"),
            if event.target_died { " (killed)" } else { "" }
        );
    }

    println!("Demo complete!");
}

/// Authority outbox → observer inbox
fn pump(authority: &mut App, observer: &mut App, observer_id: ObserverId) {
    let mut outbox = std::mem::take(&mut *authority.world_mut().resource_mut::<SyncOutbox>());
    let mut inbox = observer.world_mut().resource_mut::<SyncInbox>();
    deliver_loopback(&mut outbox, observer_id, &mut inbox);
}

/// Удар в main hitbox (блокируется) и в голову (проходит на мастера)
fn strike(app: &mut App, dragon: Entity) {
    let head = {
        let world = app.world_mut();
        let mut parts = world.query::<(Entity, &HitboxPart)>();
        parts
            .iter(world)
            .find(|(_, part)| part.master == dragon && part.name == "head")
            .map(|(entity, _)| entity)
    };

    app.world_mut()
        .send_event(HitboxHit::new(dragon, DamageSource::default(), 25.0));
    if let Some(head) = head {
        app.world_mut()
            .send_event(HitboxHit::new(head, DamageSource::default(), 25.0));
    }
}
