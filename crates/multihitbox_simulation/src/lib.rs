//! MULTIHITBOX Simulation Core
//!
//! Составные акторы на Bevy 0.16: мастер + именованные части с собственными
//! collision volumes, чтобы удары резолвились по зонам тела.
//!
//! Подсистемы:
//! - `profile` — декларативные hitbox профили + registry
//! - `parts` — PartEntityManager: построение, tick, выравнивание, despawn частей
//! - `damage` — роутинг урона часть → мастер, иммунное тело
//! - `sync` — репликация таблицы профилей authority → observers
//!
//! Всё живёт в FixedUpdate, порядок задаёт `MultipartSet`.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod config;
pub mod damage;
pub mod error;
pub mod logger;
pub mod parts;
pub mod profile;
pub mod sync;

pub use config::{MultipartConfig, SyncRole};
pub use damage::{
    DamageBlocked, DamageDealt, DamageDecision, DamageKind, DamagePath, DamagePlugin, DamageRouter,
    DamageSource, EntityDied, Health, HitboxHit,
};
pub use error::{PartStateError, ProfileError, SyncError};
pub use logger::{init_logger, log, log_error, log_info, log_warning, LogLevel};
pub use parts::{
    BoneFrame, BoneInformation, DespawnMultipart, EngineComposite, HasParts, HitboxPart,
    MultipartActor, NetworkId, NetworkIdAllocator, PartEntityManager, PartInstance, PartsInitialized,
    PartsPlugin,
};
pub use profile::{
    ActorTypeId, HitboxProfile, MainHitboxConfig, PartConfig, ProfileRegistry, ProfilesReloaded,
    ResourceKey, RotationMode,
};
pub use sync::{
    ChannelId, ContentAuthority, ContentObserver, ObserverConnected, ObserverDisconnected, ObserverId,
    SyncInbox, SyncOutbox, SyncPacketRejected, SyncPlugin, SyncTarget,
};

/// Фазы fixed тика (выполняются строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultipartSet {
    /// Observer: применить пришедшие таблицы (граница тика)
    SyncApply,
    /// Построить части новых мастеров
    Initialize,
    /// tick → bones → align
    Simulate,
    /// HitboxHit → DamageRouter → Health
    Damage,
    /// Позы частей → Transform entities
    Publish,
    /// Despawn мастеров с частями, orphan parts
    Cleanup,
    /// Authority: broadcast / connect
    SyncSend,
}

/// Главный plugin (объединяет parts, damage, sync)
#[derive(Default)]
pub struct MultipartPlugin {
    pub config: MultipartConfig,
}

impl MultipartPlugin {
    pub fn new(config: MultipartConfig) -> Self {
        Self { config }
    }
}

impl Plugin for MultipartPlugin {
    fn build(&self, app: &mut App) {
        // Логгер глобальный: уровень трогаем только если его явно задали
        if let Some(level) = self.config.log_level {
            logger::set_log_level(level);
        }

        app.insert_resource(self.config.clone())
            .insert_resource(Time::<Fixed>::from_hz(self.config.fixed_hz))
            .configure_sets(
                FixedUpdate,
                (
                    MultipartSet::SyncApply,
                    MultipartSet::Initialize,
                    MultipartSet::Simulate,
                    MultipartSet::Damage,
                    MultipartSet::Publish,
                    MultipartSet::Cleanup,
                    MultipartSet::SyncSend,
                )
                    .chain(),
            )
            .add_plugins((PartsPlugin, DamagePlugin, SyncPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Перемешать slice (порядок entries на wire, порядок спавна в тестах)
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Plugins multihitbox не добавляются — caller решает роль (authority/observer).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0));

    app
}

/// Один fixed тик без ожидания реального времени (тесты, headless demo)
///
/// Запускает только `FixedUpdate`: `First` с `event_update_system` не
/// выполняется, поэтому event buffers не чистятся и события копятся
/// (тесты на этом читают `iter_current_update_events`). Host, который
/// крутит тики так долго, обязан звать `update_multipart_events` между ними.
pub fn run_fixed_tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Swap double buffers всех событий multihitbox (как `event_update_system`)
///
/// После двух вызовов подряд событие тика пропадает из buffers.
pub fn update_multipart_events(world: &mut World) {
    update_events::<HitboxHit>(world);
    update_events::<DamageDealt>(world);
    update_events::<DamageBlocked>(world);
    update_events::<EntityDied>(world);
    update_events::<BoneFrame>(world);
    update_events::<DespawnMultipart>(world);
    update_events::<PartsInitialized>(world);
    update_events::<ProfilesReloaded>(world);
    update_events::<ObserverConnected>(world);
    update_events::<ObserverDisconnected>(world);
    update_events::<SyncPacketRejected>(world);
}

fn update_events<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.update();
    }
}
