//! Content sync — репликация таблиц контента authority → observers
//!
//! Протокол:
//! - Один logical channel на тип таблицы (`SyncedContent::CHANNEL`)
//! - Пакет = полная таблица (whole-table replace, никакого merge/delta)
//! - Authority шлёт: observer подключился → только ему; reload → всем
//! - Observer применяет пакеты на границе тика (первая система FixedUpdate)
//!
//! Transport (reliable + ordered per channel) снаружи: `SyncOutbox` / `SyncInbox`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod authority;
pub mod observer;
pub mod packet;
pub mod table;
pub mod transport;


pub use authority::ContentAuthority;
pub use observer::ContentObserver;
pub use packet::{decode_table, encode_table, SyncPacket, SyncedContent};
pub use table::{ApplyOutcome, SyncTable};
pub use transport::{deliver_loopback, OutgoingPacket, SyncInbox, SyncOutbox};

use crate::config::{is_authority, is_observer, MultipartConfig};
use crate::error::SyncError;
use crate::profile::{registry::detect_profile_reloads, HitboxProfile, ProfileRegistry, ProfilesReloaded};
use crate::MultipartSet;

/// Logical channel id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u16);

impl ChannelId {
    pub const HITBOX_PROFILES: ChannelId = ChannelId(1);
}

/// Id подключённого observer (выдаёт transport)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(pub u64);

/// Адресат исходящего пакета
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Observer(ObserverId),
    Broadcast,
}

impl SyncTarget {
    pub fn includes(&self, observer: ObserverId) -> bool {
        match self {
            SyncTarget::Observer(id) => *id == observer,
            SyncTarget::Broadcast => true,
        }
    }
}

/// Событие (authority): transport подключил observer
#[derive(Event, Debug, Clone, Copy)]
pub struct ObserverConnected {
    pub observer: ObserverId,
}

/// Событие (authority): observer отключился
#[derive(Event, Debug, Clone, Copy)]
pub struct ObserverDisconnected {
    pub observer: ObserverId,
}

/// Событие (observer): пакет отброшен, предыдущая таблица сохранена
#[derive(Event, Debug, Clone)]
pub struct SyncPacketRejected {
    pub channel: ChannelId,
    pub error: SyncError,
}

/// Система (observer): inbox → ProfileRegistry
///
/// Первая система тика: всё что ниже видит уже заменённую таблицу.
pub fn apply_incoming_profiles(
    mut inbox: ResMut<SyncInbox>,
    mut observer: ResMut<ContentObserver<HitboxProfile>>,
    mut registry: ResMut<ProfileRegistry>,
    mut rejected_events: EventWriter<SyncPacketRejected>,
) {
    for bytes in inbox.take_channel(HitboxProfile::CHANNEL) {
        observer.receive(bytes);
    }
    if observer.pending_len() == 0 {
        return;
    }

    let results = observer.flush(registry.table_mut());
    for result in results {
        match result {
            Ok(ApplyOutcome::Replaced) => registry.mark_replaced(),
            Ok(ApplyOutcome::Unchanged) => {}
            Err(error) => {
                rejected_events.write(SyncPacketRejected {
                    channel: HitboxProfile::CHANNEL,
                    error,
                });
            }
        }
    }
}

/// Система (authority): reload профилей → broadcast полной таблицы
pub fn broadcast_profiles_on_reload(
    mut reloaded_events: EventReader<ProfilesReloaded>,
    registry: Res<ProfileRegistry>,
    mut authority: ResMut<ContentAuthority<HitboxProfile>>,
    mut outbox: ResMut<SyncOutbox>,
) {
    // Несколько reload за тик — одна рассылка актуальной таблицы
    if reloaded_events.is_empty() {
        return;
    }
    reloaded_events.clear();

    if let Err(err) = authority.broadcast(registry.table(), &mut outbox) {
        crate::logger::log_error(&format!("broadcast_profiles_on_reload: {}", err));
    }
}

/// Система (authority): connect → полная таблица только новому observer
pub fn handle_observer_connections(
    mut connected_events: EventReader<ObserverConnected>,
    mut disconnected_events: EventReader<ObserverDisconnected>,
    registry: Res<ProfileRegistry>,
    mut authority: ResMut<ContentAuthority<HitboxProfile>>,
    mut outbox: ResMut<SyncOutbox>,
) {
    for event in disconnected_events.read() {
        if authority.disconnect(event.observer) {
            crate::logger::log(&format!("sync: observer {:?} disconnected", event.observer));
        }
    }

    for event in connected_events.read() {
        if let Err(err) = authority.connect(event.observer, registry.table(), &mut outbox) {
            crate::logger::log_error(&format!(
                "handle_observer_connections: {:?}: {}",
                event.observer, err
            ));
        }
    }
}

/// Sync Plugin
///
/// Порядок:
/// 1. apply_incoming_profiles (observer) → detect_profile_reloads — начало тика
/// 2. broadcast_profiles_on_reload → handle_observer_connections (authority) — конец тика
pub struct SyncPlugin;

impl Plugin for SyncPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MultipartConfig>()
            .init_resource::<ProfileRegistry>()
            .init_resource::<SyncOutbox>()
            .init_resource::<SyncInbox>()
            .init_resource::<ContentAuthority<HitboxProfile>>()
            .init_resource::<ContentObserver<HitboxProfile>>()
            .add_event::<ProfilesReloaded>()
            .add_event::<ObserverConnected>()
            .add_event::<ObserverDisconnected>()
            .add_event::<SyncPacketRejected>();

        app.add_systems(
            FixedUpdate,
            (
                (apply_incoming_profiles.run_if(is_observer), detect_profile_reloads)
                    .chain()
                    .in_set(MultipartSet::SyncApply),
                (broadcast_profiles_on_reload, handle_observer_connections)
                    .chain()
                    .run_if(is_authority)
                    .in_set(MultipartSet::SyncSend),
            ),
        );
    }
}
