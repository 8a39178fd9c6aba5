//! Transport boundary — outbox/inbox resources
//!
//! Ядро не знает про сокеты. Authority пишет в `SyncOutbox`,
//! внешний transport (reliable + ordered per channel) забирает через `drain`.
//! На observer стороне transport кладёт bytes в `SyncInbox`.
//! Retries нет: доставка — ответственность transport'а.

use bevy::prelude::*;

use super::{ChannelId, ObserverId, SyncTarget};

/// Исходящий пакет
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPacket {
    pub channel: ChannelId,
    pub target: SyncTarget,
    pub bytes: Vec<u8>,
}

/// Authority → transport
#[derive(Resource, Debug, Default)]
pub struct SyncOutbox {
    packets: Vec<OutgoingPacket>,
}

impl SyncOutbox {
    pub fn send(&mut self, channel: ChannelId, target: SyncTarget, bytes: Vec<u8>) {
        self.packets.push(OutgoingPacket {
            channel,
            target,
            bytes,
        });
    }

    pub fn drain(&mut self) -> Vec<OutgoingPacket> {
        std::mem::take(&mut self.packets)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Пакеты для конкретного observer (адресные + broadcast)
    pub fn peek_for(&self, observer: ObserverId) -> impl Iterator<Item = &OutgoingPacket> {
        self.packets.iter().filter(move |p| p.target.includes(observer))
    }
}

/// Transport → observer
#[derive(Resource, Debug, Default)]
pub struct SyncInbox {
    packets: Vec<(ChannelId, Vec<u8>)>,
}

impl SyncInbox {
    pub fn push(&mut self, channel: ChannelId, bytes: Vec<u8>) {
        self.packets.push((channel, bytes));
    }

    /// Забрать пакеты одного channel в порядке прихода
    pub fn take_channel(&mut self, channel: ChannelId) -> Vec<Vec<u8>> {
        let (taken, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.packets).into_iter().partition(|(c, _)| *c == channel);
        self.packets = rest;
        taken.into_iter().map(|(_, bytes)| bytes).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

/// Доставить содержимое outbox в inbox одного observer (in-process loopback)
///
/// Используется headless demo и тестами вместо реального transport.
pub fn deliver_loopback(outbox: &mut SyncOutbox, observer: ObserverId, inbox: &mut SyncInbox) {
    for packet in outbox.drain() {
        if packet.target.includes(observer) {
            inbox.push(packet.channel, packet.bytes);
        }
    }
}
