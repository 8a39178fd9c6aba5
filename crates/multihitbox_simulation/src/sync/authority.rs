//! Authority side: единственный source of truth таблицы
//!
//! Триггеры отправки:
//! - observer подключился → полная таблица только ему
//! - source перезагружен → полная таблица всем (broadcast)
//!
//! Периодического resync нет.

use bevy::prelude::*;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use super::packet::{encode_table, SyncedContent};
use super::table::SyncTable;
use super::transport::SyncOutbox;
use super::{ObserverId, SyncTarget};
use crate::error::SyncError;

#[derive(Resource)]
pub struct ContentAuthority<T: SyncedContent> {
    observers: BTreeSet<ObserverId>,
    packets_sent: u64,
    _content: PhantomData<fn() -> T>,
}

impl<T: SyncedContent> Default for ContentAuthority<T> {
    fn default() -> Self {
        Self {
            observers: BTreeSet::new(),
            packets_sent: 0,
            _content: PhantomData,
        }
    }
}

impl<T: SyncedContent> ContentAuthority<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Подписать observer и отправить ему полную таблицу
    ///
    /// Повторный connect уже подписанного observer ничего не шлёт (`Ok(false)`).
    pub fn connect(
        &mut self,
        observer: ObserverId,
        table: &SyncTable<T>,
        outbox: &mut SyncOutbox,
    ) -> Result<bool, SyncError> {
        if self.observers.contains(&observer) {
            return Ok(false);
        }

        let bytes = encode_table(table)?;
        outbox.send(T::CHANNEL, SyncTarget::Observer(observer), bytes);
        self.observers.insert(observer);
        self.packets_sent += 1;

        crate::logger::log(&format!(
            "sync[{}]: observer {:?} connected, sent {} entries",
            T::TABLE_NAME,
            observer,
            table.len()
        ));
        Ok(true)
    }

    pub fn disconnect(&mut self, observer: ObserverId) -> bool {
        self.observers.remove(&observer)
    }

    /// Разослать полную таблицу всем подписанным observers
    ///
    /// Без observers — ничего не кодируем, `Ok(false)`.
    pub fn broadcast(
        &mut self,
        table: &SyncTable<T>,
        outbox: &mut SyncOutbox,
    ) -> Result<bool, SyncError> {
        if self.observers.is_empty() {
            return Ok(false);
        }

        let bytes = encode_table(table)?;
        outbox.send(T::CHANNEL, SyncTarget::Broadcast, bytes);
        self.packets_sent += 1;

        crate::logger::log_info(&format!(
            "sync[{}]: broadcast {} entries (version {:?}) to {} observers",
            T::TABLE_NAME,
            table.len(),
            table.version_tag(),
            self.observers.len()
        ));
        Ok(true)
    }

    pub fn observers(&self) -> impl Iterator<Item = ObserverId> + '_ {
        self.observers.iter().copied()
    }

    pub fn is_connected(&self, observer: ObserverId) -> bool {
        self.observers.contains(&observer)
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }
}
