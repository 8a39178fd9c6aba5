//! Observer side: mirror таблицы authority
//!
//! Пакеты копятся в очереди и применяются на границе тика (`flush`),
//! чтобы системы внутри тика видели одну и ту же таблицу.
//! Битый пакет отбрасывается целиком, предыдущая таблица остаётся.

use bevy::prelude::*;
use std::collections::VecDeque;
use std::marker::PhantomData;

use super::packet::{decode_table, SyncedContent};
use super::table::{ApplyOutcome, SyncTable};
use crate::error::SyncError;

#[derive(Resource)]
pub struct ContentObserver<T: SyncedContent> {
    pending: VecDeque<Vec<u8>>,
    applied: u64,
    rejected: u64,
    _content: PhantomData<fn() -> T>,
}

impl<T: SyncedContent> Default for ContentObserver<T> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            applied: 0,
            rejected: 0,
            _content: PhantomData,
        }
    }
}

impl<T: SyncedContent> ContentObserver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Поставить пакет в очередь (применится на следующем `flush`)
    pub fn receive(&mut self, bytes: Vec<u8>) {
        self.pending.push_back(bytes);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Декодировать и применить один пакет сразу
    pub fn apply(&mut self, bytes: &[u8], table: &mut SyncTable<T>) -> Result<ApplyOutcome, SyncError> {
        match decode_table::<T>(bytes) {
            Ok(incoming) => {
                let outcome = table.replace(incoming);
                self.applied += 1;
                Ok(outcome)
            }
            Err(err) => {
                self.rejected += 1;
                crate::logger::log_error(&format!(
                    "sync[{}]: packet rejected, keeping previous table ({} entries): {}",
                    T::TABLE_NAME,
                    table.len(),
                    err
                ));
                Err(err)
            }
        }
    }

    /// Применить все пакеты из очереди в порядке прихода
    ///
    /// Результат на каждый пакет — caller решает что делать с ошибками.
    pub fn flush(&mut self, table: &mut SyncTable<T>) -> Vec<Result<ApplyOutcome, SyncError>> {
        let mut results = Vec::with_capacity(self.pending.len());
        while let Some(bytes) = self.pending.pop_front() {
            results.push(self.apply(&bytes, table));
        }
        results
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
