//! Sync packet — generic envelope для full-table replace
//!
//! Wire shape (JSON):
//!
//! ```text
//! { "table_version_tag": 7 | null, "entries": [["ns:key", <encoded value>], ...] }
//! ```
//!
//! Один пакет = одна полная таблица. Delta пакетов нет.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::table::SyncTable;
use super::ChannelId;
use crate::error::SyncError;
use crate::profile::ResourceKey;

/// Контент, который реплицируется authority → observers
///
/// Per-type codec: по умолчанию serde_json value, `validate` — hook
/// для отбраковки entries которые декодировались, но невалидны.
pub trait SyncedContent:
    Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static
{
    /// Logical channel таблицы
    const CHANNEL: ChannelId;
    /// Имя таблицы (для логов)
    const TABLE_NAME: &'static str;

    fn encode_value(&self) -> Result<serde_json::Value, String> {
        serde_json::to_value(self).map_err(|e| e.to_string())
    }

    fn decode_value(value: serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Envelope одной полной таблицы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPacket {
    pub table_version_tag: Option<u64>,
    pub entries: Vec<(ResourceKey, serde_json::Value)>,
}

/// Таблица → bytes
///
/// Entries сортируются по ключу: одинаковые таблицы дают одинаковые bytes
/// независимо от порядка итерации HashMap. Entry, не прошедшая `validate`,
/// даёт `SyncError::Encode`: всё, что закодировалось, декодируется обратно.
pub fn encode_table<T: SyncedContent>(table: &SyncTable<T>) -> Result<Vec<u8>, SyncError> {
    let mut entries = Vec::with_capacity(table.len());

    for key in table.sorted_keys() {
        let value = table
            .get(key)
            .ok_or_else(|| SyncError::Encode {
                key: key.to_string(),
                reason: "key vanished during encode".into(),
            })?;
        // Observer отбракует невалидную entry, значит и отправлять её нельзя
        value.validate().map_err(|reason| SyncError::Encode {
            key: key.to_string(),
            reason,
        })?;
        let encoded = value.encode_value().map_err(|reason| SyncError::Encode {
            key: key.to_string(),
            reason,
        })?;
        entries.push((key.clone(), encoded));
    }

    let packet = SyncPacket {
        table_version_tag: table.version_tag(),
        entries,
    };

    serde_json::to_vec(&packet).map_err(|e| SyncError::Encode {
        key: T::TABLE_NAME.to_string(),
        reason: e.to_string(),
    })
}

/// Bytes → таблица
///
/// Всё или ничего: любая битая entry отбраковывает весь пакет.
pub fn decode_table<T: SyncedContent>(bytes: &[u8]) -> Result<SyncTable<T>, SyncError> {
    let packet: SyncPacket =
        serde_json::from_slice(bytes).map_err(|e| SyncError::Malformed(e.to_string()))?;

    let mut seen = HashSet::with_capacity(packet.entries.len());
    let mut decoded = Vec::with_capacity(packet.entries.len());

    for (key, value) in packet.entries {
        if !seen.insert(key.clone()) {
            return Err(SyncError::DuplicateKey {
                key: key.to_string(),
            });
        }

        let value = T::decode_value(value).map_err(|reason| SyncError::InvalidEntry {
            key: key.to_string(),
            reason,
        })?;
        value.validate().map_err(|reason| SyncError::InvalidEntry {
            key: key.to_string(),
            reason,
        })?;

        decoded.push((key, value));
    }

    let mut table = SyncTable::from_entries(decoded);
    table.set_version_tag(packet.table_version_tag);
    Ok(table)
}
