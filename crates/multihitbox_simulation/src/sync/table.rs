//! SyncTable — keyed content table, заменяемая целиком

use std::collections::HashMap;
use std::sync::Arc;

use crate::profile::ResourceKey;

/// Результат whole-table replace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Содержимое изменилось
    Replaced,
    /// Пришла идентичная таблица, entries не тронуты
    Unchanged,
}

/// `ResourceKey → T`, authoritative на одной стороне, mirror на observers
///
/// Значения лежат в `Arc`: lookup отдаёт shared ссылку, таблицу можно
/// заменить целиком не инвалидируя то что уже раздали акторам.
#[derive(Debug)]
pub struct SyncTable<T> {
    entries: HashMap<ResourceKey, Arc<T>>,
    version_tag: Option<u64>,
}

impl<T> Default for SyncTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            version_tag: None,
        }
    }
}

impl<T> Clone for SyncTable<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            version_tag: self.version_tag,
        }
    }
}

impl<T: PartialEq> SyncTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (ResourceKey, T)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
            version_tag: None,
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<Arc<T>> {
        self.entries.get(key).cloned()
    }

    pub fn contains_key(&self, key: &ResourceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: ResourceKey, value: T) -> Option<Arc<T>> {
        self.entries.insert(key, Arc::new(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &Arc<T>)> {
        self.entries.iter()
    }

    /// Ключи в отсортированном порядке (wire order не зависит от HashMap)
    pub fn sorted_keys(&self) -> Vec<&ResourceKey> {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        keys
    }

    pub fn version_tag(&self) -> Option<u64> {
        self.version_tag
    }

    pub fn set_version_tag(&mut self, tag: Option<u64>) {
        self.version_tag = tag;
    }

    /// Per-entry сравнение содержимого (version tag не учитывается)
    pub fn same_entries(&self, other: &SyncTable<T>) -> bool {
        self.entries == other.entries
    }

    /// Whole-table replace: никакого merge, старые ключи исчезают
    ///
    /// Идентичное содержимое → `Unchanged`, entries (и раздатые Arc) остаются прежними;
    /// version tag при этом всё равно принимается от новой таблицы.
    pub fn replace(&mut self, other: SyncTable<T>) -> ApplyOutcome {
        self.version_tag = other.version_tag;

        if self.same_entries(&other) {
            return ApplyOutcome::Unchanged;
        }

        self.entries = other.entries;
        ApplyOutcome::Replaced
    }
}
