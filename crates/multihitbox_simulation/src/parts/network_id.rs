//! Network id allocation
//!
//! Мастер с N частями занимает N + 1 подряд идущих id: сам мастер + части.
//! Allocator выдаёт весь блок за один вызов, поэтому id частей
//! не могут пересечься с чужими объектами. Блок никогда не переходит
//! через `u32::MAX`: вместо wrap allocator возвращает `IdSpaceExhausted`.

use bevy::prelude::*;

use crate::error::PartStateError;

/// Replicated id мастера или части
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
#[reflect(Component)]
pub struct NetworkId(pub u32);

/// Зарезервированный блок `[first, first + len)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBlock {
    pub first: u32,
    pub len: u32,
}

impl IdBlock {
    pub fn contains(&self, id: u32) -> bool {
        id >= self.first && id - self.first < self.len
    }

    /// Последний id блока (включительно), None если блок не влезает в u32
    pub fn last(&self) -> Option<u32> {
        self.first.checked_add(self.len.saturating_sub(1))
    }
}

#[derive(Resource, Debug)]
pub struct NetworkIdAllocator {
    next: u32,
}

impl Default for NetworkIdAllocator {
    fn default() -> Self {
        // 0 не выдаём: удобно как "нет id" на стороне transport
        Self { next: 1 }
    }
}

impl NetworkIdAllocator {
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Выдать блок из `span` подряд идущих id
    ///
    /// При нехватке места allocator не сдвигается.
    pub fn reserve(&mut self, span: u32) -> Result<IdBlock, PartStateError> {
        let span = span.max(1);
        let next = self
            .next
            .checked_add(span)
            .ok_or(PartStateError::IdSpaceExhausted {
                first: self.next,
                span,
            })?;

        let block = IdBlock {
            first: self.next,
            len: span,
        };
        self.next = next;
        Ok(block)
    }

    pub fn peek_next(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_do_not_overlap() {
        let mut allocator = NetworkIdAllocator::starting_at(100);

        let dragon = allocator.reserve(3).unwrap();
        let golem = allocator.reserve(1).unwrap();

        assert_eq!(dragon, IdBlock { first: 100, len: 3 });
        assert_eq!(dragon.last(), Some(102));
        assert_eq!(golem.first, 103);
        assert!(!dragon.contains(golem.first));
        assert!(dragon.contains(101));
        assert!(!dragon.contains(99));
    }

    #[test]
    fn test_zero_span_still_reserves_master_id() {
        let mut allocator = NetworkIdAllocator::default();
        let block = allocator.reserve(0).unwrap();
        assert_eq!(block.len, 1);
        assert_eq!(allocator.peek_next(), 2);
    }

    #[test]
    fn test_block_never_wraps_past_u32_max() {
        let mut allocator = NetworkIdAllocator::starting_at(u32::MAX - 1);

        assert_eq!(
            allocator.reserve(3),
            Err(PartStateError::IdSpaceExhausted {
                first: u32::MAX - 1,
                span: 3
            })
        );
        // Неудачный резерв ничего не занял
        assert_eq!(allocator.peek_next(), u32::MAX - 1);

        let last = allocator.reserve(1).unwrap();
        assert_eq!(last.first, u32::MAX - 1);
        assert_eq!(last.last(), Some(u32::MAX - 1));
        assert_eq!(allocator.peek_next(), u32::MAX);
        assert!(allocator.reserve(1).is_err());
    }

    #[test]
    fn test_hand_built_block_past_max_has_no_last() {
        let block = IdBlock {
            first: u32::MAX,
            len: 2,
        };
        assert_eq!(block.last(), None);
        assert!(block.contains(u32::MAX));
    }
}
