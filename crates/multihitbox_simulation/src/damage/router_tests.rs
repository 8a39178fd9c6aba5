//! Tests for damage routing.

#[cfg(test)]
mod tests {
    use crate::damage::{DamageDecision, DamageKind, DamagePath, DamageRouter, DamageSource};
    use bevy::prelude::*;
    use std::convert::Infallible;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn melee() -> DamageSource {
        DamageSource::melee(Entity::PLACEHOLDER)
    }

    #[test]
    fn test_immune_body_blocks_direct_hit() {
        let router = DamageRouter::new(false);
        let decision = router.on_incoming_damage(&melee(), 10.0, &DamagePath::Direct);
        assert_eq!(decision, DamageDecision::Block);
    }

    #[test]
    fn test_immune_body_accepts_forwarded_hit() {
        let router = DamageRouter::new(false);
        let decision = router.on_incoming_damage(&melee(), 10.0, &DamagePath::from_part("head"));
        assert_eq!(decision, DamageDecision::Proceed);
    }

    #[test]
    fn test_vulnerable_body_accepts_direct_hit() {
        let router = DamageRouter::new(true);
        let decision = router.on_incoming_damage(&melee(), 10.0, &DamagePath::Direct);
        assert_eq!(decision, DamageDecision::Proceed);
    }

    #[test]
    fn test_out_of_world_always_proceeds() {
        for can_receive in [true, false] {
            let router = DamageRouter::new(can_receive);
            let decision =
                router.on_incoming_damage(&DamageSource::out_of_world(), 1000.0, &DamagePath::Direct);
            assert_eq!(decision, DamageDecision::Proceed, "can_receive_damage = {}", can_receive);
        }
    }

    #[test]
    fn test_on_part_damage_applies_with_part_path() {
        let mut router = DamageRouter::new(false);
        let mut seen_path = None;

        let applied = router.on_part_damage("head", &melee(), 12.5, |path, source, amount| {
            seen_path = Some(path.clone());
            assert_eq!(source.kind, DamageKind::Melee);
            assert_eq!(amount, 12.5);
            Ok::<_, Infallible>(true)
        });

        assert!(applied);
        assert_eq!(seen_path, Some(DamagePath::from_part("head")));
        assert!(!router.hurt_from_part());
    }

    #[test]
    fn test_on_part_damage_reports_not_applied() {
        let mut router = DamageRouter::new(false);
        let applied = router.on_part_damage("head", &melee(), 5.0, |_, _, _| Ok::<_, Infallible>(false));
        assert!(!applied);
        assert!(!router.hurt_from_part());
    }

    #[test]
    fn test_flag_restored_after_inner_error() {
        let mut router = DamageRouter::new(false);

        let applied = router.on_part_damage("head", &melee(), 5.0, |_, _, _| Err::<bool, _>("target gone"));

        assert!(!applied);
        assert!(!router.hurt_from_part());
        // Следующий прямой удар снова блокируется
        assert_eq!(
            router.on_incoming_damage(&melee(), 5.0, &DamagePath::Direct),
            DamageDecision::Block
        );
    }

    #[test]
    fn test_flag_restored_after_panic() {
        let mut router = DamageRouter::new(false);

        let result = catch_unwind(AssertUnwindSafe(|| {
            router.on_part_damage("head", &melee(), 5.0, |_, _, _| -> Result<bool, Infallible> {
                panic!("damage handler crashed")
            })
        }));

        assert!(result.is_err());
        assert!(!router.hurt_from_part());
        assert_eq!(
            router.on_incoming_damage(&melee(), 5.0, &DamagePath::Direct),
            DamageDecision::Block
        );
    }

    #[test]
    fn test_pickable_follows_body_policy() {
        assert!(DamageRouter::new(true).is_pickable(true));
        assert!(!DamageRouter::new(false).is_pickable(true));
        assert!(!DamageRouter::new(true).is_pickable(false));
    }

    #[test]
    fn test_router_without_profile_accepts_damage() {
        let router = DamageRouter::for_profile(None);
        assert!(router.body_can_receive_damage());
    }
}
