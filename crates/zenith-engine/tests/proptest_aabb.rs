//! Property tests for the AABB overlap and penetration math.
//!
//! Collision resolution trusts a handful of algebraic facts about [`Aabb`]:
//! overlap is symmetric, strict overlap coincides with both penetration
//! depths being positive, and penetration never exceeds either box's
//! extents. Coordinates are drawn from integers so every comparison is
//! exact in `f32`.

use proptest::prelude::*;
use zenith_engine::prelude::*;

fn aabb_strategy() -> impl Strategy<Value = Aabb> {
    (
        -200i32..200,
        -200i32..200,
        1i32..80,
        1i32..80,
    )
        .prop_map(|(x, y, w, h)| Aabb::new(x as f32, y as f32, w as f32, h as f32))
}

/// A box and a second box guaranteed to lie entirely inside it.
fn nested_pair_strategy() -> impl Strategy<Value = (Aabb, Aabb)> {
    (-200i32..200, -200i32..200, 2i32..80, 2i32..80)
        .prop_flat_map(|(x, y, w, h)| {
            (1..w, 1..h).prop_flat_map(move |(iw, ih)| {
                (0..=(w - iw), 0..=(h - ih)).prop_map(move |(dx, dy)| {
                    let outer = Aabb::new(x as f32, y as f32, w as f32, h as f32);
                    let inner = Aabb::new(
                        (x + dx) as f32,
                        (y + dy) as f32,
                        iw as f32,
                        ih as f32,
                    );
                    (outer, inner)
                })
            })
        })
}

fn delta_strategy() -> impl Strategy<Value = Vec2> {
    (-500i32..500, -500i32..500).prop_map(|(x, y)| Vec2::new(x as f32, y as f32))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn overlap_is_symmetric(a in aabb_strategy(), b in aabb_strategy()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn overlap_coincides_with_positive_penetration(
        a in aabb_strategy(),
        b in aabb_strategy(),
    ) {
        let both_positive = a.penetration_x(&b) > 0.0 && a.penetration_y(&b) > 0.0;
        prop_assert_eq!(a.overlaps(&b), both_positive);
    }

    #[test]
    fn penetration_is_symmetric_and_bounded(
        a in aabb_strategy(),
        b in aabb_strategy(),
    ) {
        prop_assert_eq!(a.penetration_x(&b), b.penetration_x(&a));
        prop_assert_eq!(a.penetration_y(&b), b.penetration_y(&a));
        prop_assert!(a.penetration_x(&b) <= a.width.min(b.width));
        prop_assert!(a.penetration_y(&b) <= a.height.min(b.height));
    }

    #[test]
    fn containment_implies_overlap((outer, inner) in nested_pair_strategy()) {
        prop_assert!(inner.contained_in(&outer));
        prop_assert!(inner.overlaps(&outer));
        // Penetration against the container equals the inner extents.
        prop_assert_eq!(inner.penetration_x(&outer), inner.width);
        prop_assert_eq!(inner.penetration_y(&outer), inner.height);
    }

    #[test]
    fn translate_preserves_extents_and_round_trips(
        a in aabb_strategy(),
        delta in delta_strategy(),
    ) {
        let mut moved = a;
        moved.translate(delta);
        prop_assert_eq!(moved.width, a.width);
        prop_assert_eq!(moved.height, a.height);
        prop_assert_eq!(moved.x, a.x + delta.x);
        prop_assert_eq!(moved.y, a.y + delta.y);

        moved.translate(-delta);
        prop_assert_eq!(moved, a);
    }

    #[test]
    fn set_center_lands_the_center(a in aabb_strategy(), target in delta_strategy()) {
        let mut moved = a;
        moved.set_center(target);
        prop_assert_eq!(moved.center(), target);
        prop_assert_eq!(moved.width, a.width);
        prop_assert_eq!(moved.height, a.height);
    }
}
