use std::collections::BTreeSet;

use super::*;
use crate::content::builder::{ContentModelBuilder, caption};

fn model_with(products: &[(&str, bool, usize)], unassigned: usize) -> ContentModel {
    let mut b = ContentModelBuilder::new(".").content_type("hook").unwrap();
    for (name, prevent, count) in products {
        b = b.product("hook", *name, *prevent).unwrap();
        for i in 0..*count {
            b = b
                .image("hook", format!("{name}_{i}.png"), Some(*name), 8, 8)
                .unwrap();
        }
    }
    for i in 0..unassigned {
        b = b.image("hook", format!("free_{i}.png"), None, 8, 8).unwrap();
    }
    b.row(vec![caption("hook", "all", "x").unwrap()])
        .build()
        .unwrap()
}

fn zinc() -> ProductSelector {
    ProductSelector::Specific("zinc".to_string())
}

#[test]
fn prevent_duplicates_never_repeats_then_raises() {
    let model = model_with(&[("zinc", true, 4)], 0);
    let mut alloc = Allocator::new(&model, AllocPolicy::default(), 7);

    let mut seen = BTreeSet::new();
    for _ in 0..4 {
        let img = alloc.allocate("hook", &zinc(), 1).unwrap();
        assert!(seen.insert(img.index), "image {} returned twice", img.index);
    }
    assert!(alloc.usage().is_exhausted("hook", "zinc"));

    let err = alloc.allocate("hook", &zinc(), 1).unwrap_err();
    match err {
        SlideError::ExhaustedPool {
            content_type,
            selector,
            ..
        } => {
            assert_eq!(content_type, "hook");
            assert_eq!(selector, "zinc");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicates_allowed_never_exhausts() {
    let model = model_with(&[("zinc", false, 1)], 0);
    let mut alloc = Allocator::new(&model, AllocPolicy::default(), 1);
    for _ in 0..50 {
        let img = alloc.allocate("hook", &zinc(), 1).unwrap();
        assert_eq!(img.index, 0);
    }
    assert_eq!(alloc.usage().remaining("hook", "zinc"), None);
}

#[test]
fn override_disables_exhaustion() {
    let model = model_with(&[("zinc", true, 2)], 0);
    let policy = AllocPolicy {
        allow_all_duplicates: true,
        ..AllocPolicy::default()
    };
    let mut alloc = Allocator::new(&model, policy, 3);
    for _ in 0..20 {
        alloc.allocate("hook", &zinc(), 1).unwrap();
        alloc.allocate("hook", &ProductSelector::Any, 1).unwrap();
    }
}

#[test]
fn wildcard_skips_exhausted_product() {
    let model = model_with(&[("zinc", true, 1), ("iron", false, 1)], 0);
    let mut alloc = Allocator::new(&model, AllocPolicy::default(), 11);

    let first = alloc.allocate("hook", &zinc(), 1).unwrap();
    assert_eq!(first.product.as_deref(), Some("zinc"));

    for _ in 0..20 {
        let img = alloc.allocate("hook", &ProductSelector::Any, 1).unwrap();
        assert_eq!(img.product.as_deref(), Some("iron"));
    }
    assert!(alloc.allocate("hook", &zinc(), 1).is_err());
}

#[test]
fn wildcard_consumes_duplicate_preventing_images() {
    let model = model_with(&[("zinc", true, 2)], 0);
    let mut alloc = Allocator::new(&model, AllocPolicy::default(), 5);

    let a = alloc.allocate("hook", &ProductSelector::Any, 1).unwrap().index;
    let b = alloc.allocate("hook", &ProductSelector::Any, 1).unwrap().index;
    assert_ne!(a, b);

    let err = alloc
        .allocate("hook", &ProductSelector::Any, 1)
        .unwrap_err();
    assert!(err.to_string().contains("product 'all'"));
}

#[test]
fn unassigned_images_keep_wildcard_alive() {
    let model = model_with(&[("zinc", true, 1)], 1);
    let mut alloc = Allocator::new(&model, AllocPolicy::default(), 9);
    for _ in 0..10 {
        alloc.allocate("hook", &ProductSelector::Any, 1).unwrap();
    }
}

#[test]
fn variation_scope_resets_between_variations() {
    let model = model_with(&[("zinc", true, 1)], 0);
    let mut alloc = Allocator::new(&model, AllocPolicy::default(), 2);
    alloc.allocate("hook", &zinc(), 1).unwrap();
    assert!(alloc.allocate("hook", &zinc(), 1).is_err());
    alloc.allocate("hook", &zinc(), 2).unwrap();
}

#[test]
fn run_scope_spans_variations() {
    let model = model_with(&[("zinc", true, 1)], 0);
    let policy = AllocPolicy {
        scope: DuplicateScope::Run,
        ..AllocPolicy::default()
    };
    let mut alloc = Allocator::new(&model, policy, 2);
    alloc.allocate("hook", &zinc(), 1).unwrap();
    assert!(alloc.allocate("hook", &zinc(), 2).is_err());
}

#[test]
fn usage_state_round_trips_through_allocator() {
    let model = model_with(&[("zinc", true, 2)], 0);
    let policy = AllocPolicy {
        scope: DuplicateScope::Run,
        ..AllocPolicy::default()
    };
    let mut alloc = Allocator::new(&model, policy, 4);
    alloc.allocate("hook", &zinc(), 1).unwrap();
    let usage = alloc.into_usage();
    assert_eq!(usage.remaining("hook", "zinc"), Some(1));

    let mut resumed = Allocator::with_usage(&model, policy, 4, usage);
    resumed.allocate("hook", &zinc(), 1).unwrap();
    assert!(resumed.allocate("hook", &zinc(), 1).is_err());
}

#[test]
fn empty_product_pool_raises_for_direct_requests() {
    let model = model_with(&[("zinc", false, 0), ("iron", false, 1)], 0);
    let mut alloc = Allocator::new(&model, AllocPolicy::default(), 0);
    assert!(matches!(
        alloc.allocate("hook", &zinc(), 1),
        Err(SlideError::ExhaustedPool { .. })
    ));
    alloc.allocate("hook", &ProductSelector::Any, 1).unwrap();
}

#[test]
fn same_seed_same_sequence() {
    let model = model_with(&[("zinc", true, 10), ("iron", false, 4)], 3);
    let run = |seed: u64| -> Vec<usize> {
        let mut alloc = Allocator::new(&model, AllocPolicy::default(), seed);
        (0..8)
            .map(|i| {
                let sel = if i % 2 == 0 { zinc() } else { ProductSelector::Any };
                alloc.allocate("hook", &sel, 1).unwrap().index
            })
            .collect()
    };
    assert_eq!(run(42), run(42));
}
