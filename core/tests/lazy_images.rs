use folio_core::lazy::{
    merge_marker_class, placeholder_min_height, plan_deferrals, PlaceholderContext, LAZY_CLASS,
};
use folio_core::{DeferAction, DeferredImages, DeferredState, ImageTag, RewriteMode};

fn images(count: usize) -> Vec<ImageTag> {
    vec![
        ImageTag {
            has_src: true,
            has_placeholder: false,
        };
        count
    ]
}

fn count(plan: &[DeferAction], action: DeferAction) -> usize {
    plan.iter().filter(|entry| **entry == action).count()
}

#[test]
fn preview_keeps_exactly_the_first_image_eager() {
    for k in 1..=6 {
        let plan = plan_deferrals(&images(k), RewriteMode::Preview);
        assert_eq!(count(&plan, DeferAction::Keep), 1, "k = {k}");
        assert_eq!(count(&plan, DeferAction::Defer), k - 1, "k = {k}");
        assert_eq!(plan[0], DeferAction::Keep);
    }
    assert!(plan_deferrals(&[], RewriteMode::Preview).is_empty());
}

#[test]
fn detail_defers_every_image() {
    for k in 0..=6 {
        let plan = plan_deferrals(&images(k), RewriteMode::Detail);
        assert_eq!(count(&plan, DeferAction::Defer), k, "k = {k}");
    }
}

#[test]
fn images_without_src_are_left_alone_and_not_counted() {
    let tags = [
        ImageTag {
            has_src: false,
            has_placeholder: false,
        },
        ImageTag {
            has_src: true,
            has_placeholder: false,
        },
        ImageTag {
            has_src: true,
            has_placeholder: false,
        },
    ];
    let plan = plan_deferrals(&tags, RewriteMode::Preview);
    assert_eq!(
        plan,
        vec![DeferAction::Keep, DeferAction::Keep, DeferAction::Defer]
    );
}

#[test]
fn already_deferred_images_are_never_rewritten_again() {
    let tags = [
        ImageTag {
            has_src: true,
            has_placeholder: true,
        },
        ImageTag {
            has_src: true,
            has_placeholder: false,
        },
    ];
    assert_eq!(
        plan_deferrals(&tags, RewriteMode::Preview),
        vec![DeferAction::Keep, DeferAction::Defer]
    );
    assert_eq!(
        plan_deferrals(&tags, RewriteMode::Detail),
        vec![DeferAction::Keep, DeferAction::Defer]
    );
}

#[test]
fn marker_class_is_merged_once() {
    assert_eq!(merge_marker_class(None), LAZY_CLASS);
    assert_eq!(merge_marker_class(Some("  ")), LAZY_CLASS);
    assert_eq!(merge_marker_class(Some("hero wide")), "hero wide lazy-loading");
    assert_eq!(
        merge_marker_class(Some("hero lazy-loading")),
        "hero lazy-loading"
    );
}

#[test]
fn placeholder_heights_depend_on_context() {
    assert_eq!(placeholder_min_height(PlaceholderContext::Thumbnail), "150px");
    assert_eq!(placeholder_min_height(PlaceholderContext::GalleryItem), "100px");
    assert_eq!(placeholder_min_height(PlaceholderContext::Other), "50px");
}

#[test]
fn element_is_registered_only_once() {
    let mut registry = DeferredImages::new();
    assert!(registry.register(1u32, "a.jpg"));
    assert!(!registry.register(1u32, "b.jpg"));
    assert!(!registry.register(2u32, "   "));
    assert_eq!(registry.pending_count(), 1);
    assert_eq!(
        registry.state(&1),
        Some(&DeferredState::Pending {
            src: "a.jpg".to_string()
        })
    );
}

#[test]
fn second_resolution_is_a_no_op() {
    let mut registry = DeferredImages::new();
    registry.register(7u32, "photo.jpg");

    assert_eq!(registry.claim(&7, None), Some("photo.jpg".to_string()));
    assert_eq!(registry.claim(&7, Some("photo.jpg")), None);
    assert_eq!(registry.finish(&7, true), Some(&DeferredState::Loaded));
    assert_eq!(registry.claim(&7, Some("photo.jpg")), None);
    assert_eq!(registry.finish(&7, false), None);
    assert!(!registry.register(7, "photo.jpg"));
}

#[test]
fn unregistered_elements_can_still_be_forced() {
    let mut registry = DeferredImages::new();
    assert_eq!(registry.claim(&3u32, None), None);
    assert!(registry.is_empty());

    assert_eq!(
        registry.claim(&3u32, Some("detail.jpg")),
        Some("detail.jpg".to_string())
    );
    assert_eq!(registry.state(&3), Some(&DeferredState::Loading));
    assert_eq!(registry.finish(&3, false), Some(&DeferredState::Errored));
    assert!(registry.state(&3).is_some_and(DeferredState::is_settled));
}

#[test]
fn releasing_settled_records_keeps_the_registry_bounded() {
    let mut registry = DeferredImages::new();
    for key in 0..1000u32 {
        assert!(registry.register(key, format!("img-{key}.jpg")));
        assert!(registry.claim(&key, None).is_some());
        assert!(registry.finish(&key, key % 2 == 0).is_some());
        assert!(registry.release(&key));
    }
    assert!(registry.is_empty());
}

#[test]
fn release_keeps_pending_and_loading_keys() {
    let mut registry = DeferredImages::new();
    registry.register(1u32, "a.jpg");
    registry.register(2u32, "b.jpg");
    registry.claim(&2, None);

    assert!(!registry.release(&1));
    assert!(!registry.release(&2));
    assert!(!registry.release(&9));
    assert_eq!(registry.len(), 2);
    assert!(!registry.register(1, "a.jpg"));
    assert_eq!(registry.pending_count(), 1);
}
