use folio_core::detail::{gallery_source, gallery_sources, DetailError};
use folio_core::{DetailExclusion, DetailPhase};

fn exclusion() -> DetailExclusion<&'static str> {
    DetailExclusion::new(["academic", "practice", "contact"])
}

#[test]
fn activation_blocks_every_other_section() {
    let mut details = exclusion();
    let displaced = details.mount("practice", "detail-1").expect("known section");
    assert!(displaced.is_none());
    assert_eq!(details.phase(), Some(DetailPhase::MountedInactive));
    assert!(details.blocked().is_empty());

    let blocked = details.activate();
    assert_eq!(blocked, vec!["academic", "contact"]);
    assert_eq!(details.phase(), Some(DetailPhase::Active));
    assert!(details.is_blocked("contact"));
    assert!(!details.is_blocked("practice"));
}

#[test]
fn closing_clears_every_overlay_and_empties_the_slot() {
    let mut details = exclusion();
    details.mount("academic", "detail-1").expect("known section");
    details.activate();

    let closing = details.begin_close().expect("detail was open");
    assert_eq!(closing.handle, "detail-1");
    assert_eq!(closing.owner, "academic");
    assert_eq!(closing.unblock, vec!["academic", "practice", "contact"]);
    assert!(!details.is_open());
    assert!(details.blocked().is_empty());
    assert!(details.begin_close().is_none());
}

#[test]
fn mounting_again_displaces_the_previous_detail() {
    let mut details = exclusion();
    details.mount("academic", "first").expect("known section");
    details.activate();

    let displaced = details
        .mount("contact", "second")
        .expect("known section")
        .expect("first detail displaced");
    assert_eq!(displaced.handle, "first");
    assert_eq!(details.owner(), Some("contact"));
    assert_eq!(details.handle(), Some(&"second"));
    assert_eq!(details.activate(), vec!["academic", "practice"]);
}

#[test]
fn repeated_cycles_leave_nothing_behind() {
    let mut details = DetailExclusion::new(["academic", "practice", "contact"]);
    for round in 0..3 {
        details.mount("practice", round).expect("known section");
        assert_eq!(details.activate().len(), 2);
        assert_eq!(details.begin_close().map(|closing| closing.handle), Some(round));
        assert!(details.blocked().is_empty());
        assert!(!details.is_open());
    }
}

#[test]
fn click_outside_only_closes_the_owner() {
    let mut details = exclusion();
    details.mount("academic", "detail").expect("known section");
    details.activate();
    assert!(details.close_owned_by("contact").is_none());
    assert!(details.is_open());
    assert!(details.close_owned_by("academic").is_some());
    assert!(!details.is_open());
}

#[test]
fn unknown_sections_are_rejected() {
    let mut details = exclusion();
    let err = details.mount("missing", "detail").err();
    assert_eq!(err, Some(DetailError::UnknownSection("missing".to_string())));
    assert!(!details.is_open());
}

#[test]
fn gallery_sources_prefer_pending_placeholders() {
    assert_eq!(gallery_source(Some("a.jpg"), Some("blank.gif")), Some("a.jpg".to_string()));
    assert_eq!(gallery_source(None, Some("b.jpg")), Some("b.jpg".to_string()));
    assert_eq!(gallery_source(Some(""), Some("c.jpg")), Some("c.jpg".to_string()));
    assert_eq!(gallery_source(None, None), None);

    let sources = gallery_sources([
        (Some("one.jpg"), None),
        (None, Some("two.jpg")),
        (None, Some("  ")),
        (Some("three.jpg"), Some("three.jpg")),
    ]);
    assert_eq!(sources, vec!["one.jpg", "two.jpg", "three.jpg"]);
}
