use std::cell::Cell;

use web_sys::Storage;

const HERO_SEEN_KEY: &str = "heroSeen";

thread_local! {
    static HERO_SEEN_CACHE: Cell<Option<bool>> = const { Cell::new(None) };
}

fn session_storage() -> Option<Storage> {
    web_sys::window()?.session_storage().ok().flatten()
}

// unavailable storage reads as not seen
pub(crate) fn hero_seen() -> bool {
    if let Some(seen) = HERO_SEEN_CACHE.with(Cell::get) {
        return seen;
    }
    let seen = session_storage()
        .and_then(|storage| storage.get_item(HERO_SEEN_KEY).ok().flatten())
        .is_some_and(|value| value == "true");
    HERO_SEEN_CACHE.with(|slot| slot.set(Some(seen)));
    seen
}

pub(crate) fn mark_hero_seen() {
    HERO_SEEN_CACHE.with(|slot| slot.set(Some(true)));
    if let Some(storage) = session_storage() {
        let _ = storage.set_item(HERO_SEEN_KEY, "true");
    }
}
