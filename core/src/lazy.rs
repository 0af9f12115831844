use std::collections::HashMap;
use std::hash::Hash;

pub const PLACEHOLDER_ATTR: &str = "data-src";
pub const LAZY_CLASS: &str = "lazy-loading";
pub const LOADED_CLASS: &str = "loaded";
pub const ERROR_CLASS: &str = "error";
pub const PLACEHOLDER_BACKGROUND: &str = "#f0f0f0";

pub const WATCH_ROOT_MARGIN: &str = "50px";
pub const WATCH_THRESHOLD: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteMode {
    /// Grid listing: the first image loads eagerly, the rest wait for the viewport.
    Preview,
    /// Overlay content: every image is deferred and force-loaded after mount.
    Detail,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageTag {
    pub has_src: bool,
    pub has_placeholder: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferAction {
    /// Left exactly as parsed.
    Keep,
    /// `src` moves into the placeholder attribute and the marker class is merged in.
    Defer,
}

/// Decides, in document order, which images of one fragment get deferred.
///
/// Only images with a `src` take part. Every one of them advances the position
/// counter, including images that already carry a placeholder; those are never
/// touched again.
pub fn plan_deferrals(images: &[ImageTag], mode: RewriteMode) -> Vec<DeferAction> {
    let mut seen = 0usize;
    images
        .iter()
        .map(|image| {
            if !image.has_src {
                return DeferAction::Keep;
            }
            seen += 1;
            if image.has_placeholder {
                return DeferAction::Keep;
            }
            match mode {
                RewriteMode::Detail => DeferAction::Defer,
                RewriteMode::Preview if seen > 1 => DeferAction::Defer,
                RewriteMode::Preview => DeferAction::Keep,
            }
        })
        .collect()
}

pub fn merge_marker_class(existing: Option<&str>) -> String {
    match existing.map(str::trim) {
        Some(classes) if !classes.is_empty() => {
            if classes.split_ascii_whitespace().any(|class| class == LAZY_CLASS) {
                classes.to_string()
            } else {
                format!("{classes} {LAZY_CLASS}")
            }
        }
        _ => LAZY_CLASS.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderContext {
    Thumbnail,
    GalleryItem,
    Other,
}

pub fn placeholder_min_height(context: PlaceholderContext) -> &'static str {
    match context {
        PlaceholderContext::Thumbnail => "150px",
        PlaceholderContext::GalleryItem => "100px",
        PlaceholderContext::Other => "50px",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeferredState {
    Pending { src: String },
    Loading,
    Loaded,
    Errored,
}

impl DeferredState {
    pub fn is_settled(&self) -> bool {
        matches!(self, DeferredState::Loaded | DeferredState::Errored)
    }
}

/// Bookkeeping for deferred images shared by the viewport watcher and the
/// forced detail loads. Each key is claimed for loading at most once; settled
/// records stay until their element is discarded and released.
#[derive(Debug)]
pub struct DeferredImages<K> {
    records: HashMap<K, DeferredState>,
}

impl<K> Default for DeferredImages<K> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> DeferredImages<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the key is already known, in any state.
    pub fn register(&mut self, key: K, src: impl Into<String>) -> bool {
        if self.records.contains_key(&key) {
            return false;
        }
        let src = src.into();
        if src.trim().is_empty() {
            return false;
        }
        self.records.insert(key, DeferredState::Pending { src });
        true
    }

    pub fn state(&self, key: &K) -> Option<&DeferredState> {
        self.records.get(key)
    }

    /// Moves a key into `Loading` and hands back the source to fetch.
    ///
    /// An unknown key is claimed with `unregistered_src` when given, so callers
    /// that never registered an element can still resolve it through here.
    /// Any key already claimed yields `None`.
    pub fn claim(&mut self, key: &K, unregistered_src: Option<&str>) -> Option<String> {
        match self.records.get_mut(key) {
            Some(state) => {
                let DeferredState::Pending { src } = state else {
                    return None;
                };
                let src = std::mem::take(src);
                *state = DeferredState::Loading;
                Some(src)
            }
            None => {
                let src = unregistered_src.map(str::trim).filter(|src| !src.is_empty())?;
                self.records.insert(key.clone(), DeferredState::Loading);
                Some(src.to_string())
            }
        }
    }

    /// Settles a claimed key. Returns the new state, or `None` when the key was
    /// not loading.
    pub fn finish(&mut self, key: &K, loaded: bool) -> Option<&DeferredState> {
        let state = self.records.get_mut(key)?;
        if *state != DeferredState::Loading {
            return None;
        }
        *state = if loaded {
            DeferredState::Loaded
        } else {
            DeferredState::Errored
        };
        Some(state)
    }

    /// Drops a settled record. Pending and loading keys are kept.
    pub fn release(&mut self, key: &K) -> bool {
        if !self.records.get(key).is_some_and(DeferredState::is_settled) {
            return false;
        }
        self.records.remove(key);
        true
    }

    pub fn pending_count(&self) -> usize {
        self.records
            .values()
            .filter(|state| matches!(state, DeferredState::Pending { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
