use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::events::EventListener;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Element, HtmlImageElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

use crate::dom;
use folio_core::lazy::{
    merge_marker_class, placeholder_min_height, plan_deferrals, PlaceholderContext, ERROR_CLASS,
    LAZY_CLASS, LOADED_CLASS, PLACEHOLDER_ATTR, PLACEHOLDER_BACKGROUND, WATCH_ROOT_MARGIN,
    WATCH_THRESHOLD,
};
use folio_core::{DeferAction, DeferredImages, ImageTag, RewriteMode};

const KEY_ATTR: &str = "data-lazy-key";

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

pub(crate) fn rewrite_images(root: &Element, mode: RewriteMode) -> usize {
    let images = dom::query_all(root, "img");
    let tags: Vec<ImageTag> = images
        .iter()
        .map(|img| ImageTag {
            has_src: img
                .get_attribute("src")
                .is_some_and(|src| !src.trim().is_empty()),
            has_placeholder: img.has_attribute(PLACEHOLDER_ATTR),
        })
        .collect();
    let mut deferred = 0;
    for (img, action) in images.iter().zip(plan_deferrals(&tags, mode)) {
        if action != DeferAction::Defer {
            continue;
        }
        let Some(src) = img.get_attribute("src") else {
            continue;
        };
        let _ = img.set_attribute(PLACEHOLDER_ATTR, &src);
        let _ = img.remove_attribute("src");
        let class = merge_marker_class(img.get_attribute("class").as_deref());
        let _ = img.set_attribute("class", &class);
        deferred += 1;
    }
    deferred
}

pub(crate) struct LazyImageWatcher {
    observer: Option<IntersectionObserver>,
    registry: RefCell<DeferredImages<u32>>,
    next_key: Cell<u32>,
    _callback: Option<ObserverCallback>,
}

impl LazyImageWatcher {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let callback: ObserverCallback = Closure::new(
                move |entries: js_sys::Array, _observer: IntersectionObserver| {
                    let Some(watcher) = weak.upgrade() else {
                        return;
                    };
                    watcher.handle_entries(&entries);
                },
            );
            let options = IntersectionObserverInit::new();
            options.set_root_margin(WATCH_ROOT_MARGIN);
            options.set_threshold(&JsValue::from_f64(WATCH_THRESHOLD));
            let observer = match IntersectionObserver::new_with_options(
                callback.as_ref().unchecked_ref(),
                &options,
            ) {
                Ok(observer) => Some(observer),
                Err(err) => {
                    gloo::console::warn!(format!(
                        "lazy images: observer unavailable, loading eagerly: {}",
                        dom::js_err(err)
                    ));
                    None
                }
            };
            Self {
                observer,
                registry: RefCell::new(DeferredImages::new()),
                next_key: Cell::new(1),
                _callback: Some(callback),
            }
        })
    }

    pub(crate) fn register_within(self: &Rc<Self>, root: &Element) -> usize {
        let selector = format!("img[{PLACEHOLDER_ATTR}]");
        dom::query_all(root, &selector)
            .iter()
            .filter(|img| self.register(img))
            .count()
    }

    pub(crate) fn register(self: &Rc<Self>, img: &Element) -> bool {
        let Some(src) = img.get_attribute(PLACEHOLDER_ATTR) else {
            return false;
        };
        let key = self.key_for(img);
        if !self.registry.borrow_mut().register(key, src) {
            return false;
        }
        apply_placeholder_style(img);
        match &self.observer {
            Some(observer) => observer.observe(img),
            None => self.load_visible(img.clone()),
        }
        true
    }

    pub(crate) async fn force_load_and_unregister(self: Rc<Self>, img: Element) {
        if let Some(observer) = &self.observer {
            observer.unobserve(&img);
        }
        let key = self.key_for(&img);
        let placeholder = img.get_attribute(PLACEHOLDER_ATTR);
        let Some(src) = self.registry.borrow_mut().claim(&key, placeholder.as_deref()) else {
            return;
        };
        let _ = img.remove_attribute(PLACEHOLDER_ATTR);
        let Some(image) = img.dyn_ref::<HtmlImageElement>() else {
            self.settle(key, &img, false);
            return;
        };
        let loaded = load_image(image, &src).await;
        self.settle(key, &img, loaded);
    }

    pub(crate) fn release_within(&self, root: &Element) -> usize {
        let selector = format!("img[{KEY_ATTR}]");
        let mut registry = self.registry.borrow_mut();
        dom::query_all(root, &selector)
            .iter()
            .filter_map(element_key)
            .filter(|key| registry.release(key))
            .count()
    }

    fn handle_entries(self: &Rc<Self>, entries: &js_sys::Array) {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if !entry.is_intersecting() {
                continue;
            }
            let target = entry.target();
            if let Some(observer) = &self.observer {
                observer.unobserve(&target);
            }
            self.load_visible(target);
        }
    }

    fn load_visible(self: &Rc<Self>, img: Element) {
        let Some(key) = element_key(&img) else {
            return;
        };
        let Some(src) = self.registry.borrow_mut().claim(&key, None) else {
            return;
        };
        let _ = img.remove_attribute(PLACEHOLDER_ATTR);
        let watcher = Rc::clone(self);
        spawn_local(async move {
            let Ok(probe) = HtmlImageElement::new() else {
                watcher.settle(key, &img, false);
                return;
            };
            let loaded = load_image(&probe, &src).await;
            if loaded {
                if let Some(visible) = img.dyn_ref::<HtmlImageElement>() {
                    visible.set_src(&probe.src());
                }
            }
            watcher.settle(key, &img, loaded);
        });
    }

    fn settle(&self, key: u32, img: &Element, loaded: bool) {
        if self.registry.borrow_mut().finish(&key, loaded).is_none() {
            return;
        }
        dom::remove_class(img, LAZY_CLASS);
        dom::add_class(img, if loaded { LOADED_CLASS } else { ERROR_CLASS });
    }

    fn key_for(&self, img: &Element) -> u32 {
        if let Some(key) = element_key(img) {
            return key;
        }
        let key = self.next_key.get();
        self.next_key.set(key.wrapping_add(1));
        let _ = img.set_attribute(KEY_ATTR, &key.to_string());
        key
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.registry.borrow().len()
    }
}

fn element_key(img: &Element) -> Option<u32> {
    img.get_attribute(KEY_ATTR)?.parse().ok()
}

fn apply_placeholder_style(img: &Element) {
    dom::set_style(img, "background-color", PLACEHOLDER_BACKGROUND);
    let context = if dom::closest(img, ".project-thumbnail").is_some() {
        PlaceholderContext::Thumbnail
    } else if dom::closest(img, ".gallery-item").is_some() {
        PlaceholderContext::GalleryItem
    } else {
        PlaceholderContext::Other
    };
    dom::set_style(img, "min-height", placeholder_min_height(context));
    if !dom::has_class(img, LAZY_CLASS) {
        dom::add_class(img, LAZY_CLASS);
    }
}

/// Points `image` at `src` and waits for `load` (true) or `error` (false).
async fn load_image(image: &HtmlImageElement, src: &str) -> bool {
    let mut listeners = Vec::with_capacity(2);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let on_load = resolve.clone();
        listeners.push(EventListener::once(image, "load", move |_event| {
            let _ = on_load.call1(&JsValue::NULL, &JsValue::TRUE);
        }));
        listeners.push(EventListener::once(image, "error", move |_event| {
            let _ = resolve.call1(&JsValue::NULL, &JsValue::FALSE);
        }));
    });
    image.set_src(src);
    let loaded = JsFuture::from(promise)
        .await
        .map(|value| value.is_truthy())
        .unwrap_or(false);
    drop(listeners);
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_error_panic_hook::set_once as set_panic_hook;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const FRAGMENT: &str = r#"
        <div class="project-preview">
            <div class="project-thumbnail"><img src="cover.jpg" class="wide"></div>
            <img src="two.jpg">
            <img data-src="three.jpg" src="three.jpg">
            <img alt="no source">
            <img src="four.jpg" class="lazy-loading">
        </div>"#;

    fn parsed_root() -> Element {
        let doc = dom::parse_html(FRAGMENT).expect("parse fragment");
        doc.document_element().expect("document element")
    }

    #[wasm_bindgen_test]
    fn preview_rewrite_keeps_only_first_image_eager() {
        set_panic_hook();
        let root = parsed_root();
        let deferred = rewrite_images(&root, RewriteMode::Preview);
        assert_eq!(deferred, 2);

        let images = dom::query_all(&root, "img");
        assert_eq!(images[0].get_attribute("src").as_deref(), Some("cover.jpg"));
        assert_eq!(images[0].get_attribute("class").as_deref(), Some("wide"));
        assert_eq!(images[1].get_attribute("src"), None);
        assert_eq!(images[1].get_attribute("data-src").as_deref(), Some("two.jpg"));
        assert_eq!(images[1].get_attribute("class").as_deref(), Some("lazy-loading"));
        assert_eq!(images[2].get_attribute("src").as_deref(), Some("three.jpg"));
        assert!(!images[3].has_attribute("data-src"));
        assert_eq!(images[4].get_attribute("class").as_deref(), Some("lazy-loading"));
    }

    #[wasm_bindgen_test]
    fn detail_rewrite_defers_everything_and_is_idempotent() {
        set_panic_hook();
        let root = parsed_root();
        assert_eq!(rewrite_images(&root, RewriteMode::Detail), 3);
        assert_eq!(rewrite_images(&root, RewriteMode::Detail), 0);
        let first = dom::query(&root, "img").expect("first image");
        assert_eq!(first.get_attribute("data-src").as_deref(), Some("cover.jpg"));
        assert_eq!(first.get_attribute("class").as_deref(), Some("wide lazy-loading"));
    }

    #[wasm_bindgen_test]
    fn registering_twice_is_a_no_op() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let img = document.create_element("img").expect("create img");
        img.set_attribute("data-src", "missing-image.jpg")
            .expect("set placeholder");
        let watcher = LazyImageWatcher::new();
        assert!(watcher.register(&img));
        assert!(!watcher.register(&img));
        assert_eq!(watcher.tracked(), 1);
        assert!(dom::has_class(&img, LAZY_CLASS));
    }

    #[wasm_bindgen_test(async)]
    async fn forced_load_settles_once_and_clears_placeholder() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let img = document.create_element("img").expect("create img");
        img.set_attribute("data-src", "does-not-exist.png")
            .expect("set placeholder");
        let watcher = LazyImageWatcher::new();
        watcher.register(&img);

        Rc::clone(&watcher)
            .force_load_and_unregister(img.clone())
            .await;
        assert!(!img.has_attribute("data-src"));
        assert!(dom::has_class(&img, ERROR_CLASS));
        assert!(!dom::has_class(&img, LAZY_CLASS));

        // a second force resolves immediately without touching the element
        Rc::clone(&watcher).force_load_and_unregister(img.clone()).await;
        assert!(!dom::has_class(&img, LOADED_CLASS));
        assert_eq!(watcher.tracked(), 1);
    }

    #[wasm_bindgen_test(async)]
    async fn force_after_viewport_claim_does_not_reload() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let img = document.create_element("img").expect("create img");
        img.set_attribute("data-src", "viewport-missing.png")
            .expect("set placeholder");
        let watcher = LazyImageWatcher::new();
        assert!(watcher.register(&img));

        watcher.load_visible(img.clone());
        assert!(!img.has_attribute("data-src"));

        Rc::clone(&watcher).force_load_and_unregister(img.clone()).await;
        assert_eq!(img.get_attribute("src"), None);
        assert!(dom::has_class(&img, LAZY_CLASS));
        assert!(!dom::has_class(&img, LOADED_CLASS));
        assert!(!dom::has_class(&img, ERROR_CLASS));
        assert_eq!(watcher.tracked(), 1);
    }

    #[wasm_bindgen_test(async)]
    async fn release_drops_only_settled_images() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let root = document.create_element("div").expect("create root");
        root.set_inner_html(r#"<img data-src="settled-missing.png"><img data-src="waiting.png">"#);
        let images = dom::query_all(&root, "img");
        let watcher = LazyImageWatcher::new();
        assert_eq!(watcher.register_within(&root), 2);

        Rc::clone(&watcher)
            .force_load_and_unregister(images[0].clone())
            .await;
        assert_eq!(watcher.release_within(&root), 1);
        assert_eq!(watcher.tracked(), 1);
        assert!(!watcher.register(&images[1]));
        assert_eq!(watcher.release_within(&root), 0);
    }
}
