use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlImageElement, KeyboardEvent};

use crate::dom;
use folio_core::{GalleryKey, GalleryState};

const ACTIVE_CLASS: &str = "active";

pub(crate) struct FullscreenGallery {
    document: Document,
    root: Element,
    image: HtmlImageElement,
    close_btn: Option<Element>,
    prev_btn: Option<Element>,
    next_btn: Option<Element>,
    state: RefCell<GalleryState>,
    keydown: RefCell<Option<EventListener>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl FullscreenGallery {
    pub(crate) fn attach(document: &Document) -> Option<Rc<Self>> {
        let root = document.get_element_by_id("fullscreen-gallery")?;
        let image = document
            .get_element_by_id("fullscreen-image")?
            .dyn_into::<HtmlImageElement>()
            .ok()?;
        let gallery = Rc::new(Self {
            document: document.clone(),
            close_btn: dom::query(&root, ".close-gallery-btn"),
            prev_btn: dom::query(&root, ".prev-gallery-btn"),
            next_btn: dom::query(&root, ".next-gallery-btn"),
            root,
            image,
            state: RefCell::new(GalleryState::new()),
            keydown: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });
        gallery.install_listeners();
        Some(gallery)
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = Vec::new();
        if let Some(button) = &self.close_btn {
            let gallery = Rc::downgrade(self);
            listeners.push(EventListener::new(button, "click", move |_event: &Event| {
                if let Some(gallery) = gallery.upgrade() {
                    gallery.close();
                }
            }));
        }
        if let Some(button) = &self.prev_btn {
            let gallery = Rc::downgrade(self);
            listeners.push(EventListener::new(button, "click", move |_event: &Event| {
                if let Some(gallery) = gallery.upgrade() {
                    gallery.step(-1);
                }
            }));
        }
        if let Some(button) = &self.next_btn {
            let gallery = Rc::downgrade(self);
            listeners.push(EventListener::new(button, "click", move |_event: &Event| {
                if let Some(gallery) = gallery.upgrade() {
                    gallery.step(1);
                }
            }));
        }
        let gallery = Rc::downgrade(self);
        let root = self.root.clone();
        listeners.push(EventListener::new(&self.root, "click", move |event: &Event| {
            let on_background = dom::event_element(event).is_some_and(|target| target == root);
            if !on_background {
                return;
            }
            if let Some(gallery) = gallery.upgrade() {
                gallery.close();
            }
        }));
        *self.listeners.borrow_mut() = listeners;
    }

    pub(crate) fn open(self: &Rc<Self>, images: Vec<String>, start: &str) {
        if self.state.borrow_mut().open(images, start).is_none() {
            return;
        }
        self.show_current();
        dom::add_class(&self.root, ACTIVE_CLASS);
        if self.keydown.borrow().is_none() {
            let listener = self.key_listener();
            *self.keydown.borrow_mut() = Some(listener);
        }
    }

    pub(crate) fn close(&self) {
        dom::remove_class(&self.root, ACTIVE_CLASS);
        self.state.borrow_mut().close();
        let listener = self.keydown.borrow_mut().take();
        drop(listener);
    }

    pub(crate) fn step(&self, direction: isize) {
        if self.state.borrow_mut().navigate(direction).is_some() {
            self.show_current();
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    fn show_current(&self) {
        let state = self.state.borrow();
        let Some(src) = state.current() else {
            return;
        };
        self.image.set_src(src);
        let display = if state.controls_visible() { "block" } else { "none" };
        for button in [&self.prev_btn, &self.next_btn].into_iter().flatten() {
            dom::set_style(button, "display", display);
        }
    }

    fn key_listener(self: &Rc<Self>) -> EventListener {
        let gallery: Weak<Self> = Rc::downgrade(self);
        EventListener::new(&self.document, "keydown", move |event: &Event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let Some(gallery) = gallery.upgrade() else {
                return;
            };
            if !gallery.is_open() {
                return;
            }
            match GalleryKey::from_key(&event.key()) {
                Some(GalleryKey::Next) => gallery.step(1),
                Some(GalleryKey::Previous) => gallery.step(-1),
                Some(GalleryKey::Close) => gallery.close(),
                None => {}
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn has_key_listener(&self) -> bool {
        self.keydown.borrow().is_some()
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> usize {
        self.state.borrow().index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_error_panic_hook::set_once as set_panic_hook;
    use wasm_bindgen_test::*;
    use web_sys::KeyboardEventInit;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount_gallery_markup(document: &Document) -> Element {
        let host = document.create_element("div").expect("create host");
        host.set_inner_html(
            r#"<div id="fullscreen-gallery">
                <img id="fullscreen-image" alt="">
                <button class="close-gallery-btn"></button>
                <button class="prev-gallery-btn"></button>
                <button class="next-gallery-btn"></button>
            </div>"#,
        );
        document
            .body()
            .expect("body available")
            .append_child(&host)
            .expect("append gallery host");
        host
    }

    fn press(document: &Document, key: &str) {
        let init = KeyboardEventInit::new();
        init.set_key(key);
        let event =
            KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).expect("key event");
        document.dispatch_event(&event).expect("dispatch key");
    }

    #[wasm_bindgen_test]
    fn keyboard_listener_lives_only_while_open() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let host = mount_gallery_markup(&document);
        let gallery = FullscreenGallery::attach(&document).expect("gallery markup");
        let images = vec!["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()];

        for _ in 0..3 {
            gallery.open(images.clone(), "b.jpg");
            assert!(gallery.has_key_listener());
            assert_eq!(gallery.index(), 1);
            press(&document, "ArrowRight");
            press(&document, "ArrowRight");
            assert_eq!(gallery.index(), 0);
            press(&document, "Left");
            assert_eq!(gallery.index(), 2);
            press(&document, "Escape");
            assert!(!gallery.is_open());
            assert!(!gallery.has_key_listener());
        }

        press(&document, "ArrowRight");
        assert_eq!(gallery.index(), 0);
        host.remove();
    }

    #[wasm_bindgen_test]
    fn single_image_hides_navigation() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let host = mount_gallery_markup(&document);
        let gallery = FullscreenGallery::attach(&document).expect("gallery markup");
        gallery.open(vec!["only.jpg".to_string()], "elsewhere.jpg");
        let prev = dom::query(&host, ".prev-gallery-btn").expect("prev button");
        assert_eq!(prev.get_attribute("style").as_deref(), Some("display: none;"));
        assert!(dom::has_class(&gallery.root, ACTIVE_CLASS));
        gallery.close();
        assert!(!dom::has_class(&gallery.root, ACTIVE_CLASS));
        host.remove();
    }
}
