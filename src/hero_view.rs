use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use web_sys::{Document, Element, Event, Window};

use crate::dom;
use crate::session_store;
use folio_core::hero::{HeroAnimator, HeroFrame, HeroMetrics};

const COLLAPSED_CLASS: &str = "is-collapsed";
const STATIC_NAVBAR_CLASS: &str = "hero--static-navbar";

pub(crate) struct HeroView {
    window: Window,
    hero: Element,
    spacer: Option<Element>,
    logo: Option<Element>,
    nav: Option<Element>,
    indicator: Option<Element>,
    animator: RefCell<HeroAnimator>,
    frame: RefCell<Option<AnimationFrame>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl HeroView {
    pub(crate) fn attach(document: &Document) -> Option<Rc<Self>> {
        let window = web_sys::window()?;
        let hero = document.get_element_by_id("hero")?;
        let spacer = document.get_element_by_id("hero-spacer");
        if dom::has_class(&hero, STATIC_NAVBAR_CLASS) {
            return None;
        }
        if session_store::hero_seen() {
            dom::add_class(&hero, STATIC_NAVBAR_CLASS);
            if let Some(spacer) = &spacer {
                dom::set_style(spacer, "display", "none");
            }
            window.scroll_to_with_x_and_y(0.0, 0.0);
            return None;
        }

        let root = document.document_element()?;
        let view = Rc::new(Self {
            logo: dom::query(&root, ".hero__logo-img"),
            nav: dom::query(&root, ".hero__nav"),
            indicator: dom::query(&root, ".hero__scroll-indicator"),
            window,
            hero,
            spacer,
            animator: RefCell::new(HeroAnimator::new()),
            frame: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });
        view.install_listeners();
        view.size_spacer();
        view.apply();
        Some(view)
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = Vec::new();
        let view = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &self.window,
            "scroll",
            EventListenerOptions {
                phase: EventListenerPhase::Bubble,
                passive: true,
            },
            move |_event: &Event| {
                if let Some(view) = view.upgrade() {
                    view.schedule();
                }
            },
        ));
        let view = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.window, "resize", move |_event: &Event| {
            let Some(view) = view.upgrade() else {
                return;
            };
            view.size_spacer();
            view.animator.borrow_mut().invalidate();
            view.apply();
        }));
        *self.listeners.borrow_mut() = listeners;
    }

    // one pending frame at a time
    fn schedule(self: &Rc<Self>) {
        if self.frame.borrow().is_some() {
            return;
        }
        let view = Rc::downgrade(self);
        let handle = request_animation_frame(move |_timestamp| {
            let Some(view) = view.upgrade() else {
                return;
            };
            view.frame.borrow_mut().take();
            view.apply();
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn metrics(&self) -> Option<HeroMetrics> {
        let viewport_width = self.window.inner_width().ok()?.as_f64()?;
        let viewport_height = self.window.inner_height().ok()?.as_f64()?;
        Some(HeroMetrics {
            viewport_width,
            viewport_height,
        })
    }

    fn size_spacer(&self) {
        let (Some(spacer), Some(metrics)) = (&self.spacer, self.metrics()) else {
            return;
        };
        dom::set_style(spacer, "height", &format!("{}px", metrics.viewport_height));
    }

    fn apply(&self) {
        let Some(metrics) = self.metrics() else {
            return;
        };
        let scroll_y = self.window.scroll_y().unwrap_or(0.0);
        let update = self.animator.borrow_mut().update(scroll_y, &metrics);
        let Some(update) = update else {
            return;
        };
        let collapsed = self.animator.borrow().is_collapsed();
        if !collapsed {
            self.write_heights(&update.frame);
        }
        self.write_fades(&update.frame);
        match update.collapse_changed {
            Some(true) => self.collapse(),
            Some(false) => self.expand(),
            None => {}
        }
    }

    fn write_heights(&self, frame: &HeroFrame) {
        dom::set_style(&self.hero, "height", &format!("{}px", frame.hero_height));
        if let Some(logo) = &self.logo {
            dom::set_style(logo, "height", &format!("{}px", frame.logo_height));
        }
    }

    fn write_fades(&self, frame: &HeroFrame) {
        if let Some(nav) = &self.nav {
            dom::set_style(nav, "opacity", &frame.nav_opacity.to_string());
        }
        if let Some(indicator) = &self.indicator {
            dom::set_style(indicator, "opacity", &frame.indicator_opacity.to_string());
            let visibility = if frame.indicator_hidden { "hidden" } else { "visible" };
            dom::set_style(indicator, "visibility", visibility);
        }
    }

    fn collapse(&self) {
        dom::add_class(&self.hero, COLLAPSED_CLASS);
        dom::add_class(&self.hero, STATIC_NAVBAR_CLASS);
        dom::clear_style(&self.hero, "height");
        if let Some(logo) = &self.logo {
            dom::clear_style(logo, "height");
        }
        session_store::mark_hero_seen();
    }

    fn expand(&self) {
        dom::remove_class(&self.hero, COLLAPSED_CLASS);
        dom::remove_class(&self.hero, STATIC_NAVBAR_CLASS);
    }
}
