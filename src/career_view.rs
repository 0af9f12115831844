use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::console::{error, log};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlImageElement, KeyboardEvent, Window};

use crate::dom;
use crate::fetch::HttpSource;
use crate::hero_view::HeroView;
use folio_core::career::{
    self, AnchorRect, CareerData, EscapeTarget, Project, Subcategory, Viewport,
    EMPTY_PROJECTS_LABEL, POPOVER_CLOSE_DELAY_MS,
};
use folio_core::FragmentSource;

const OPEN_CLASS: &str = "is-open";
const LOAD_FAILED_MESSAGE: &str = "Unable to load data. Please refresh the page.";
const NO_CATEGORIES_MESSAGE: &str = "No categories found.";

fn set_open(element: &Element, open: bool) {
    if open {
        dom::add_class(element, OPEN_CLASS);
    } else {
        dom::remove_class(element, OPEN_CLASS);
    }
    let _ = element.set_attribute("aria-hidden", if open { "false" } else { "true" });
}

fn create(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    element.set_class_name(class);
    Ok(element)
}

fn external_link(document: &Document, href: &str, text: &str) -> Result<Element, JsValue> {
    let link = document.create_element("a")?;
    link.set_attribute("href", href)?;
    link.set_attribute("target", "_blank")?;
    link.set_attribute("rel", "noopener noreferrer")?;
    link.set_text_content(Some(text));
    Ok(link)
}

fn viewport(window: &Window) -> Option<Viewport> {
    Some(Viewport {
        width: window.inner_width().ok()?.as_f64()?,
        height: window.inner_height().ok()?.as_f64()?,
    })
}

struct VideoModal {
    document: Document,
    root: Element,
    content: Element,
}

impl VideoModal {
    fn attach(document: &Document) -> Option<Self> {
        Some(Self {
            document: document.clone(),
            root: document.get_element_by_id("video-modal")?,
            content: document.get_element_by_id("video-modal-content")?,
        })
    }

    fn is_open(&self) -> bool {
        dom::has_class(&self.root, OPEN_CLASS)
    }

    fn open(&self, url: &str) -> Result<(), JsValue> {
        let Some(bvid) = career::bilibili_id(url) else {
            dom::open_in_new_tab(url);
            return Ok(());
        };
        let iframe = self.document.create_element("iframe")?;
        iframe.set_attribute("src", &career::bilibili_embed_url(bvid))?;
        for (name, value) in [
            ("scrolling", "no"),
            ("border", "0"),
            ("frameborder", "no"),
            ("framespacing", "0"),
            ("allowfullscreen", "true"),
        ] {
            iframe.set_attribute(name, value)?;
        }
        self.content.set_inner_html("");
        self.content.append_child(&iframe)?;
        set_open(&self.root, true);
        if let Some(body) = self.document.body() {
            dom::set_style(&body, "overflow", "hidden");
        }
        Ok(())
    }

    fn close(&self) {
        set_open(&self.root, false);
        self.content.set_inner_html("");
        if let Some(body) = self.document.body() {
            dom::clear_style(&body, "overflow");
        }
    }
}

struct QrLightbox {
    root: Element,
    image: Option<HtmlImageElement>,
}

impl QrLightbox {
    fn attach(document: &Document) -> Option<Self> {
        let root = document.get_element_by_id("qr-lightbox")?;
        let image = document
            .get_element_by_id("qr-lightbox-image")
            .and_then(|image| image.dyn_into::<HtmlImageElement>().ok());
        Some(Self { root, image })
    }

    fn is_open(&self) -> bool {
        dom::has_class(&self.root, OPEN_CLASS)
    }

    fn open(&self, src: &str) {
        if let Some(image) = &self.image {
            image.set_src(src);
        }
        set_open(&self.root, true);
    }

    fn close(&self) {
        set_open(&self.root, false);
    }
}

struct Popover {
    root: Element,
    backdrop: Element,
    links: Element,
    target: RefCell<Option<Element>>,
    hovered: RefCell<Option<Element>>,
    pointer_inside: Cell<bool>,
    close_generation: Cell<u64>,
    link_listeners: RefCell<Vec<EventListener>>,
}

impl Popover {
    fn attach(document: &Document) -> Option<Self> {
        Some(Self {
            root: document.get_element_by_id("popover")?,
            backdrop: document.get_element_by_id("popover-backdrop")?,
            links: document.get_element_by_id("popover-links")?,
            target: RefCell::new(None),
            hovered: RefCell::new(None),
            pointer_inside: Cell::new(false),
            close_generation: Cell::new(0),
            link_listeners: RefCell::new(Vec::new()),
        })
    }

    fn is_open(&self) -> bool {
        dom::has_class(&self.root, OPEN_CLASS)
    }

    fn close(&self) {
        set_open(&self.root, false);
        dom::remove_class(&self.backdrop, OPEN_CLASS);
        self.target.borrow_mut().take();
    }

    fn cancel_close(&self) {
        self.close_generation.set(self.close_generation.get() + 1);
    }

    fn position(&self, window: &Window) {
        let target = self.target.borrow();
        let (Some(target), Some(viewport)) = (target.as_ref(), viewport(window)) else {
            return;
        };
        let rect = target.get_bounding_client_rect();
        let anchor = AnchorRect {
            left: rect.left(),
            right: rect.right(),
            top: rect.top(),
        };
        let (left, top) = career::popover_position(anchor, viewport);
        dom::set_style(&self.root, "left", &format!("{left}px"));
        dom::set_style(&self.root, "top", &format!("{top}px"));
    }
}

pub(crate) struct CareerPage {
    document: Document,
    window: Window,
    grid: Option<Element>,
    _hero: Option<Rc<HeroView>>,
    popover: Option<Popover>,
    video: Option<VideoModal>,
    qr: Option<QrLightbox>,
    card_listeners: RefCell<Vec<EventListener>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl CareerPage {
    pub(crate) fn start(document: &Document, data_path: String) -> Result<Rc<Self>, JsValue> {
        let page = Self::new(document)?;
        if page.grid.is_some() {
            let loading = Rc::clone(&page);
            spawn_local(async move {
                loading.load(&data_path).await;
            });
        }
        Ok(page)
    }

    pub(crate) fn new(document: &Document) -> Result<Rc<Self>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
        let page = Rc::new(Self {
            document: document.clone(),
            window,
            grid: document.get_element_by_id("categories-grid"),
            _hero: HeroView::attach(document),
            popover: Popover::attach(document),
            video: VideoModal::attach(document),
            qr: QrLightbox::attach(document),
            card_listeners: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        });
        page.install_listeners();
        Ok(page)
    }

    async fn load(self: &Rc<Self>, path: &str) {
        let text = match HttpSource.fetch_text(path).await {
            Ok(text) => text,
            Err(err) => {
                error!(format!("career: failed to load {path}: {err}"));
                self.show_message(LOAD_FAILED_MESSAGE);
                return;
            }
        };
        match career::parse_career_data(&text) {
            Ok(data) => {
                if let Err(err) = self.render_grid(&data) {
                    error!(format!("career: render failed: {}", dom::js_err(err)));
                }
            }
            Err(err) => {
                error!(format!("career: invalid data in {path}: {err}"));
                self.show_message(LOAD_FAILED_MESSAGE);
            }
        }
    }

    fn show_message(&self, message: &str) {
        let Some(grid) = &self.grid else {
            return;
        };
        grid.set_inner_html("");
        let Ok(wrapper) = self.document.create_element("div") else {
            return;
        };
        let _ = wrapper.set_attribute(
            "style",
            "grid-column: 1 / -1; text-align: center; padding: 3rem; color: #888;",
        );
        if let Ok(paragraph) = self.document.create_element("p") {
            paragraph.set_text_content(Some(message));
            let _ = wrapper.append_child(&paragraph);
        }
        let _ = grid.append_child(&wrapper);
    }

    pub(crate) fn render_grid(self: &Rc<Self>, data: &CareerData) -> Result<(), JsValue> {
        let Some(grid) = &self.grid else {
            return Ok(());
        };
        if data.categories.is_empty() {
            self.show_message(NO_CATEGORIES_MESSAGE);
            return Ok(());
        }
        grid.set_inner_html("");
        let mut listeners = Vec::new();
        for (cat_index, category) in data.categories.iter().enumerate() {
            let column = create(&self.document, "div", "category-column")?;
            let header = create(&self.document, "h2", "category-header")?;
            header.set_text_content(Some(&category.name));
            column.append_child(&header)?;
            for (sub_index, sub) in category.subcategories.iter().enumerate() {
                let card = self.subcategory_card(sub, cat_index, sub_index, &mut listeners)?;
                column.append_child(&card)?;
            }
            grid.append_child(&column)?;
        }
        *self.card_listeners.borrow_mut() = listeners;
        log!(format!("career: rendered {} categories", data.categories.len()));
        Ok(())
    }

    fn subcategory_card(
        self: &Rc<Self>,
        sub: &Subcategory,
        cat_index: usize,
        sub_index: usize,
        listeners: &mut Vec<EventListener>,
    ) -> Result<Element, JsValue> {
        let card = create(&self.document, "div", "subcategory-card")?;
        let delay = career::stagger_delay_secs(cat_index, sub_index);
        dom::set_style(&card, "animation-delay", &format!("{delay}s"));
        let name = create(&self.document, "span", "subcategory-card__name")?;
        name.set_text_content(Some(&sub.name));
        card.append_child(&name)?;
        card.set_attribute("role", "button")?;
        card.set_attribute("tabindex", "0")?;

        let projects = Rc::new(sub.projects());
        for event in ["mouseenter", "focus"] {
            let page = Rc::downgrade(self);
            let projects = Rc::clone(&projects);
            let item = card.clone();
            listeners.push(EventListener::new(&card, event, move |_event: &Event| {
                if let Some(page) = page.upgrade() {
                    page.hover_card(&item, &projects);
                }
            }));
        }
        for event in ["mouseleave", "blur"] {
            let page = Rc::downgrade(self);
            let item = card.clone();
            listeners.push(EventListener::new(&card, event, move |_event: &Event| {
                if let Some(page) = page.upgrade() {
                    page.leave_card(&item);
                }
            }));
        }
        Ok(card)
    }

    fn hover_card(self: &Rc<Self>, card: &Element, projects: &[Project]) {
        let Some(popover) = &self.popover else {
            return;
        };
        *popover.hovered.borrow_mut() = Some(card.clone());
        popover.cancel_close();
        if let Err(err) = self.open_popover(card, projects) {
            error!(format!("career: popover failed: {}", dom::js_err(err)));
        }
    }

    fn leave_card(self: &Rc<Self>, card: &Element) {
        let Some(popover) = &self.popover else {
            return;
        };
        {
            let mut hovered = popover.hovered.borrow_mut();
            if hovered.as_ref() == Some(card) {
                hovered.take();
            }
        }
        self.schedule_popover_close();
    }

    fn open_popover(self: &Rc<Self>, card: &Element, projects: &[Project]) -> Result<(), JsValue> {
        let Some(popover) = &self.popover else {
            return Ok(());
        };
        *popover.target.borrow_mut() = Some(card.clone());
        popover.links.set_inner_html("");
        let mut listeners = Vec::new();
        if projects.is_empty() {
            let empty = create(&self.document, "div", "popover__empty")?;
            empty.set_text_content(Some(EMPTY_PROJECTS_LABEL));
            popover.links.append_child(&empty)?;
        }
        for (index, project) in projects.iter().enumerate() {
            let entry = self.project_entry(project, &mut listeners)?;
            popover.links.append_child(&entry)?;
            if index + 1 < projects.len() {
                let separator = create(&self.document, "hr", "popover__separator")?;
                popover.links.append_child(&separator)?;
            }
        }
        *popover.link_listeners.borrow_mut() = listeners;

        popover.position(&self.window);
        set_open(&popover.root, true);
        dom::add_class(&popover.backdrop, OPEN_CLASS);
        Ok(())
    }

    fn project_entry(
        self: &Rc<Self>,
        project: &Project,
        listeners: &mut Vec<EventListener>,
    ) -> Result<Element, JsValue> {
        let container = create(&self.document, "div", "popover__project")?;
        if let Some(person) = career::non_empty(&project.person_name) {
            let name = create(&self.document, "div", "popover__person-name")?;
            match career::non_empty(&project.person_url) {
                Some(url) => {
                    let link = external_link(&self.document, url, person)?;
                    name.append_child(&link)?;
                }
                None => name.set_text_content(Some(person)),
            }
            container.append_child(&name)?;
        }
        if !project.has_links() {
            return Ok(container);
        }

        let links = create(&self.document, "div", "popover__project-links")?;
        if let Some(video_url) = career::non_empty(&project.video_url) {
            let link = external_link(&self.document, video_url, "video")?;
            link.set_class_name("popover__link");
            let page = Rc::downgrade(self);
            let url = video_url.to_string();
            listeners.push(EventListener::new(&link, "click", move |event: &Event| {
                event.prevent_default();
                if let Some(page) = page.upgrade() {
                    page.play_video(&url);
                }
            }));
            links.append_child(&link)?;
        }
        if let Some(article_url) = career::non_empty(&project.article_url) {
            let link = external_link(&self.document, article_url, "interview text")?;
            link.set_class_name("popover__link");
            links.append_child(&link)?;
        }
        container.append_child(&links)?;
        Ok(container)
    }

    fn play_video(&self, url: &str) {
        if let Some(popover) = &self.popover {
            popover.close();
        }
        let Some(video) = &self.video else {
            dom::open_in_new_tab(url);
            return;
        };
        if let Err(err) = video.open(url) {
            error!(format!("career: video modal failed: {}", dom::js_err(err)));
        }
    }

    // a newer schedule or cancel bumps the generation and voids this timer
    fn schedule_popover_close(self: &Rc<Self>) {
        let Some(popover) = &self.popover else {
            return;
        };
        popover.cancel_close();
        let generation = popover.close_generation.get();
        let page: Weak<Self> = Rc::downgrade(self);
        Timeout::new(POPOVER_CLOSE_DELAY_MS, move || {
            let Some(page) = page.upgrade() else {
                return;
            };
            let Some(popover) = &page.popover else {
                return;
            };
            if popover.close_generation.get() != generation {
                return;
            }
            if !popover.pointer_inside.get() && popover.hovered.borrow().is_none() {
                popover.close();
            }
        })
        .forget();
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = Vec::new();
        if let Some(popover) = &self.popover {
            let page = Rc::downgrade(self);
            listeners.push(EventListener::new(&popover.root, "mouseenter", move |_event: &Event| {
                let Some(page) = page.upgrade() else {
                    return;
                };
                if let Some(popover) = &page.popover {
                    popover.pointer_inside.set(true);
                    popover.cancel_close();
                }
            }));
            let page = Rc::downgrade(self);
            listeners.push(EventListener::new(&popover.root, "mouseleave", move |_event: &Event| {
                let Some(page) = page.upgrade() else {
                    return;
                };
                if let Some(popover) = &page.popover {
                    popover.pointer_inside.set(false);
                }
                page.schedule_popover_close();
            }));
            let close_targets = [
                Some(popover.backdrop.clone()),
                dom::query(&popover.root, ".popover__close"),
            ];
            for target in close_targets.into_iter().flatten() {
                let page = Rc::downgrade(self);
                listeners.push(EventListener::new(&target, "click", move |_event: &Event| {
                    if let Some(popover) = page.upgrade().as_ref().and_then(|page| page.popover.as_ref()) {
                        popover.close();
                    }
                }));
            }
            let page = Rc::downgrade(self);
            listeners.push(EventListener::new(&self.window, "resize", move |_event: &Event| {
                let Some(page) = page.upgrade() else {
                    return;
                };
                if let Some(popover) = page.popover.as_ref().filter(|popover| popover.is_open()) {
                    popover.position(&page.window);
                }
            }));
        }

        if let Some(video) = &self.video {
            let close_targets = [
                dom::query(&video.root, ".video-modal__close"),
                dom::query(&video.root, ".video-modal__overlay"),
            ];
            for target in close_targets.into_iter().flatten() {
                let page = Rc::downgrade(self);
                listeners.push(EventListener::new(&target, "click", move |_event: &Event| {
                    if let Some(video) = page.upgrade().as_ref().and_then(|page| page.video.as_ref()) {
                        video.close();
                    }
                }));
            }
        }

        if let Some(qr) = &self.qr {
            if let Some(body) = self.document.body() {
                for code in dom::query_all(&body, ".contact__qr-code") {
                    let page = Rc::downgrade(self);
                    let image = dom::query(&code, "img")
                        .and_then(|image| image.dyn_into::<HtmlImageElement>().ok());
                    listeners.push(EventListener::new(&code, "click", move |_event: &Event| {
                        let (Some(page), Some(image)) = (page.upgrade(), image.as_ref()) else {
                            return;
                        };
                        if let Some(qr) = &page.qr {
                            qr.open(&image.src());
                        }
                    }));
                }
            }
            if let Some(button) = dom::query(&qr.root, ".qr-lightbox__close") {
                let page = Rc::downgrade(self);
                listeners.push(EventListener::new(&button, "click", move |_event: &Event| {
                    if let Some(qr) = page.upgrade().as_ref().and_then(|page| page.qr.as_ref()) {
                        qr.close();
                    }
                }));
            }
            let page = Rc::downgrade(self);
            let root = qr.root.clone();
            listeners.push(EventListener::new(&qr.root, "click", move |event: &Event| {
                if !dom::event_element(event).is_some_and(|target| target == root) {
                    return;
                }
                if let Some(qr) = page.upgrade().as_ref().and_then(|page| page.qr.as_ref()) {
                    qr.close();
                }
            }));
        }

        let page = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.document, "keydown", move |event: &Event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if event.key() != "Escape" {
                return;
            }
            if let Some(page) = page.upgrade() {
                page.escape();
            }
        }));
        *self.listeners.borrow_mut() = listeners;
    }

    /// Closes the topmost open overlay: QR lightbox, then video, then popover.
    fn escape(&self) {
        let target = EscapeTarget::next(
            self.qr.as_ref().is_some_and(QrLightbox::is_open),
            self.video.as_ref().is_some_and(VideoModal::is_open),
            self.popover.as_ref().is_some_and(Popover::is_open),
        );
        match target {
            Some(EscapeTarget::QrLightbox) => {
                if let Some(qr) = &self.qr {
                    qr.close();
                }
            }
            Some(EscapeTarget::VideoModal) => {
                if let Some(video) = &self.video {
                    video.close();
                }
            }
            Some(EscapeTarget::Popover) => {
                if let Some(popover) = &self.popover {
                    popover.close();
                }
            }
            None => {}
        }
    }
}
