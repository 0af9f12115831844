use std::cell::RefCell;
use std::rc::Rc;

use gloo::console::{log, warn};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event};

use crate::detail_view::{self, MountedDetail};
use crate::dom;
use crate::fetch::HttpSource;
use crate::gallery_view::FullscreenGallery;
use crate::lazy_images::{self, LazyImageWatcher};
use folio_core::catalog::FallbackListing;
use folio_core::composer::PREVIEW_MARKER;
use folio_core::{
    ClosingDetail, ComposeError, ComposeEvent, ComposeSummary, Composer, DetailExclusion,
    RewriteMode, SectionConfig, SectionSink, DETAIL_TRANSITION_MS, FALLBACK_LISTINGS, SECTIONS,
};

const ACTIVE_CLASS: &str = "active";

pub(crate) fn dom_error(error: JsValue) -> ComposeError {
    ComposeError::Dom(dom::js_err(error))
}

pub(crate) struct PortfolioPage {
    document: Document,
    container: Element,
    watcher: Rc<LazyImageWatcher>,
    gallery: Option<Rc<FullscreenGallery>>,
    details: RefCell<DetailExclusion<MountedDetail>>,
    overlay_listeners: RefCell<Vec<EventListener>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl PortfolioPage {
    pub(crate) fn start(document: &Document) -> Result<Rc<Self>, JsValue> {
        let container = document
            .get_element_by_id("portfolio-container")
            .ok_or_else(|| JsValue::from_str("missing #portfolio-container"))?;
        let page = Self::new(document, container, SECTIONS);
        let composing = Rc::clone(&page);
        spawn_local(async move {
            let summary = composing.compose(SECTIONS, FALLBACK_LISTINGS).await;
            log!(format!(
                "portfolio: {} projects in {} sections ({} failed)",
                summary.loaded_count(),
                summary.sections.len(),
                summary.failed_count()
            ));
        });
        Ok(page)
    }

    pub(crate) fn new(document: &Document, container: Element, sections: &[SectionConfig]) -> Rc<Self> {
        let gallery = FullscreenGallery::attach(document);
        if gallery.is_none() {
            warn!("portfolio: no #fullscreen-gallery, image clicks are ignored");
        }
        let page = Rc::new(Self {
            document: document.clone(),
            container,
            watcher: LazyImageWatcher::new(),
            gallery,
            details: RefCell::new(DetailExclusion::new(sections.iter().map(|section| section.id))),
            overlay_listeners: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        });
        page.install_listeners();
        page
    }

    pub(crate) async fn compose(
        self: &Rc<Self>,
        sections: &[SectionConfig],
        fallbacks: &[FallbackListing],
    ) -> ComposeSummary {
        let sink = DomSink { page: self };
        Composer::new(&HttpSource, &sink, fallbacks)
            .compose(sections)
            .await
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn watcher(&self) -> Rc<LazyImageWatcher> {
        Rc::clone(&self.watcher)
    }

    pub(crate) fn gallery(&self) -> Option<Rc<FullscreenGallery>> {
        self.gallery.clone()
    }

    fn install_listeners(self: &Rc<Self>) {
        let page = Rc::downgrade(self);
        let listener = EventListener::new(&self.container, "click", move |event: &Event| {
            let Some(page) = page.upgrade() else {
                return;
            };
            let Some(target) = dom::event_element(event) else {
                return;
            };
            let item = dom::closest(&target, ".project-thumbnail, .project-more-link")
                .and_then(|trigger| dom::closest(&trigger, ".project-item"));
            if let Some(item) = item {
                event.stop_propagation();
                page.activate_item(&item);
                return;
            }
            let Some(section) = dom::closest(&target, ".portfolio-section") else {
                return;
            };
            if dom::closest(&target, ".project-detail").is_some()
                || dom::closest(&target, ".project-thumbnail").is_some()
            {
                return;
            }
            page.close_detail_owned_by(&section.id());
        });
        self.listeners.borrow_mut().push(listener);
    }

    fn activate_item(self: &Rc<Self>, item: &Element) {
        let external = dom::query(item, PREVIEW_MARKER)
            .and_then(|preview| preview.get_attribute("data-external-link"))
            .filter(|link| !link.trim().is_empty());
        if let Some(link) = external {
            dom::open_in_new_tab(link.trim());
            return;
        }
        let Some(path) = item.get_attribute("data-project-file") else {
            return;
        };
        let Some(section) = dom::closest(item, ".portfolio-section") else {
            return;
        };
        spawn_local(detail_view::open_project(Rc::clone(self), section, path));
    }

    /// Mounts and activates `detail`; any detail already open is closed first.
    pub(crate) fn show_detail(
        self: &Rc<Self>,
        section: &Element,
        detail: MountedDetail,
    ) -> Result<(), ComposeError> {
        let element = detail.element().clone();
        section.append_child(&element).map_err(dom_error)?;
        let mounted = self.details.borrow_mut().mount(&section.id(), detail);
        let displaced = match mounted {
            Ok(displaced) => displaced,
            Err(err) => {
                element.remove();
                return Err(ComposeError::Dom(err.to_string()));
            }
        };
        if let Some(closing) = displaced {
            self.finish_close(closing);
        }
        let blocked = self.details.borrow_mut().activate();
        dom::add_class(&element, ACTIVE_CLASS);
        self.block_sections(&blocked);
        Ok(())
    }

    pub(crate) fn close_detail(&self) {
        let closing = self.details.borrow_mut().begin_close();
        if let Some(closing) = closing {
            self.finish_close(closing);
        }
    }

    pub(crate) fn close_detail_element(&self, element: &Element) {
        let is_current = self
            .details
            .borrow()
            .handle()
            .is_some_and(|detail| detail.element() == element);
        if is_current {
            self.close_detail();
        }
    }

    fn close_detail_owned_by(&self, section_id: &str) {
        let closing = self.details.borrow_mut().close_owned_by(section_id);
        if let Some(closing) = closing {
            self.finish_close(closing);
        }
    }

    fn block_sections(self: &Rc<Self>, blocked: &[String]) {
        let mut listeners = Vec::with_capacity(blocked.len());
        for overlay in blocked.iter().filter_map(|id| self.overlay(id)) {
            dom::add_class(&overlay, ACTIVE_CLASS);
            let page = Rc::downgrade(self);
            listeners.push(EventListener::new(&overlay, "click", move |_event: &Event| {
                if let Some(page) = page.upgrade() {
                    page.close_detail();
                }
            }));
        }
        *self.overlay_listeners.borrow_mut() = listeners;
    }

    fn finish_close(&self, closing: ClosingDetail<MountedDetail>) {
        let ClosingDetail { handle, unblock, .. } = closing;
        dom::remove_class(handle.element(), ACTIVE_CLASS);
        for overlay in unblock.iter().filter_map(|id| self.overlay(id)) {
            dom::remove_class(&overlay, ACTIVE_CLASS);
        }
        let stale = std::mem::take(&mut *self.overlay_listeners.borrow_mut());
        drop(stale);
        let watcher = Rc::clone(&self.watcher);
        Timeout::new(DETAIL_TRANSITION_MS, move || {
            handle.element().remove();
            watcher.release_within(handle.element());
        })
        .forget();
    }

    fn overlay(&self, section_id: &str) -> Option<Element> {
        let section = self.document.get_element_by_id(section_id)?;
        dom::query(&section, ".section-overlay")
    }
}

struct DomSink<'a> {
    page: &'a Rc<PortfolioPage>,
}

impl SectionSink for DomSink<'_> {
    type Section = Element;

    fn open_section(&self, section: &SectionConfig) -> Result<Element, ComposeError> {
        let element = dom::clone_template(&self.page.document, "section-template", ".portfolio-section")
            .map_err(dom_error)?;
        element.set_id(section.id);
        if let Some(title) = dom::query(&element, ".section-title") {
            title.set_text_content(Some(section.title));
        }
        self.page
            .container
            .append_child(&element)
            .map_err(dom_error)?;
        Ok(dom::query(&element, ".section-content").unwrap_or(element))
    }

    fn mount_preview(&self, content: &Element, path: &str, html: &str) -> Result<(), ComposeError> {
        let parsed = dom::parse_html(html).map_err(|err| ComposeError::Parse {
            path: path.to_string(),
            message: dom::js_err(err),
        })?;
        let root = parsed.document_element().ok_or_else(|| ComposeError::Parse {
            path: path.to_string(),
            message: "empty document".to_string(),
        })?;
        lazy_images::rewrite_images(&root, RewriteMode::Preview);
        let preview = dom::query(&root, PREVIEW_MARKER).ok_or_else(|| ComposeError::MissingMarker {
            path: path.to_string(),
            marker: PREVIEW_MARKER,
        })?;

        let document = &self.page.document;
        let item = document.create_element("div").map_err(dom_error)?;
        item.set_class_name("project-item");
        item.set_attribute("data-project-file", path)
            .map_err(dom_error)?;
        let preview = dom::import_element(document, &preview).map_err(dom_error)?;
        item.append_child(&preview).map_err(dom_error)?;
        self.page.watcher.register_within(&item);
        content.append_child(&item).map_err(dom_error)?;
        Ok(())
    }

    fn report(&self, event: ComposeEvent<'_>) {
        match event {
            ComposeEvent::ManifestFallback {
                section,
                error,
                files,
            } => {
                warn!(format!(
                    "portfolio: {}: manifest unavailable ({error}), using {files} listed files",
                    section.id
                ));
            }
            ComposeEvent::FragmentFailed { section, path, error } => {
                warn!(format!("portfolio: {}: skipped {path}: {error}", section.id));
            }
            ComposeEvent::SectionFailed { section, error } => {
                warn!(format!("portfolio: {}: section not rendered: {error}", section.id));
            }
            ComposeEvent::SectionLoaded { section, summary } => {
                log!(format!(
                    "portfolio: {} ready, {} loaded, {} failed",
                    section.id,
                    summary.loaded.len(),
                    summary.failed.len()
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_error_panic_hook::set_once as set_panic_hook;
    use gloo::timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const TEST_SECTIONS: &[SectionConfig] = &[
        SectionConfig {
            id: "test-academic",
            title: "Academic",
            directory: "projects/test-academic",
        },
        SectionConfig {
            id: "test-practice",
            title: "Practice",
            directory: "projects/test-practice",
        },
        SectionConfig {
            id: "test-contact",
            title: "Contact",
            directory: "projects/test-contact",
        },
    ];

    const DETAIL_HTML: &str = r#"
        <div class="project-preview"><img src="cover.jpg"></div>
        <div class="project-detail-content">
            <p>Body</p>
            <img src="one.jpg"><img src="two.jpg">
        </div>"#;

    fn mount_page_markup(document: &Document) -> Element {
        let host = document.create_element("div").expect("create host");
        host.set_inner_html(
            r#"<template id="section-template">
                <section class="portfolio-section">
                    <h2 class="section-title"></h2>
                    <div class="section-content"></div>
                    <div class="section-overlay"></div>
                </section>
            </template>
            <template id="project-detail-template">
                <div class="project-detail">
                    <button class="close-btn"></button>
                    <h3 class="detail-section-title"></h3>
                    <div class="detail-content"></div>
                </div>
            </template>
            <div id="test-portfolio"></div>"#,
        );
        document
            .body()
            .expect("body available")
            .append_child(&host)
            .expect("append page host");
        host
    }

    fn open_sections(page: &Rc<PortfolioPage>) -> Vec<Element> {
        let sink = DomSink { page };
        for section in TEST_SECTIONS {
            sink.open_section(section).expect("open section");
        }
        TEST_SECTIONS
            .iter()
            .map(|section| {
                page.document
                    .get_element_by_id(section.id)
                    .expect("section mounted")
            })
            .collect()
    }

    fn overlay_active(section: &Element) -> bool {
        dom::query(section, ".section-overlay").is_some_and(|overlay| dom::has_class(&overlay, ACTIVE_CLASS))
    }

    #[wasm_bindgen_test]
    fn preview_becomes_project_item() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let host = mount_page_markup(&document);
        let container = document.get_element_by_id("test-portfolio").expect("container");
        let page = PortfolioPage::new(&document, container, TEST_SECTIONS);
        let sections = open_sections(&page);
        let content = dom::query(&sections[0], ".section-content").expect("content");

        let sink = DomSink { page: &page };
        sink.mount_preview(
            &content,
            "projects/test-academic/a.html",
            r#"<div class="project-preview"><img src="a.jpg"><img src="b.jpg"></div>"#,
        )
        .expect("mount preview");
        let missing = sink.mount_preview(&content, "projects/test-academic/b.html", "<p>nothing</p>");
        assert!(matches!(missing, Err(ComposeError::MissingMarker { .. })));

        let items = dom::query_all(&content, ".project-item");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].get_attribute("data-project-file").as_deref(),
            Some("projects/test-academic/a.html")
        );
        let images = dom::query_all(&items[0], "img");
        assert_eq!(images[0].get_attribute("src").as_deref(), Some("a.jpg"));
        assert!(dom::has_class(&images[1], "lazy-loading"));
        assert_eq!(
            dom::query(&sections[0], ".section-title").and_then(|title| title.text_content()),
            Some("Academic".to_string())
        );
        host.remove();
    }

    #[wasm_bindgen_test(async)]
    async fn detail_blocks_other_sections_until_closed() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let host = mount_page_markup(&document);
        let container = document.get_element_by_id("test-portfolio").expect("container");
        let page = PortfolioPage::new(&document, container, TEST_SECTIONS);
        let sections = open_sections(&page);

        for _ in 0..2 {
            let detail = detail_view::build_detail(&page, &sections[1], "x.html", DETAIL_HTML)
                .expect("build detail");
            let element = detail.element().clone();
            page.show_detail(&sections[1], detail).expect("show detail");

            assert!(dom::has_class(&element, ACTIVE_CLASS));
            assert!(overlay_active(&sections[0]));
            assert!(!overlay_active(&sections[1]));
            assert!(overlay_active(&sections[2]));
            assert_eq!(
                dom::query(&element, ".detail-section-title").and_then(|title| title.text_content()),
                Some("Practice".to_string())
            );
            assert_eq!(dom::query_all(&element, "img[data-src]").len(), 2);

            page.close_detail();
            assert!(!dom::has_class(&element, ACTIVE_CLASS));
            assert!(sections.iter().all(|section| !overlay_active(section)));
            assert!(element.is_connected());

            TimeoutFuture::new(DETAIL_TRANSITION_MS + 50).await;
            assert!(!element.is_connected());
        }
        host.remove();
    }

    #[wasm_bindgen_test(async)]
    async fn closed_details_leave_no_settled_images_behind() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let host = mount_page_markup(&document);
        let container = document.get_element_by_id("test-portfolio").expect("container");
        let page = PortfolioPage::new(&document, container, TEST_SECTIONS);
        let sections = open_sections(&page);

        for _ in 0..3 {
            let detail = detail_view::build_detail(&page, &sections[0], "x.html", DETAIL_HTML)
                .expect("build detail");
            let element = detail.element().clone();
            page.show_detail(&sections[0], detail).expect("show detail");
            for img in dom::query_all(&element, "img[data-src]") {
                page.watcher().force_load_and_unregister(img).await;
            }
            assert_eq!(page.watcher().tracked(), 2);

            page.close_detail();
            TimeoutFuture::new(DETAIL_TRANSITION_MS + 50).await;
            assert_eq!(page.watcher().tracked(), 0);
        }
        host.remove();
    }

    #[wasm_bindgen_test]
    fn second_detail_displaces_the_first() {
        set_panic_hook();
        let document = dom::document().expect("document");
        let host = mount_page_markup(&document);
        let container = document.get_element_by_id("test-portfolio").expect("container");
        let page = PortfolioPage::new(&document, container, TEST_SECTIONS);
        let sections = open_sections(&page);

        let first = detail_view::build_detail(&page, &sections[0], "a.html", DETAIL_HTML)
            .expect("build first");
        let first_element = first.element().clone();
        page.show_detail(&sections[0], first).expect("show first");
        let second = detail_view::build_detail(&page, &sections[2], "b.html", DETAIL_HTML)
            .expect("build second");
        page.show_detail(&sections[2], second).expect("show second");

        assert!(!dom::has_class(&first_element, ACTIVE_CLASS));
        assert!(overlay_active(&sections[0]));
        assert!(overlay_active(&sections[1]));
        assert!(!overlay_active(&sections[2]));
        page.close_detail();
        host.remove();
    }
}
