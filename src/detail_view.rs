use std::rc::Rc;

use futures_util::future::join_all;
use gloo::console::error;
use gloo::events::EventListener;
use web_sys::{Element, Event};

use crate::dom;
use crate::fetch::HttpSource;
use crate::portfolio::{dom_error, PortfolioPage};
use crate::lazy_images;
use folio_core::composer::DETAIL_MARKER;
use folio_core::detail::gallery_sources;
use folio_core::lazy::PLACEHOLDER_ATTR;
use folio_core::{ComposeError, FragmentSource, RewriteMode};

pub(crate) struct MountedDetail {
    element: Element,
    content: Element,
    _listeners: Vec<EventListener>,
}

impl MountedDetail {
    pub(crate) fn element(&self) -> &Element {
        &self.element
    }
}

pub(crate) async fn open_project(page: Rc<PortfolioPage>, section: Element, path: String) {
    if let Err(err) = open_detail(&page, &section, &path).await {
        error!(format!("portfolio: cannot open {path}: {err}"));
    }
}

async fn open_detail(
    page: &Rc<PortfolioPage>,
    section: &Element,
    path: &str,
) -> Result<(), ComposeError> {
    let html = HttpSource.fetch_text(path).await?;
    let detail = build_detail(page, section, path, &html)?;
    let content = detail.content.clone();
    page.show_detail(section, detail)?;

    let selector = format!("img[{PLACEHOLDER_ATTR}]");
    let watcher = page.watcher();
    let loads = dom::query_all(&content, &selector)
        .into_iter()
        .map(|img| Rc::clone(&watcher).force_load_and_unregister(img));
    join_all(loads).await;
    Ok(())
}

pub(crate) fn build_detail(
    page: &Rc<PortfolioPage>,
    section: &Element,
    path: &str,
    html: &str,
) -> Result<MountedDetail, ComposeError> {
    let parsed = dom::parse_html(html).map_err(|err| ComposeError::Parse {
        path: path.to_string(),
        message: dom::js_err(err),
    })?;
    let root = parsed.document_element().ok_or_else(|| ComposeError::Parse {
        path: path.to_string(),
        message: "empty document".to_string(),
    })?;
    lazy_images::rewrite_images(&root, RewriteMode::Detail);
    let source = dom::query(&root, DETAIL_MARKER).ok_or_else(|| ComposeError::MissingMarker {
        path: path.to_string(),
        marker: DETAIL_MARKER,
    })?;

    let document = page.document();
    let element = dom::clone_template(document, "project-detail-template", ".project-detail")
        .map_err(dom_error)?;
    if let Some(heading) = dom::query(&element, ".detail-section-title") {
        let title = dom::query(section, ".section-title").and_then(|title| title.text_content());
        heading.set_text_content(title.as_deref());
    }
    let container = dom::query(&element, ".detail-content")
        .ok_or_else(|| ComposeError::Dom("detail template has no .detail-content".to_string()))?;
    let content = dom::import_element(document, &source).map_err(dom_error)?;
    container.append_child(&content).map_err(dom_error)?;

    let mut listeners = Vec::new();
    if let Some(gallery) = page.gallery() {
        let images_root = content.clone();
        listeners.push(EventListener::new(&content, "click", move |event: &Event| {
            let Some(target) = dom::event_element(event) else {
                return;
            };
            if !target.tag_name().eq_ignore_ascii_case("img") {
                return;
            }
            let start = image_source(&target).unwrap_or_default();
            gallery.open(image_sources(&images_root), &start);
        }));
    }
    if let Some(button) = dom::query(&element, ".close-btn") {
        let page = Rc::downgrade(page);
        let panel = element.clone();
        listeners.push(EventListener::new(&button, "click", move |_event: &Event| {
            if let Some(page) = page.upgrade() {
                page.close_detail_element(&panel);
            }
        }));
    }

    Ok(MountedDetail {
        element,
        content,
        _listeners: listeners,
    })
}

fn image_source(img: &Element) -> Option<String> {
    let placeholder = img.get_attribute(PLACEHOLDER_ATTR);
    let src = img.get_attribute("src");
    folio_core::detail::gallery_source(placeholder.as_deref(), src.as_deref())
}

fn image_sources(root: &Element) -> Vec<String> {
    let attributes: Vec<(Option<String>, Option<String>)> = dom::query_all(root, "img")
        .iter()
        .map(|img| (img.get_attribute(PLACEHOLDER_ATTR), img.get_attribute("src")))
        .collect();
    gallery_sources(
        attributes
            .iter()
            .map(|(placeholder, src)| (placeholder.as_deref(), src.as_deref())),
    )
}
