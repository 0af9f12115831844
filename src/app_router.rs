use std::cell::RefCell;
use std::rc::Rc;

use gloo::console::{error, log};
use gloo::events::EventListener;
use wasm_bindgen::JsValue;
use web_sys::Document;

use crate::career_view::CareerPage;
use crate::dom;
use crate::portfolio::PortfolioPage;

const DEFAULT_CAREER_DATA_PATH: &str = "data/careers.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PageKind {
    Portfolio,
    Career,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InitConfig {
    pub(crate) career_data_path: String,
}

pub(crate) fn load_init_config() -> InitConfig {
    InitConfig {
        career_data_path: career_data_path(),
    }
}

pub(crate) fn career_data_path() -> String {
    if let Some(raw) = option_env!("FOLIO_CAREER_DATA_PATH")
        .or(option_env!("TRUNK_PUBLIC_FOLIO_CAREER_DATA_PATH"))
    {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    DEFAULT_CAREER_DATA_PATH.to_string()
}

pub(crate) fn detect_page(document: &Document) -> Option<PageKind> {
    if document.get_element_by_id("portfolio-container").is_some() {
        return Some(PageKind::Portfolio);
    }
    if document.get_element_by_id("categories-grid").is_some()
        || document.get_element_by_id("hero").is_some()
    {
        return Some(PageKind::Career);
    }
    None
}

#[allow(dead_code)]
enum ActivePage {
    Portfolio(Rc<PortfolioPage>),
    Career(Rc<CareerPage>),
}

thread_local! {
    static ACTIVE_PAGE: RefCell<Option<ActivePage>> = const { RefCell::new(None) };
}

pub(crate) fn start() {
    let document = match dom::document() {
        Ok(document) => document,
        Err(err) => {
            error!(format!("startup failed: {}", dom::js_err(err)));
            return;
        }
    };
    if document.ready_state() == "loading" {
        let ready = document.clone();
        EventListener::once(&document, "DOMContentLoaded", move |_event| {
            boot(&ready);
        })
        .forget();
    } else {
        boot(&document);
    }
}

fn boot(document: &Document) {
    let config = load_init_config();
    let Some(kind) = detect_page(document) else {
        log!("no page controller for this document");
        return;
    };
    let page: Result<ActivePage, JsValue> = match kind {
        PageKind::Portfolio => PortfolioPage::start(document).map(ActivePage::Portfolio),
        PageKind::Career => {
            CareerPage::start(document, config.career_data_path).map(ActivePage::Career)
        }
    };
    match page {
        Ok(page) => {
            log!(format!("{kind:?} page ready"));
            ACTIVE_PAGE.with(|slot| *slot.borrow_mut() = Some(page));
        }
        Err(err) => error!(format!("{kind:?} page failed to start: {}", dom::js_err(err))),
    }
}
