use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, DocumentFragment, DomParser, Element, Event, HtmlElement, HtmlTemplateElement,
    SupportedType,
};

pub(crate) fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("missing document"))
}

pub(crate) fn js_err(error: JsValue) -> String {
    if let Some(value) = error.as_string() {
        return value;
    }
    if let Ok(json) = js_sys::JSON::stringify(&error) {
        if let Some(value) = json.as_string() {
            return value;
        }
    }
    "js error".to_string()
}

/// Parses markup into a detached, inert document. Images in it never load.
pub(crate) fn parse_html(html: &str) -> Result<Document, JsValue> {
    DomParser::new()?.parse_from_string(html, SupportedType::TextHtml)
}

pub(crate) fn clone_template(
    document: &Document,
    template_id: &str,
    selector: &str,
) -> Result<Element, JsValue> {
    let template = document
        .get_element_by_id(template_id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{template_id}")))?
        .dyn_into::<HtmlTemplateElement>()?;
    let fragment = template
        .content()
        .clone_node_with_deep(true)?
        .dyn_into::<DocumentFragment>()?;
    fragment
        .query_selector(selector)?
        .ok_or_else(|| JsValue::from_str(&format!("#{template_id} has no {selector}")))
}

pub(crate) fn import_element(document: &Document, node: &Element) -> Result<Element, JsValue> {
    document
        .import_node_with_deep(node, true)?
        .dyn_into::<Element>()
        .map_err(JsValue::from)
}

pub(crate) fn query(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub(crate) fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub(crate) fn closest(element: &Element, selector: &str) -> Option<Element> {
    element.closest(selector).ok().flatten()
}

pub(crate) fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

pub(crate) fn set_style(element: &Element, property: &str, value: &str) {
    if let Some(element) = element.dyn_ref::<HtmlElement>() {
        let _ = element.style().set_property(property, value);
    }
}

pub(crate) fn clear_style(element: &Element, property: &str) {
    if let Some(element) = element.dyn_ref::<HtmlElement>() {
        let _ = element.style().remove_property(property);
    }
}

pub(crate) fn add_class(element: &Element, class: &str) {
    let _ = element.class_list().add_1(class);
}

pub(crate) fn remove_class(element: &Element, class: &str) {
    let _ = element.class_list().remove_1(class);
}

pub(crate) fn has_class(element: &Element, class: &str) -> bool {
    element.class_list().contains(class)
}

pub(crate) fn open_in_new_tab(url: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let _ = window.open_with_url_and_target(url, "_blank");
}
