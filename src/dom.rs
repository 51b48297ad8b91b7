use std::fmt;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Window};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiError {
    MissingWindow,
    MissingDocument,
    MissingElement(String),
    WrongElementType(String),
    Js(String),
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiError::MissingWindow => write!(f, "window is unavailable"),
            UiError::MissingDocument => write!(f, "document is unavailable"),
            UiError::MissingElement(id) => write!(f, "element '{id}' not found"),
            UiError::WrongElementType(id) => write!(f, "element '{id}' has an unexpected type"),
            UiError::Js(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for UiError {}

impl From<JsValue> for UiError {
    fn from(error: JsValue) -> Self {
        UiError::Js(js_err(error))
    }
}

pub(crate) fn window() -> Result<Window, UiError> {
    web_sys::window().ok_or(UiError::MissingWindow)
}

pub(crate) fn document() -> Result<Document, UiError> {
    window()?.document().ok_or(UiError::MissingDocument)
}

pub(crate) fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, UiError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| UiError::MissingElement(id.to_string()))?
        .dyn_into::<T>()
        .map_err(|_| UiError::WrongElementType(id.to_string()))
}

/// Looks an id up below `root` only, so stale copies elsewhere in the page are ignored.
pub(crate) fn descendant_by_id(root: &Element, id: &str) -> Option<Element> {
    root.query_selector(&format!("[id=\"{id}\"]")).ok().flatten()
}

pub(crate) fn owner_document(element: &Element) -> Result<Document, UiError> {
    element.owner_document().ok_or(UiError::MissingDocument)
}

pub(crate) fn alert(message: &str) {
    if let Ok(window) = window() {
        let _ = window.alert_with_message(message);
    }
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
