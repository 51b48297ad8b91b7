mod camera_selector;
mod config;
mod dom;
mod http;
mod log_source;
mod log_viewer;
mod login;

use std::cell::RefCell;

use gloo::console;
use web_sys::{Document, Element};

use crate::camera_selector::{CameraSelector, SIDEBAR_ID};
use crate::log_source::WebSocketLogSource;
use crate::log_viewer::{LogViewer, LOG_CONTAINER_ID};
use crate::login::{LoginHandler, LOGIN_FORM_ID};

/// Components mounted on the current page. They hold the DOM listeners,
/// so they must outlive `main`.
#[derive(Default)]
struct Page {
    cameras: Option<CameraSelector>,
    logs: Option<LogViewer>,
    login: Option<LoginHandler>,
}

thread_local! {
    static PAGE: RefCell<Page> = RefCell::new(Page::default());
}

fn mount_cameras(document: &Document) -> Option<CameraSelector> {
    document.get_element_by_id(SIDEBAR_ID)?;
    match CameraSelector::from_document(document) {
        Ok(selector) => {
            selector.mount();
            Some(selector)
        }
        Err(err) => {
            console::warn!("camera selector not mounted", err.to_string());
            None
        }
    }
}

fn mount_logs(document: &Document) -> Option<LogViewer> {
    let container: Element = document.get_element_by_id(LOG_CONTAINER_ID)?;
    let config = config::load_config(Some(&container));
    let viewer = LogViewer::new(container, config.log_max_lines);
    let Some(url) = config.log_ws_url else {
        console::warn!("no log stream url configured");
        return Some(viewer);
    };
    console::log!("subscribing to log stream", url.clone());
    if let Err(err) = viewer.attach(Box::new(WebSocketLogSource::new(&url))) {
        console::warn!("log viewer not attached", err.to_string());
    }
    Some(viewer)
}

fn mount_login(document: &Document) -> Option<LoginHandler> {
    document.get_element_by_id(LOGIN_FORM_ID)?;
    match LoginHandler::from_document(document) {
        Ok(handler) => {
            handler.mount();
            Some(handler)
        }
        Err(err) => {
            console::warn!("login handler not mounted", err.to_string());
            None
        }
    }
}

fn main() {
    let document = match dom::document() {
        Ok(document) => document,
        Err(err) => {
            console::warn!("console scripts not started", err.to_string());
            return;
        }
    };
    let page = Page {
        cameras: mount_cameras(&document),
        logs: mount_logs(&document),
        login: mount_login(&document),
    };
    console::log!(
        "console page ready",
        page.cameras.is_some(),
        page.logs.is_some(),
        page.login.is_some()
    );
    PAGE.with(|slot| *slot.borrow_mut() = page);
}
