use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::console;
use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element};

use camconsole_core::{select_camera_url, CameraId, ADD_CAMERA_URL};

use crate::dom::{self, UiError};
use crate::http::{self, Fetch, RequestError};

pub(crate) const SIDEBAR_ID: &str = "sidenav";
pub(crate) const MAIN_ID: &str = "main";
pub(crate) const ADD_CAMERA_ID: &str = "add-camera";
pub(crate) const RESET_BUTTON_ID: &str = "camera-reset";
pub(crate) const APPLY_BUTTON_ID: &str = "camera-apply";

struct SelectorInner {
    main: Element,
    sidebar: Element,
    add_button: Element,
    fetch: Fetch,
    camera_count: Cell<u32>,
    entry_listeners: RefCell<Vec<EventListener>>,
    control_listeners: RefCell<Vec<EventListener>>,
    add_listener: RefCell<Option<EventListener>>,
}

/// Sidebar camera list plus the main region it swaps server markup into.
///
/// Selections are not serialized: two quick clicks issue two requests and
/// whichever response lands last wins.
#[derive(Clone)]
pub(crate) struct CameraSelector {
    inner: Rc<SelectorInner>,
}

impl CameraSelector {
    pub(crate) fn new(main: Element, sidebar: Element, add_button: Element) -> Self {
        Self::with_fetch(main, sidebar, add_button, http::browser_fetch())
    }

    pub(crate) fn with_fetch(
        main: Element,
        sidebar: Element,
        add_button: Element,
        fetch: Fetch,
    ) -> Self {
        Self {
            inner: Rc::new(SelectorInner {
                main,
                sidebar,
                add_button,
                fetch,
                camera_count: Cell::new(0),
                entry_listeners: RefCell::new(Vec::new()),
                control_listeners: RefCell::new(Vec::new()),
                add_listener: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn from_document(document: &Document) -> Result<Self, UiError> {
        let main = dom::element_by_id::<Element>(document, MAIN_ID)?;
        let sidebar = dom::element_by_id::<Element>(document, SIDEBAR_ID)?;
        let add_button = dom::element_by_id::<Element>(document, ADD_CAMERA_ID)?;
        Ok(Self::new(main, sidebar, add_button))
    }

    fn from_weak(weak: &Weak<SelectorInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Binds every sidebar anchor whose id is a camera index, then the add control.
    pub(crate) fn mount(&self) {
        let anchors = self.inner.sidebar.get_elements_by_tag_name("a");
        for idx in 0..anchors.length() {
            let Some(anchor) = anchors.item(idx) else {
                continue;
            };
            let Ok(id) = CameraId::parse(&anchor.id()) else {
                continue;
            };
            self.bind_entry(&anchor, id);
        }

        let weak = Rc::downgrade(&self.inner);
        let listener = EventListener::new_with_options(
            &self.inner.add_button,
            "click",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                event.prevent_default();
                let Some(selector) = Self::from_weak(&weak) else {
                    return;
                };
                spawn_local(async move {
                    if let Err(err) = selector.add().await {
                        console::warn!("camera add failed", err.to_string());
                    }
                });
            },
        );
        *self.inner.add_listener.borrow_mut() = Some(listener);
        console::log!("camera selector mounted", self.camera_count());
    }

    pub(crate) fn camera_count(&self) -> u32 {
        self.inner.camera_count.get()
    }

    fn bind_entry(&self, anchor: &Element, id: CameraId) {
        let weak = Rc::downgrade(&self.inner);
        let listener = EventListener::new_with_options(
            anchor,
            "click",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                event.prevent_default();
                let Some(selector) = Self::from_weak(&weak) else {
                    return;
                };
                spawn_local(async move {
                    if let Err(err) = selector.select(id).await {
                        console::warn!("camera select failed", id.index(), err.to_string());
                    }
                });
            },
        );
        self.inner.entry_listeners.borrow_mut().push(listener);
        let count = self.inner.camera_count.get().max(id.next().index());
        self.inner.camera_count.set(count);
    }

    pub(crate) async fn select(&self, id: CameraId) -> Result<(), RequestError> {
        console::log!("setting camera", id.index());
        let html = (self.inner.fetch)(select_camera_url(id)).await?;
        self.show(id, &html);
        console::log!("camera set", id.index());
        Ok(())
    }

    /// Creates a camera server side, lists it and selects it. Returns the new id.
    pub(crate) async fn add(&self) -> Result<CameraId, RequestError> {
        (self.inner.fetch)(ADD_CAMERA_URL.to_string()).await?;
        let id = CameraId::new(self.camera_count());
        console::log!("added camera", id.index());
        if let Err(err) = self.append_entry(id) {
            console::warn!("camera entry not listed", id.index(), err.to_string());
        }
        self.select(id).await?;
        Ok(id)
    }

    /// Replaces the main region and wires the control panel the markup carries.
    pub(crate) fn show(&self, id: CameraId, html: &str) {
        self.inner.main.set_inner_html(html);
        self.wire_controls(id);
    }

    pub(crate) fn append_entry(&self, id: CameraId) -> Result<Element, UiError> {
        let document = dom::owner_document(&self.inner.sidebar)?;
        let anchor = document.create_element("a")?;
        anchor.set_id(&id.to_string());
        anchor.set_attribute("href", "#")?;
        anchor.set_text_content(Some(&format!("Camera {id}")));
        match self.inner.add_button.parent_node() {
            Some(parent) => {
                parent.insert_before(&anchor, Some(&self.inner.add_button))?;
            }
            None => {
                self.inner.sidebar.append_child(&anchor)?;
            }
        }
        self.bind_entry(&anchor, id);
        Ok(anchor)
    }

    fn wire_controls(&self, id: CameraId) {
        let mut listeners = self.inner.control_listeners.borrow_mut();
        listeners.clear();

        if let Some(reset) = dom::descendant_by_id(&self.inner.main, RESET_BUTTON_ID) {
            listeners.push(EventListener::new(&reset, "click", |_event| {
                let Ok(window) = dom::window() else {
                    return;
                };
                if let Err(err) = window.location().reload() {
                    console::warn!("page reload failed", dom::js_err(err));
                }
            }));
        }

        if let Some(apply) = dom::descendant_by_id(&self.inner.main, APPLY_BUTTON_ID) {
            let weak = Rc::downgrade(&self.inner);
            listeners.push(EventListener::new(&apply, "click", move |_event| {
                let Some(selector) = Self::from_weak(&weak) else {
                    return;
                };
                spawn_local(async move {
                    if let Err(err) = selector.select(id).await {
                        console::warn!("camera apply failed", id.index(), err.to_string());
                    }
                });
            }));
        }
    }

    #[cfg(all(test, target_arch = "wasm32"))]
    fn control_listener_count(&self) -> usize {
        self.inner.control_listeners.borrow().len()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use gloo::timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;
    use web_sys::Event;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture(entries: &[&str]) -> (Element, Element, Element) {
        let document = dom::document().expect("document");
        let main = document.create_element("div").expect("main");
        let sidebar = document.create_element("nav").expect("sidebar");
        for id in entries {
            let anchor = document.create_element("a").expect("anchor");
            anchor.set_id(id);
            sidebar.append_child(&anchor).expect("append");
        }
        let add = document.create_element("a").expect("add");
        add.set_id(ADD_CAMERA_ID);
        sidebar.append_child(&add).expect("append add");
        let separator = document.create_element("a").expect("separator");
        sidebar.append_child(&separator).expect("append separator");
        (main, sidebar, add)
    }

    #[wasm_bindgen_test]
    fn mount_counts_numbered_entries_only() {
        let (main, sidebar, add) = fixture(&["0", "1", "2"]);
        let selector = CameraSelector::new(main, sidebar, add);
        selector.mount();
        assert_eq!(selector.camera_count(), 3);
    }

    #[wasm_bindgen_test]
    fn count_follows_highest_index() {
        let (main, sidebar, add) = fixture(&["0", "4"]);
        let selector = CameraSelector::new(main, sidebar, add);
        selector.mount();
        assert_eq!(selector.camera_count(), 5);
    }

    #[wasm_bindgen_test]
    fn appended_entry_lands_before_add_control() {
        let (main, sidebar, add) = fixture(&["0", "1"]);
        let selector = CameraSelector::new(main, sidebar.clone(), add);
        selector.mount();
        let anchor = selector.append_entry(CameraId::new(2)).expect("entry");
        assert_eq!(anchor.id(), "2");
        assert_eq!(anchor.text_content().as_deref(), Some("Camera 2"));
        assert_eq!(selector.camera_count(), 3);

        let anchors = sidebar.get_elements_by_tag_name("a");
        let ids: Vec<String> = (0..anchors.length())
            .filter_map(|idx| anchors.item(idx))
            .map(|anchor| anchor.id())
            .collect();
        assert_eq!(ids, vec!["0", "1", "2", ADD_CAMERA_ID, ""]);
    }

    #[wasm_bindgen_test]
    fn show_replaces_main_and_wires_controls_by_id() {
        let (main, sidebar, add) = fixture(&["0"]);
        let selector = CameraSelector::new(main.clone(), sidebar, add);
        selector.mount();
        selector.show(
            CameraId::new(0),
            r#"<img id="camera-live"><button id="camera-crop" disabled></button><hr>
            <button id="camera-reset"></button><button id="camera-apply"></button>"#,
        );
        assert!(main.query_selector("#camera-live").expect("query").is_some());
        assert_eq!(selector.control_listener_count(), 2);
    }

    #[wasm_bindgen_test]
    fn show_without_controls_leaves_nothing_bound() {
        let (main, sidebar, add) = fixture(&["0"]);
        let selector = CameraSelector::new(main.clone(), sidebar, add);
        selector.show(CameraId::new(0), "<p>offline</p>");
        assert_eq!(main.inner_html(), "<p>offline</p>");
        assert_eq!(selector.control_listener_count(), 0);
    }

    fn serve(url: &str) -> Result<String, RequestError> {
        match url {
            "/cameras?add=1" => Ok(String::new()),
            "/cameras?config=9" => Err(RequestError::Status(500)),
            _ => Ok(format!("<p>{url}</p>")),
        }
    }

    #[wasm_bindgen_test]
    async fn select_requests_config_and_swaps_main() {
        let (main, sidebar, add) = fixture(&["0", "1", "2", "3"]);
        let (fetch, requests) = http::scripted_fetch(serve);
        let selector = CameraSelector::with_fetch(main.clone(), sidebar, add, fetch);
        selector.select(CameraId::new(3)).await.expect("select");
        assert_eq!(*requests.borrow(), vec!["/cameras?config=3".to_string()]);
        assert_eq!(main.inner_html(), "<p>/cameras?config=3</p>");
    }

    #[wasm_bindgen_test]
    async fn clicking_an_entry_issues_one_request() {
        let (main, sidebar, add) = fixture(&["0", "1"]);
        let (fetch, requests) = http::scripted_fetch(serve);
        let selector = CameraSelector::with_fetch(main.clone(), sidebar.clone(), add, fetch);
        selector.mount();
        let entry = sidebar.query_selector("[id=\"1\"]").expect("query").expect("entry");
        entry
            .dispatch_event(&Event::new("click").expect("event"))
            .expect("dispatch");
        TimeoutFuture::new(0).await;
        assert_eq!(*requests.borrow(), vec!["/cameras?config=1".to_string()]);
        assert_eq!(main.inner_html(), "<p>/cameras?config=1</p>");
    }

    #[wasm_bindgen_test]
    async fn add_lists_binds_and_selects_new_camera() {
        let (main, sidebar, add) = fixture(&["0", "1"]);
        let (fetch, requests) = http::scripted_fetch(serve);
        let selector = CameraSelector::with_fetch(main.clone(), sidebar.clone(), add, fetch);
        selector.mount();
        let id = selector.add().await.expect("add");
        assert_eq!(id, CameraId::new(2));
        assert_eq!(
            *requests.borrow(),
            vec!["/cameras?add=1".to_string(), "/cameras?config=2".to_string()]
        );
        assert_eq!(main.inner_html(), "<p>/cameras?config=2</p>");
        assert_eq!(selector.camera_count(), 3);

        let entry = sidebar.query_selector("[id=\"2\"]").expect("query").expect("entry");
        entry
            .dispatch_event(&Event::new("click").expect("event"))
            .expect("dispatch");
        TimeoutFuture::new(0).await;
        assert_eq!(requests.borrow().len(), 3);
        assert_eq!(requests.borrow()[2], "/cameras?config=2");
    }

    #[wasm_bindgen_test]
    async fn failed_select_keeps_main_content() {
        let (main, sidebar, add) = fixture(&["9"]);
        main.set_inner_html("<p>current</p>");
        let (fetch, _requests) = http::scripted_fetch(serve);
        let selector = CameraSelector::with_fetch(main.clone(), sidebar, add, fetch);
        let result = selector.select(CameraId::new(9)).await;
        assert_eq!(result, Err(RequestError::Status(500)));
        assert_eq!(main.inner_html(), "<p>current</p>");
    }

    #[wasm_bindgen_test]
    async fn failed_add_lists_nothing() {
        let (main, sidebar, add) = fixture(&["0"]);
        let (fetch, requests) = http::scripted_fetch(|_url| Err(RequestError::Status(503)));
        let selector = CameraSelector::with_fetch(main, sidebar, add, fetch);
        selector.mount();
        assert_eq!(selector.add().await, Err(RequestError::Status(503)));
        assert_eq!(*requests.borrow(), vec!["/cameras?add=1".to_string()]);
        assert_eq!(selector.camera_count(), 1);
    }
}
