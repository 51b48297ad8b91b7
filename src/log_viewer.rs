use std::cell::RefCell;
use std::rc::Rc;

use gloo::console;
use web_sys::{Document, Element};

use camconsole_core::LogEvent;

use crate::dom::{self, UiError};
use crate::log_source::LogSource;

pub(crate) const LOG_CONTAINER_ID: &str = "logContainer";

const LINE_CLASS: &str = "logline";
const TIME_CLASS: &str = "logtime";
const LEVEL_CLASS: &str = "loglevel";
const MESSAGE_CLASS: &str = "logmsg";
const MALFORMED_CLASS: &str = "logmalformed";

struct ViewerInner {
    container: Element,
    max_lines: usize,
    source: RefCell<Option<Box<dyn LogSource>>>,
}

/// Appends log lines to a container in arrival order.
#[derive(Clone)]
pub(crate) struct LogViewer {
    inner: Rc<ViewerInner>,
}

impl LogViewer {
    /// `max_lines == 0` keeps every line.
    pub(crate) fn new(container: Element, max_lines: usize) -> Self {
        Self {
            inner: Rc::new(ViewerInner {
                container,
                max_lines,
                source: RefCell::new(None),
            }),
        }
    }

    #[cfg(all(test, target_arch = "wasm32"))]
    fn container(&self) -> &Element {
        &self.inner.container
    }

    pub(crate) fn attach(&self, mut source: Box<dyn LogSource>) -> Result<(), UiError> {
        self.detach();
        let weak = Rc::downgrade(&self.inner);
        let on_event = Rc::new(move |event: LogEvent| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let viewer = LogViewer { inner };
            if let Err(err) = viewer.append(&event) {
                console::warn!("log line dropped", err.to_string());
            }
        });
        let on_closed = Rc::new(|| {
            console::log!("log stream closed");
        });
        source.subscribe(on_event, on_closed)?;
        *self.inner.source.borrow_mut() = Some(source);
        Ok(())
    }

    pub(crate) fn detach(&self) {
        if let Some(mut source) = self.inner.source.borrow_mut().take() {
            source.close();
        }
    }

    pub(crate) fn append(&self, event: &LogEvent) -> Result<Element, UiError> {
        let document = dom::owner_document(&self.inner.container)?;
        let line = render_line(&document, event)?;
        self.inner.container.append_child(&line)?;
        self.trim();
        Ok(line)
    }

    fn trim(&self) {
        if self.inner.max_lines == 0 {
            return;
        }
        let container = &self.inner.container;
        while container.child_element_count() as usize > self.inner.max_lines {
            let Some(oldest) = container.first_element_child() else {
                break;
            };
            oldest.remove();
        }
    }
}

fn render_line(document: &Document, event: &LogEvent) -> Result<Element, UiError> {
    let line = document.create_element("div")?;
    line.set_class_name(LINE_CLASS);
    match event {
        LogEvent::Entry {
            time,
            level,
            message,
        } => {
            let time = span(document, TIME_CLASS, time)?;
            let level = span(document, LEVEL_CLASS, level)?;
            let message = span(document, MESSAGE_CLASS, message)?;
            line.append_child(&time)?;
            line.append_child(&document.create_text_node(" "))?;
            line.append_child(&level)?;
            line.append_child(&document.create_text_node(" "))?;
            line.append_child(&message)?;
        }
        LogEvent::Malformed(raw) => {
            let raw = span(document, MALFORMED_CLASS, raw)?;
            line.append_child(&raw)?;
        }
    }
    Ok(line)
}

fn span(document: &Document, class: &str, text: &str) -> Result<Element, UiError> {
    let span = document.create_element("span")?;
    span.set_class_name(class);
    span.set_text_content(Some(text));
    Ok(span)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    struct ScriptedSource {
        events: Vec<LogEvent>,
        closed: Rc<RefCell<bool>>,
    }

    impl LogSource for ScriptedSource {
        fn subscribe(
            &mut self,
            on_event: Rc<dyn Fn(LogEvent)>,
            _on_closed: Rc<dyn Fn()>,
        ) -> Result<(), UiError> {
            for event in self.events.drain(..) {
                on_event(event);
            }
            Ok(())
        }

        fn close(&mut self) {
            *self.closed.borrow_mut() = true;
        }
    }

    fn container() -> Element {
        dom::document()
            .expect("document")
            .create_element("div")
            .expect("container")
    }

    #[wasm_bindgen_test]
    fn entry_renders_fields_in_order() {
        let viewer = LogViewer::new(container(), 0);
        viewer
            .append(&LogEvent::entry("12:00", "INFO", "ok"))
            .expect("append");
        assert_eq!(
            viewer.container().inner_html(),
            "<div class=\"logline\"><span class=\"logtime\">12:00</span> \
             <span class=\"loglevel\">INFO</span> <span class=\"logmsg\">ok</span></div>"
        );
    }

    #[wasm_bindgen_test]
    fn malformed_renders_raw_text_only() {
        let viewer = LogViewer::new(container(), 0);
        viewer
            .append(&LogEvent::Malformed("xxx".to_string()))
            .expect("append");
        assert_eq!(
            viewer.container().inner_html(),
            "<div class=\"logline\"><span class=\"logmalformed\">xxx</span></div>"
        );
    }

    #[wasm_bindgen_test]
    fn markup_in_messages_stays_text() {
        let viewer = LogViewer::new(container(), 0);
        let line = viewer
            .append(&LogEvent::entry("t", "WARN", "<b>bold</b>"))
            .expect("append");
        assert!(line.query_selector("b").expect("query").is_none());
        assert_eq!(line.text_content().as_deref(), Some("t WARN <b>bold</b>"));
    }

    #[wasm_bindgen_test]
    fn oldest_lines_drop_past_cap() {
        let viewer = LogViewer::new(container(), 2);
        for message in ["a", "b", "c"] {
            viewer
                .append(&LogEvent::entry("t", "INFO", message))
                .expect("append");
        }
        let container = viewer.container();
        assert_eq!(container.child_element_count(), 2);
        let first = container.first_element_child().expect("first");
        assert_eq!(first.text_content().as_deref(), Some("t INFO b"));
    }

    #[wasm_bindgen_test]
    fn attached_source_lines_arrive_in_order() {
        let closed = Rc::new(RefCell::new(false));
        let viewer = LogViewer::new(container(), 0);
        viewer
            .attach(Box::new(ScriptedSource {
                events: vec![
                    LogEvent::entry("1", "INFO", "first"),
                    LogEvent::Malformed("second".to_string()),
                    LogEvent::entry("3", "INFO", "first"),
                ],
                closed: closed.clone(),
            }))
            .expect("attach");
        let container = viewer.container();
        assert_eq!(container.child_element_count(), 3);
        assert_eq!(
            container.text_content().as_deref(),
            Some("1 INFO firstsecond3 INFO first")
        );
        viewer.detach();
        assert!(*closed.borrow());
    }
}
