use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::console;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CloseEvent, ErrorEvent, Event, MessageEvent, WebSocket};

use camconsole_core::{decode_log_frame, LogEvent, JOIN_FRAME};

use crate::dom::UiError;

/// Something a log viewer can subscribe to.
pub(crate) trait LogSource {
    fn subscribe(
        &mut self,
        on_event: Rc<dyn Fn(LogEvent)>,
        on_closed: Rc<dyn Fn()>,
    ) -> Result<(), UiError>;

    fn close(&mut self);
}

#[allow(dead_code)]
struct WsHandlers {
    onopen: Closure<dyn FnMut(Event)>,
    onmessage: Closure<dyn FnMut(MessageEvent)>,
    onerror: Closure<dyn FnMut(ErrorEvent)>,
    onclose: Closure<dyn FnMut(Event)>,
}

/// Log stream over a plain WebSocket: one text frame per record.
pub(crate) struct WebSocketLogSource {
    url: String,
    ws: Rc<RefCell<Option<WebSocket>>>,
    handlers: Rc<RefCell<Option<WsHandlers>>>,
    closing: Rc<Cell<bool>>,
}

impl WebSocketLogSource {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            ws: Rc::new(RefCell::new(None)),
            handlers: Rc::new(RefCell::new(None)),
            closing: Rc::new(Cell::new(false)),
        }
    }
}

/// Binary frames carry nothing the viewer understands and are skipped.
pub(crate) fn decode_message_data(data: &JsValue) -> Option<LogEvent> {
    data.as_string().map(|text| decode_log_frame(&text))
}

impl LogSource for WebSocketLogSource {
    fn subscribe(
        &mut self,
        on_event: Rc<dyn Fn(LogEvent)>,
        on_closed: Rc<dyn Fn()>,
    ) -> Result<(), UiError> {
        self.close();
        let closing = Rc::new(Cell::new(false));
        self.closing = closing.clone();

        if self.url.is_empty() {
            return Err(UiError::Js("log stream url is empty".to_string()));
        }
        let ws = WebSocket::new(&self.url).map_err(|err| {
            console::warn!("failed to open log stream", self.url.clone());
            UiError::from(err)
        })?;
        *self.ws.borrow_mut() = Some(ws.clone());

        let onopen = {
            let url = self.url.clone();
            let ws = ws.clone();
            Closure::wrap(Box::new(move |_event: Event| {
                console::log!("connected to log stream", url.clone());
                if ws.send_with_str(JOIN_FRAME).is_err() {
                    console::warn!("log stream join failed", url.clone());
                }
            }) as Box<dyn FnMut(Event)>)
        };
        let onmessage = {
            let on_event = on_event.clone();
            Closure::wrap(Box::new(move |event: MessageEvent| {
                if let Some(log_event) = decode_message_data(&event.data()) {
                    on_event(log_event);
                }
            }) as Box<dyn FnMut(MessageEvent)>)
        };
        let onerror = {
            let url = self.url.clone();
            Closure::wrap(Box::new(move |_event: ErrorEvent| {
                console::warn!("log stream error", url.clone());
            }) as Box<dyn FnMut(ErrorEvent)>)
        };
        let onclose = {
            let ws_ref = self.ws.clone();
            let handlers_ref = self.handlers.clone();
            let url = self.url.clone();
            let on_closed = on_closed.clone();
            let closing = closing.clone();
            Closure::wrap(Box::new(move |event: Event| {
                ws_ref.borrow_mut().take();
                handlers_ref.borrow_mut().take();
                if closing.get() {
                    return;
                }
                match event.dyn_ref::<CloseEvent>() {
                    Some(close) if !close.reason().is_empty() => {
                        console::log!(
                            "disconnected from log stream",
                            url.clone(),
                            close.code(),
                            close.reason()
                        );
                    }
                    Some(close) => {
                        console::log!("disconnected from log stream", url.clone(), close.code());
                    }
                    None => console::log!("disconnected from log stream", url.clone()),
                }
                on_closed();
            }) as Box<dyn FnMut(Event)>)
        };

        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        *self.handlers.borrow_mut() = Some(WsHandlers {
            onopen,
            onmessage,
            onerror,
            onclose,
        });
        Ok(())
    }

    fn close(&mut self) {
        self.closing.set(true);
        self.handlers.borrow_mut().take();
        if let Some(ws) = self.ws.borrow_mut().take() {
            let _ = ws.close();
        }
    }
}

impl Drop for WebSocketLogSource {
    fn drop(&mut self) {
        self.close();
    }
}
