use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use gloo::console;
use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlFormElement, HtmlInputElement};

use camconsole_core::{BcryptSalt, Credentials, HashError, SaltError};

use crate::dom::{self, UiError};
use crate::http::{self, Fetch, RequestError};

pub(crate) const LOGIN_FORM_ID: &str = "login";

#[derive(Debug)]
pub(crate) enum LoginError {
    Request(RequestError),
    Salt(SaltError),
    Hash(HashError),
}

impl LoginError {
    /// Text for the blocking alert shown when a login attempt fails.
    pub(crate) fn alert_text(&self) -> String {
        match self {
            LoginError::Request(err) => format!("Error: {}", err.status_code()),
            LoginError::Salt(_) => "Error: invalid salt".to_string(),
            LoginError::Hash(err) => format!("Error: {err}"),
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::Request(err) => write!(f, "salt request failed: {err}"),
            LoginError::Salt(err) => write!(f, "bad salt: {err}"),
            LoginError::Hash(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<RequestError> for LoginError {
    fn from(err: RequestError) -> Self {
        LoginError::Request(err)
    }
}

impl From<SaltError> for LoginError {
    fn from(err: SaltError) -> Self {
        LoginError::Salt(err)
    }
}

impl From<HashError> for LoginError {
    fn from(err: HashError) -> Self {
        LoginError::Hash(err)
    }
}

/// Side effects of a login attempt, replaceable so the flow runs without a server.
#[derive(Clone)]
pub(crate) struct LoginHooks {
    pub(crate) fetch: Fetch,
    pub(crate) navigate: Rc<dyn Fn(&str)>,
    pub(crate) alert: Rc<dyn Fn(&str)>,
}

impl LoginHooks {
    pub(crate) fn browser() -> Self {
        Self {
            fetch: http::browser_fetch(),
            navigate: Rc::new(navigate),
            alert: Rc::new(dom::alert),
        }
    }
}

struct LoginInner {
    form: HtmlFormElement,
    hooks: LoginHooks,
    in_flight: Cell<bool>,
    listener: RefCell<Option<EventListener>>,
}

/// Intercepts the login form, hashes the password with the user's salt and
/// navigates to the login URL once.
#[derive(Clone)]
pub(crate) struct LoginHandler {
    inner: Rc<LoginInner>,
}

impl LoginHandler {
    pub(crate) fn new(form: HtmlFormElement) -> Self {
        Self::with_hooks(form, LoginHooks::browser())
    }

    pub(crate) fn with_hooks(form: HtmlFormElement, hooks: LoginHooks) -> Self {
        Self {
            inner: Rc::new(LoginInner {
                form,
                hooks,
                in_flight: Cell::new(false),
                listener: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn from_document(document: &Document) -> Result<Self, UiError> {
        dom::element_by_id::<HtmlFormElement>(document, LOGIN_FORM_ID).map(Self::new)
    }

    fn from_weak(weak: &Weak<LoginInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn mount(&self) {
        let weak = Rc::downgrade(&self.inner);
        let listener = EventListener::new_with_options(
            &self.inner.form,
            "submit",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                event.prevent_default();
                let Some(handler) = Self::from_weak(&weak) else {
                    return;
                };
                spawn_local(async move {
                    handler.submit().await;
                });
            },
        );
        *self.inner.listener.borrow_mut() = Some(listener);
    }

    pub(crate) fn read_credentials(&self) -> Result<Credentials, UiError> {
        let form: &Element = &self.inner.form;
        let username = field_value(form, "username")?;
        let password = field_value(form, "password")?;
        let next = field_value(form, "next").unwrap_or_default();
        Ok(Credentials {
            username,
            password,
            next,
        })
    }

    /// Runs one login attempt. Returns false when another attempt already
    /// owns the form or the form is incomplete.
    ///
    /// The guard stays set after a successful navigation: the page is being
    /// replaced and later submits must not issue a second request.
    pub(crate) async fn submit(&self) -> bool {
        if self.inner.in_flight.replace(true) {
            console::log!("login already in progress");
            return false;
        }
        let credentials = match self.read_credentials() {
            Ok(credentials) => credentials,
            Err(err) => {
                self.inner.in_flight.set(false);
                console::warn!("login form incomplete", err.to_string());
                return false;
            }
        };
        match login_target(&self.inner.hooks.fetch, &credentials).await {
            Ok(url) => (self.inner.hooks.navigate)(&url),
            Err(err) => {
                self.inner.in_flight.set(false);
                console::warn!("login failed", err.to_string());
                (self.inner.hooks.alert)(&err.alert_text());
            }
        }
        true
    }
}

/// Fetches the salt and returns the URL the browser should go to.
pub(crate) async fn login_target(
    fetch: &Fetch,
    credentials: &Credentials,
) -> Result<String, LoginError> {
    let raw_salt = fetch(credentials.salt_url()).await?;
    let salt = BcryptSalt::parse(&raw_salt)?;
    let hash = credentials.hash_with(&salt)?;
    Ok(credentials.login_url(&hash))
}

fn navigate(url: &str) {
    let Ok(window) = dom::window() else {
        return;
    };
    if let Err(err) = window.location().assign(url) {
        console::warn!("navigation failed", dom::js_err(err));
    }
}

fn field_value(form: &Element, name: &str) -> Result<String, UiError> {
    form.query_selector(&format!("[name=\"{name}\"]"))?
        .ok_or_else(|| UiError::MissingElement(name.to_string()))?
        .dyn_into::<HtmlInputElement>()
        .map(|input| input.value())
        .map_err(|_| UiError::WrongElementType(name.to_string()))
}
