use std::fmt;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};
use gloo::net::http::Request;

/// GET returning the response body; swapped out in tests.
pub(crate) type Fetch = Rc<dyn Fn(String) -> LocalBoxFuture<'static, Result<String, RequestError>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestError {
    Network(String),
    Status(u16),
}

impl RequestError {
    /// Status as an XHR would report it: 0 when no response arrived.
    pub(crate) fn status_code(&self) -> u16 {
        match self {
            RequestError::Network(_) => 0,
            RequestError::Status(status) => *status,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Network(message) => write!(f, "network error: {message}"),
            RequestError::Status(status) => write!(f, "request failed with status {status}"),
        }
    }
}

impl std::error::Error for RequestError {}

pub(crate) async fn get_text(url: &str) -> Result<String, RequestError> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|err| RequestError::Network(err.to_string()))?;
    if !response.ok() {
        return Err(RequestError::Status(response.status()));
    }
    response
        .text()
        .await
        .map_err(|err| RequestError::Network(err.to_string()))
}

pub(crate) fn browser_fetch() -> Fetch {
    Rc::new(|url: String| async move { get_text(&url).await }.boxed_local())
}

/// Fetch that records every requested url and answers from `respond`.
#[cfg(all(test, target_arch = "wasm32"))]
pub(crate) fn scripted_fetch(
    respond: impl Fn(&str) -> Result<String, RequestError> + 'static,
) -> (Fetch, Rc<std::cell::RefCell<Vec<String>>>) {
    let requests = Rc::new(std::cell::RefCell::new(Vec::new()));
    let log = requests.clone();
    let fetch: Fetch = Rc::new(move |url: String| {
        log.borrow_mut().push(url.clone());
        let outcome = respond(&url);
        async move { outcome }.boxed_local()
    });
    (fetch, requests)
}
