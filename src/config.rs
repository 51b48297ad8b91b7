use web_sys::Element;

pub(crate) const LOG_WS_URL_KEY: &str = "camconsole.log_ws_url";
pub(crate) const LOG_MAX_LINES_KEY: &str = "camconsole.log_max_lines";
pub(crate) const LOG_WS_URL_ATTR: &str = "data-ws-url";
pub(crate) const LOG_MAX_LINES_ATTR: &str = "data-max-lines";
pub(crate) const DEFAULT_LOG_PATH: &str = "/logs";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ConsoleConfig {
    pub(crate) log_ws_url: Option<String>,
    pub(crate) log_max_lines: usize,
}

/// Storage overrides win, then container attributes, then the build, then the page origin.
pub(crate) fn load_config(log_container: Option<&Element>) -> ConsoleConfig {
    let attr = |name: &str| log_container.and_then(|element| element.get_attribute(name));
    let log_ws_url = resolve_log_ws_url(&[
        read_storage_string(LOG_WS_URL_KEY),
        attr(LOG_WS_URL_ATTR),
        build_log_ws_url(),
        location_log_ws_url(),
    ]);
    let log_max_lines = first_count(&[
        read_storage_string(LOG_MAX_LINES_KEY),
        attr(LOG_MAX_LINES_ATTR),
    ])
    .unwrap_or(0);
    ConsoleConfig {
        log_ws_url,
        log_max_lines,
    }
}

pub(crate) fn resolve_log_ws_url(candidates: &[Option<String>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|raw| raw.trim())
        .find(|raw| !raw.is_empty())
        .map(normalize_ws_url)
}

pub(crate) fn first_count(candidates: &[Option<String>]) -> Option<usize> {
    candidates
        .iter()
        .flatten()
        .find_map(|raw| raw.trim().parse::<usize>().ok())
}

pub(crate) fn normalize_ws_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn ws_url_for_origin(protocol: &str, host: &str) -> Option<String> {
    let host = host.trim();
    if host.is_empty() {
        return None;
    }
    let scheme = if protocol.trim().eq_ignore_ascii_case("https:") {
        "wss"
    } else {
        "ws"
    };
    Some(format!("{scheme}://{host}{DEFAULT_LOG_PATH}"))
}

fn build_log_ws_url() -> Option<String> {
    option_env!("CAMCONSOLE_LOG_WS")
        .or(option_env!("TRUNK_PUBLIC_CAMCONSOLE_LOG_WS"))
        .map(str::to_string)
}

fn location_log_ws_url() -> Option<String> {
    let window = web_sys::window()?;
    let location = window.location();
    let host = location.host().ok()?;
    let protocol = location.protocol().ok()?;
    ws_url_for_origin(&protocol, &host)
}

fn read_storage_string(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let storage = window.local_storage().ok()??;
    let raw = storage.get_item(key).ok()??;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
