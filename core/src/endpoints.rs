//! Server paths the console talks to.
//!
//! Query values are form-urlencoded so usernames and bcrypt hashes (which
//! contain `$` and `/`) survive the round trip.

use url::form_urlencoded;

use crate::camera_id::CameraId;

pub const CAMERAS_PATH: &str = "/cameras";
pub const SALT_PATH: &str = "/salt";
pub const LOGIN_PATH: &str = "/login";
pub const ADD_CAMERA_URL: &str = "/cameras?add=1";

pub fn select_camera_url(id: CameraId) -> String {
    format!("{CAMERAS_PATH}?config={id}")
}

pub fn salt_url(username: &str) -> String {
    with_query(SALT_PATH, &[("username", username)])
}

pub fn login_url(username: &str, password_hash: &str, next: &str) -> String {
    with_query(
        LOGIN_PATH,
        &[
            ("username", username),
            ("password", password_hash),
            ("next", next),
        ],
    )
}

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
    format!("{path}?{}", query.finish())
}
