pub mod camera_id;
pub mod credentials;
pub mod endpoints;
pub mod log_event;

pub use camera_id::{CameraId, CameraIdError};
pub use credentials::{hash_password, BcryptSalt, BcryptVersion, Credentials, HashError, SaltError};
pub use endpoints::{login_url, salt_url, select_camera_url, ADD_CAMERA_URL};
pub use log_event::{decode_log_frame, LogEvent, JOIN_FRAME};
