//! Media assets
//!
//! Upload path derivation and on-disk storage for the images attached to
//! issues, image content and articles:
//! - `clock`: injectable source of the current instant
//! - `upload`: deterministic, sanitized relative paths for uploaded files
//! - `storage`: writes files under the media root and builds their URLs

pub mod clock;
pub mod storage;
pub mod upload;

pub use clock::{Clock, FixedClock, SystemClock};
pub use storage::MediaStorage;
pub use upload::{sanitize_filename, upload_timestamp, UploadKind, UploadPathDeriver};
