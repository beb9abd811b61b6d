//! Session-stored models for the storefront.

pub mod flash;
pub mod session;

pub use flash::{Flash, FlashKind, push_flash, take_flashes};
pub use session::{CurrentUser, keys as session_keys};
