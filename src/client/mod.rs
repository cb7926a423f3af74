//! Client half of the application: the typed API client plus the navigation
//! gate that runs before protected pages.

pub mod api;
pub mod guard;
pub mod session;

pub use api::{ApiClient, ClientError};
pub use guard::{AccessGuard, LogNotifier, Navigation, Notifier};
pub use session::{MemoryTokenStore, Session, TokenStore};
