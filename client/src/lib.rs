//! Client-side state and navigation for the alias manager.
//!
//! [`App`] wires the services together: the durable token store, the user
//! session decoded from that token, the loading registry, the notification
//! queue, the alias collection store and the router with its auth guards.

pub mod app;
pub mod error;
pub mod http;
pub mod router;
pub mod state;
pub mod storage;
pub mod util;

pub use app::App;
pub use error::ClientError;
