pub mod alias;
pub mod loading;
pub mod notifications;
pub mod session;

pub use alias::AliasStore;
pub use loading::{LoadTag, LoadingGuard, LoadingRegistry};
pub use notifications::{Notification, NotificationKind, NotificationQueue};
pub use session::{SessionSnapshot, UserSession};
