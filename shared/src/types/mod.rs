pub mod alias;
pub mod client_config;
pub mod json_error;
pub mod jwt;

pub use self::alias::{Alias, AliasType, FormError, PostAlias, PutAlias, is_valid_image};
pub use self::client_config::{AppConfig, ConfigError};
pub use self::json_error::ErrorResponse;
pub use self::jwt::{TokenClaims, TokenError};
