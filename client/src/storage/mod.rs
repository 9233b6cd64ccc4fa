mod token_store;

pub use token_store::{FileTokenStore, MemoryTokenStore, StorageError, TOKEN_KEY, TokenStore};
