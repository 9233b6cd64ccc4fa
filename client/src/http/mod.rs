mod backend;
mod client;

pub use backend::Backend;
pub use client::HttpBackend;

#[cfg(test)]
pub(crate) use backend::mock;
