pub mod error;
pub mod http;
pub mod openai;

#[cfg(test)]
mod test_support;

/// Sent with every outgoing request.
pub const USER_AGENT: &str = concat!("project-scout/", env!("CARGO_PKG_VERSION"));
