//! Request-handling logic shared by the HTTP routes.

pub mod chat;
pub mod session;
