//! Credential checks and access tokens.

pub mod password;
pub mod token;

pub use token::TokenIssuer;
