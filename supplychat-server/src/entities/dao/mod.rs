pub mod message;
pub mod session;
pub mod user;

pub use message::{ChatMessage, MessageRole, NewMessage};
pub use session::ChatSession;
pub use user::{NewUser, UserRecord};
