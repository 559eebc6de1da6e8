pub mod message;
pub mod profile;

pub use message::ConversationMessage;
pub use profile::{UserProfile, WalletRef};
