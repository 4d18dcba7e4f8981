pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use bus::{EventBus, SubscriptionId};
pub use config::BheemaConfig;
pub use error::{BheemaError, Result};
pub use events::AssistantEvent;
pub use types::{ConversationMessage, Sender, Timestamp};
