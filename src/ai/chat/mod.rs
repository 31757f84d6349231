mod core;
pub use self::core::{ChatSession, PendingTurn, SendRejected, TurnOutcome};

pub mod models;
pub use models::{Message, Transcript};
