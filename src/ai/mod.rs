pub mod chat;
pub mod mock;
pub mod provider;
pub mod timer;

pub use provider::{ResponseProvider, SharedProvider};
