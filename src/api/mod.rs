pub mod routes;
mod server;
pub use server::{app, serve, spawn_idle_sweep};
pub mod public;
mod state;
pub use state::AppState;
