pub mod collaborators;
pub mod models;
pub mod service;

pub use models::*;
pub use service::{AppState, create_app};
