pub mod attending;
pub mod illustration;

pub use attending::AttendingClient;
pub use illustration::NetterIllustrator;
