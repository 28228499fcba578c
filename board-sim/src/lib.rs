pub mod chart;
pub mod collaborator;
pub mod controller;
pub mod error;
pub mod history;
pub mod metrics;
pub mod phase;
pub mod session;
pub mod transcript;
pub mod turn;

// Re-export commonly used types
pub use chart::{ChartUpdate, PatientChart};
pub use collaborator::{IllustrationCollaborator, ReasoningCollaborator};
pub use controller::{ControllerSnapshot, SessionController};
pub use error::{Result, SimError};
pub use history::{FileHistoryStore, HistoryEntry, HistoryStore, InMemoryHistoryStore};
pub use metrics::{PerformanceMetrics, PerformanceUpdate};
pub use phase::CasePhase;
pub use session::CaseSession;
pub use transcript::{Message, Role};
pub use turn::{PeerPlan, TurnOutcome, TurnRequest};
