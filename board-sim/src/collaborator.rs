use async_trait::async_trait;

use crate::{
    error::Result,
    turn::{TurnOutcome, TurnRequest},
};

/// The external text-generation service that decides feedback, phase and
/// state updates for every turn.
#[async_trait]
pub trait ReasoningCollaborator: Send + Sync {
    async fn generate_turn(&self, request: TurnRequest) -> Result<TurnOutcome>;
}

/// The external image-generation service producing anatomical renderings.
///
/// Returns a data URI. Failures never surface to the resident; the controller
/// absorbs them and the chart simply carries no illustration.
#[async_trait]
pub trait IllustrationCollaborator: Send + Sync {
    async fn generate_illustration(&self, description: &str) -> Result<String>;
}
