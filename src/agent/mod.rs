//! Analyzer agents and their orchestration.
//!
//! Every agent wraps one remote capability behind [`Analyzer::run`], which
//! cannot fail: backend errors are logged and turned into stub results.
//! The [`Supervisor`] fans out to the three diagnosis agents and the
//! [`RequestGuard`] masks anything that goes wrong around them.

pub mod guard;
pub mod knowledge;
pub mod market;
pub mod supervisor;
pub mod vision;
pub mod weather;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

pub use guard::RequestGuard;
pub use knowledge::KnowledgeAgent;
pub use market::{PriceAnalyzer, PriceQuery};
pub use supervisor::Supervisor;
pub use vision::ImageAnalyzer;
pub use weather::ConditionAnalyzer;

/// An agent wrapping one external analysis capability.
#[async_trait]
pub trait Analyzer: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Short name used in logs and task errors.
    fn name(&self) -> &'static str;

    /// Run the analysis. Returns a stub output instead of an error.
    async fn run(&self, input: Self::Input) -> Self::Output;
}
