//! Concurrent fan-out to the three diagnosis agents.

use super::{Analyzer, ConditionAnalyzer, ImageAnalyzer, PriceAnalyzer, PriceQuery};
use crate::backend::{build_generative, build_weather};
use crate::config::Config;
use crate::error::SupervisorError;
use crate::models::{AnalysisRequest, CompositeResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

/// Owns one agent of each kind and runs them side by side.
pub struct Supervisor {
    image: Arc<ImageAnalyzer>,
    condition: Arc<ConditionAnalyzer>,
    price: Arc<PriceAnalyzer>,
}

impl Supervisor {
    pub fn new(image: ImageAnalyzer, condition: ConditionAnalyzer, price: PriceAnalyzer) -> Self {
        Self {
            image: Arc::new(image),
            condition: Arc::new(condition),
            price: Arc::new(price),
        }
    }

    /// Build the agents and their backends from configuration.
    pub fn from_config(config: &Config) -> Result<Self, SupervisorError> {
        let generative = build_generative(&config.model)?;
        let weather = build_weather(&config.weather)?;

        Ok(Self::new(
            ImageAnalyzer::new(generative.clone()),
            ConditionAnalyzer::new(weather, config.weather.thresholds()),
            PriceAnalyzer::new(generative),
        ))
    }

    /// Run all agents concurrently and wait for every one of them.
    ///
    /// Agent failures are already stubs at this point; an error here means a
    /// task panicked or was cancelled.
    pub async fn run_all(&self, request: &AnalysisRequest) -> Result<CompositeResult, SupervisorError> {
        let start = Instant::now();
        info!("Running image, condition and price agents in parallel");

        let classification = spawn_agent(&self.image, request.artifact().clone());
        let condition = spawn_agent(&self.condition, request.location().to_string());
        let price = spawn_agent(&self.price, PriceQuery::from(request));

        let (classification, condition, price) = tokio::join!(classification, condition, price);

        let composite = CompositeResult {
            classification: joined(self.image.name(), classification)?,
            condition: joined(self.condition.name(), condition)?,
            price: joined(self.price.name(), price)?,
        };

        debug!("All agents finished in {:.2?}", start.elapsed());
        Ok(composite)
    }
}

fn spawn_agent<A>(agent: &Arc<A>, input: A::Input) -> JoinHandle<A::Output>
where
    A: Analyzer + 'static,
{
    let agent = Arc::clone(agent);
    tokio::spawn(async move { agent.run(input).await })
}

fn joined<T>(agent: &'static str, result: Result<T, JoinError>) -> Result<T, SupervisorError> {
    result.map_err(|source| SupervisorError::TaskFailed { agent, source })
}
