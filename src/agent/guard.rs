//! Outermost safety net around the supervisor.
//!
//! [`RequestGuard::handle`] always returns a usable composite. Construction
//! faults (bad endpoints, HTTP client setup) and runtime faults (a panicking
//! agent task) are logged and replaced by a fully stubbed result.

use super::Supervisor;
use crate::config::Config;
use crate::error::SupervisorError;
use crate::models::{AnalysisRequest, CompositeResult};
use tracing::{error, info};

type SupervisorFactory = Box<dyn Fn() -> Result<Supervisor, SupervisorError> + Send + Sync>;

pub struct RequestGuard {
    factory: SupervisorFactory,
}

impl RequestGuard {
    /// Guard that builds a fresh supervisor from `config` for each request.
    pub fn new(config: Config) -> Self {
        Self::with_factory(move || Supervisor::from_config(&config))
    }

    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Supervisor, SupervisorError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
        }
    }

    pub async fn handle(&self, request: &AnalysisRequest) -> CompositeResult {
        match self.try_handle(request).await {
            Ok(composite) => composite,
            Err(e) => {
                error!("Diagnosis pipeline failed, returning stub response: {}", e);
                CompositeResult::fallback(request, &e)
            }
        }
    }

    async fn try_handle(&self, request: &AnalysisRequest) -> Result<CompositeResult, SupervisorError> {
        let supervisor = (self.factory)()?;
        let composite = supervisor.run_all(request).await?;

        let degraded = composite.degraded_sections();
        if !degraded.is_empty() {
            info!("Degraded sections: {}", degraded.join(", "));
        }

        Ok(composite)
    }
}
