//! Mandi price agent.

use super::Analyzer;
use crate::analysis::{repair_into, Shape};
use crate::backend::{GenerativeBackend, Prompt};
use crate::error::AgentError;
use crate::models::{AnalysisRequest, PriceReport};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Commodities reported when the backend cannot list them.
const FALLBACK_COMMODITIES: [&str; 4] = ["Potato", "Tomato", "Onion", "Red Chillies"];

/// Commodity and location to price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    pub commodity: String,
    pub location: String,
}

impl From<&AnalysisRequest> for PriceQuery {
    fn from(request: &AnalysisRequest) -> Self {
        Self {
            commodity: request.commodity().to_string(),
            location: request.location().to_string(),
        }
    }
}

/// Looks up daily market prices through the generative backend.
pub struct PriceAnalyzer {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl PriceAnalyzer {
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }

    async fn fetch(
        &self,
        backend: &dyn GenerativeBackend,
        commodity: &str,
        location: &str,
    ) -> Result<PriceReport, AgentError> {
        let user = format!(
            "Return today's mandi prices for commodity '{}' in '{}' as JSON matching the schema: \
             {{commodity, city, date, prices:[{{market, min_price, max_price, modal_price}}], source}}.",
            commodity, location
        );
        let raw = backend.generate(&Prompt::new(SYSTEM_PROMPT, user)).await?;
        Ok(repair_into(&raw, Shape::Object)?)
    }

    /// Commodity names known to the market backend.
    pub async fn list_commodities(&self) -> Vec<String> {
        let fallback = || -> Vec<String> {
            FALLBACK_COMMODITIES.iter().map(|s| s.to_string()).collect()
        };

        let Some(ref backend) = self.backend else {
            warn!("Market backend not configured; using built-in commodity list");
            return fallback();
        };

        info!("Asking {} for the commodity list", backend.model_name());
        let prompt = Prompt::new(SYSTEM_PROMPT, COMMODITIES_PROMPT);
        let result = match backend.generate(&prompt).await {
            Ok(raw) => repair_into::<Vec<String>>(&raw, Shape::Array).map_err(AgentError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(commodities) if !commodities.is_empty() => commodities,
            Ok(_) => fallback(),
            Err(e) => {
                warn!("Commodity listing failed, using built-in list: {}", e);
                fallback()
            }
        }
    }
}

#[async_trait]
impl Analyzer for PriceAnalyzer {
    type Input = PriceQuery;
    type Output = PriceReport;

    fn name(&self) -> &'static str {
        "price"
    }

    async fn run(&self, query: PriceQuery) -> PriceReport {
        let commodity = query.commodity.trim();
        let location = query.location.trim();

        if commodity.is_empty() || location.is_empty() {
            warn!("Missing commodity or city for price lookup");
            return PriceReport::missing_parameters(commodity, location);
        }

        let Some(ref backend) = self.backend else {
            warn!("Market backend not configured; returning stub prices");
            return PriceReport::stub(commodity, location);
        };

        info!("Asking {} for {} prices in {}", backend.model_name(), commodity, location);
        match self.fetch(backend.as_ref(), commodity, location).await {
            Ok(report) => {
                info!("Received {} market price(s)", report.prices.len());
                report
            }
            Err(e) => {
                warn!("Price lookup failed, returning stub prices: {}", e);
                PriceReport::stub(commodity, location)
            }
        }
    }
}

const SYSTEM_PROMPT: &str = r#"You are a reliable agricultural market-price assistant.
ALWAYS respond only in valid JSON with these keys:
commodity, city, date, prices (array of {market, min_price, max_price, modal_price}), source.
Do not output any extra text outside the JSON."#;

const COMMODITIES_PROMPT: &str =
    "Provide a JSON array of unique commodity names available in today's mandi data.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{Reply, ScriptedBackend};
    use crate::models::{PriceEntry, SOURCE_MISSING_PARAMETERS, SOURCE_STUB};

    const NOISY: &str = include_str!("../../fixtures/responses/prices_noisy.txt");

    fn agent(backend: &Arc<ScriptedBackend>) -> PriceAnalyzer {
        PriceAnalyzer::new(Some(backend.clone() as Arc<dyn GenerativeBackend>))
    }

    fn query(commodity: &str, location: &str) -> PriceQuery {
        PriceQuery {
            commodity: commodity.to_string(),
            location: location.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_parameters_makes_no_call() {
        let backend = Arc::new(ScriptedBackend::text(NOISY));

        for (commodity, location) in [("", "Pune"), ("Onion", ""), (" ", " ")] {
            let report = agent(&backend).run(query(commodity, location)).await;
            assert_eq!(report.source, SOURCE_MISSING_PARAMETERS);
            assert!(report.prices.is_empty());
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_noisy_reply_is_repaired() {
        let backend = Arc::new(ScriptedBackend::text(NOISY));
        let report = agent(&backend).run(query("Potato", "Bangalore")).await;

        assert_eq!(report.source, "Agmarknet");
        assert_eq!(report.prices.len(), 2);
        assert_eq!(report.prices[0].market, "Yeshwanthpur");
        assert_eq!(report.prices[0].modal_price, 1650.0);

        let prompt = backend.last_prompt().unwrap();
        assert!(prompt.user.contains("'Potato' in 'Bangalore'"));
        assert!(prompt.images.is_empty());
    }

    #[tokio::test]
    async fn test_quoted_prices_are_kept() {
        let reply = r#"Here you go: {"commodity":"Onion","city":"Nashik","date":"2026-10-18","prices":[{"market":"Lasalgaon","min_price":"1,200","max_price":"1800","modal_price":"1550"}],"source":"Agmarknet"}"#;
        let backend = Arc::new(ScriptedBackend::text(reply));
        let report = agent(&backend).run(query("Onion", "Nashik")).await;

        assert_eq!(report.source, "Agmarknet");
        assert_eq!(report.prices[0].min_price, 1200.0);
        assert_eq!(report.prices[0].modal_price, 1550.0);
    }

    #[tokio::test]
    async fn test_unconfigured_returns_stub() {
        let report = PriceAnalyzer::new(None).run(query("Potato", "Agra")).await;
        assert_eq!(report.source, SOURCE_STUB);
        assert_eq!(report.prices, vec![PriceEntry::placeholder()]);
        assert_eq!(report.commodity.as_deref(), Some("Potato"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_returns_stub() {
        let backend = Arc::new(ScriptedBackend::text("Prices are not available today."));
        let report = agent(&backend).run(query("Potato", "Agra")).await;
        assert_eq!(report.source, SOURCE_STUB);
        assert_eq!(report.prices.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_returns_stub() {
        let backend = Arc::new(ScriptedBackend::new(Reply::Fail));
        let report = agent(&backend).run(query("Potato", "Agra")).await;
        assert_eq!(report.source, SOURCE_STUB);
    }

    #[tokio::test]
    async fn test_list_commodities_repairs_array() {
        let backend = Arc::new(ScriptedBackend::text(
            "Sure, here you go: [\"Wheat\", \"Paddy\", \"Maize\"] (prices vary)",
        ));
        let commodities = agent(&backend).list_commodities().await;
        assert_eq!(commodities, vec!["Wheat", "Paddy", "Maize"]);
    }

    #[tokio::test]
    async fn test_list_commodities_fallback() {
        let commodities = PriceAnalyzer::new(None).list_commodities().await;
        assert_eq!(commodities, FALLBACK_COMMODITIES.to_vec());

        let backend = Arc::new(ScriptedBackend::text("no list today"));
        let commodities = agent(&backend).list_commodities().await;
        assert_eq!(commodities.len(), 4);
    }
}
