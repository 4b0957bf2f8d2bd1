//! Test doubles for the backend traits.

use crate::analysis::ForecastSlice;
use crate::backend::{Coordinates, CurrentConditions, GenerativeBackend, Prompt, WeatherBackend};
use crate::error::AgentError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted generative backend does when called.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    Panic,
}

/// Generative backend returning a fixed reply, counting calls.
pub struct ScriptedBackend {
    reply: Reply,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedBackend {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<Prompt> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(AgentError::Connect {
                backend: "scripted",
                url: "http://127.0.0.1:9".to_string(),
            }),
            Reply::Panic => panic!("scripted backend panic"),
        }
    }
}

/// Weather backend with fixed answers, counting calls per endpoint.
pub struct ScriptedWeather {
    current: Option<CurrentConditions>,
    forecast: Option<Vec<ForecastSlice>>,
    delay: Duration,
    current_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
}

impl ScriptedWeather {
    /// `None` makes the corresponding endpoint fail.
    pub fn new(current: Option<CurrentConditions>, forecast: Option<Vec<ForecastSlice>>) -> Self {
        Self {
            current,
            forecast,
            delay: Duration::ZERO,
            current_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherBackend for ScriptedWeather {
    async fn current(&self, _location: &str) -> Result<CurrentConditions, AgentError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.current.clone().ok_or(AgentError::Timeout {
            backend: "scripted",
            seconds: 10,
        })
    }

    async fn forecast(&self, _coordinates: Coordinates) -> Result<Vec<ForecastSlice>, AgentError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        self.forecast.clone().ok_or(AgentError::Status {
            backend: "scripted",
            status: 502,
            body: "bad gateway".to_string(),
        })
    }
}

/// Current conditions in Bengaluru with coordinates.
pub fn bengaluru() -> CurrentConditions {
    CurrentConditions {
        temperature: Some(24.3),
        humidity: Some(78.0),
        description: Some("light rain".to_string()),
        wind_speed: Some(3.6),
        precipitation: Some(0.42),
        coordinates: Some(Coordinates {
            lat: 12.9762,
            lon: 77.6033,
        }),
    }
}

/// Eight dry slices.
pub fn dry_forecast() -> Vec<ForecastSlice> {
    vec![
        ForecastSlice {
            precipitation_probability: Some(0.05),
            ..Default::default()
        };
        8
    ]
}
