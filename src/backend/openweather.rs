//! OpenWeather current-conditions and forecast client.

use super::{http_client, parse_base_url, Coordinates, CurrentConditions, WeatherBackend};
use crate::analysis::ForecastSlice;
use crate::config::WeatherConfig;
use crate::error::{AgentError, SupervisorError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

const BACKEND: &str = "OpenWeather";

#[derive(Debug, Deserialize)]
struct CurrentPayload {
    coord: Option<CoordPayload>,
    #[serde(default)]
    weather: Vec<DescriptionPayload>,
    main: Option<MainPayload>,
    wind: Option<WindPayload>,
    rain: Option<VolumePayload>,
    snow: Option<VolumePayload>,
}

#[derive(Debug, Deserialize)]
struct CoordPayload {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DescriptionPayload {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainPayload {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindPayload {
    speed: Option<f64>,
}

/// Precipitation volume over the last one or three hours.
#[derive(Debug, Default, Deserialize)]
struct VolumePayload {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastPayload {
    #[serde(default)]
    list: Vec<SlicePayload>,
}

#[derive(Debug, Deserialize)]
struct SlicePayload {
    rain: Option<VolumePayload>,
    snow: Option<VolumePayload>,
    pop: Option<f64>,
}

/// First value that reports a positive volume, else the last one given.
fn first_positive(primary: Option<f64>, secondary: Option<f64>) -> Option<f64> {
    primary.filter(|v| *v > 0.0).or(secondary)
}

impl CurrentPayload {
    fn into_conditions(self) -> CurrentConditions {
        let hourly = |v: &VolumePayload| first_positive(v.one_hour, v.three_hours);
        let precipitation = self
            .rain
            .as_ref()
            .map(hourly)
            .or_else(|| self.snow.as_ref().map(hourly))
            .flatten();

        let coordinates = self.coord.and_then(|c| match (c.lat, c.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        });

        CurrentConditions {
            temperature: self.main.as_ref().and_then(|m| m.temp),
            humidity: self.main.as_ref().and_then(|m| m.humidity),
            description: self.weather.into_iter().next().and_then(|w| w.description),
            wind_speed: self.wind.and_then(|w| w.speed),
            precipitation,
            coordinates,
        }
    }
}

impl From<SlicePayload> for ForecastSlice {
    fn from(slice: SlicePayload) -> Self {
        let per_slice = |v: VolumePayload| first_positive(v.three_hours, v.one_hour);
        ForecastSlice {
            rain_volume: slice.rain.and_then(per_slice),
            snow_volume: slice.snow.and_then(per_slice),
            precipitation_probability: slice.pop,
        }
    }
}

/// Client for the OpenWeather 2.5 API.
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    units: String,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig, api_key: &str) -> Result<Self, SupervisorError> {
        let base_url = parse_base_url("weather backend", &config.base_url)?;
        let http_client = http_client("weather backend", config.timeout_seconds)?;

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            units: config.units.clone(),
            timeout_seconds: config.timeout_seconds,
            http_client,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, AgentError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("units", &self.units), ("appid", &self.api_key)])
            .send()
            .await
            .map_err(|e| {
                AgentError::from_reqwest(BACKEND, &self.base_url, self.timeout_seconds, e)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                backend: BACKEND,
                status,
                body,
            });
        }

        response.json().await.map_err(|e| AgentError::Request {
            backend: BACKEND,
            message: format!("failed to parse {} response: {}", endpoint, e),
        })
    }
}

#[async_trait]
impl WeatherBackend for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<CurrentConditions, AgentError> {
        let payload: CurrentPayload = self
            .get("weather", &[("q", location.to_string())])
            .await?;
        Ok(payload.into_conditions())
    }

    async fn forecast(&self, coordinates: Coordinates) -> Result<Vec<ForecastSlice>, AgentError> {
        let payload: ForecastPayload = self
            .get(
                "forecast",
                &[
                    ("lat", coordinates.lat.to_string()),
                    ("lon", coordinates.lon.to_string()),
                ],
            )
            .await?;
        Ok(payload.list.into_iter().map(ForecastSlice::from).collect())
    }
}
