use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{AirQuality, Forecast, ForecastDay, WeatherReading},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of days always requested from `forecast.json`.
pub const FORECAST_DAYS_REQUESTED: u8 = 3;

/// WeatherAPI.com client.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct WeatherApiProviderBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl WeatherApiProviderBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<WeatherApiProvider, WeatherError> {
        let http = Client::builder().timeout(self.timeout).build()?;

        Ok(WeatherApiProvider {
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn builder(api_key: String) -> WeatherApiProviderBuilder {
        WeatherApiProviderBuilder {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(endpoint, ?params, "querying WeatherAPI");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            // The URL carries the API key.
            .map_err(|e| WeatherError::Network(e.without_url()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| WeatherError::Network(e.without_url()))?;

        if let Ok(envelope) = serde_json::from_str::<WaErrorEnvelope>(&body) {
            debug!(code = envelope.error.code, message = %envelope.error.message, "WeatherAPI error");
            return Err(WeatherError::from_provider_code(envelope.error.code));
        }

        if !status.is_success() {
            return Err(WeatherError::Status { status, body: truncate_body(&body) });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        let parsed: WaCurrentResponse =
            self.get_json("current.json", &[("q", city), ("aqi", "yes")]).await?;

        WeatherReading::try_from(parsed)
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Forecast, WeatherError> {
        let days = FORECAST_DAYS_REQUESTED.to_string();
        let parsed: WaForecastResponse = self
            .get_json("forecast.json", &[("q", city), ("aqi", "yes"), ("days", days.as_str())])
            .await?;

        Ok(Forecast::from(parsed))
    }
}

#[derive(Debug, Deserialize)]
struct WaErrorEnvelope {
    error: WaError,
}

#[derive(Debug, Deserialize)]
struct WaError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaAirQuality {
    #[serde(rename = "us-epa-index")]
    us_epa_index: i64,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_f: f64,
    is_day: u8,
    condition: WaCondition,
    uv: f64,
    precip_in: f64,
    wind_mph: f64,
    humidity: u8,
    air_quality: WaAirQuality,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_f: f64,
    mintemp_f: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaAstro {
    sunrise: String,
    sunset: String,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    astro: WaAstro,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    forecast: WaForecast,
}

impl TryFrom<WaCurrentResponse> for WeatherReading {
    type Error = WeatherError;

    fn try_from(parsed: WaCurrentResponse) -> Result<Self, Self::Error> {
        let current = parsed.current;

        Ok(WeatherReading {
            location: parsed.location.name,
            temperature_f: current.temp_f,
            condition_text: current.condition.text,
            condition_icon: current.condition.icon,
            uv_index: current.uv,
            precip_in: current.precip_in,
            wind_mph: current.wind_mph,
            humidity_pct: current.humidity,
            air_quality: AirQuality::try_from(current.air_quality.us_epa_index)?,
            is_day: current.is_day != 0,
        })
    }
}

impl From<WaForecastResponse> for Forecast {
    fn from(parsed: WaForecastResponse) -> Self {
        let days = parsed
            .forecast
            .forecastday
            .into_iter()
            .map(|fd| ForecastDay {
                date: fd.date,
                min_temp_f: fd.day.mintemp_f,
                max_temp_f: fd.day.maxtemp_f,
                condition_text: fd.day.condition.text,
                condition_icon: fd.day.condition.icon,
                sunrise: fd.astro.sunrise,
                sunset: fd.astro.sunset,
            })
            .collect();

        Forecast { location: parsed.location.name, days }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        self.fetch_current(city).await
    }

    async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError> {
        self.fetch_forecast(city).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
