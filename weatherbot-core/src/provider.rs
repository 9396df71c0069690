use crate::{
    Config,
    error::WeatherError,
    model::{Forecast, WeatherReading},
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

/// Source of weather data for the presenter.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `city`.
    async fn current(&self, city: &str) -> Result<WeatherReading, WeatherError>;

    /// Multi-day forecast for `city`, today first.
    async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError>;
}

#[async_trait]
impl<P: WeatherProvider + ?Sized> WeatherProvider for Box<P> {
    async fn current(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        (**self).current(city).await
    }

    async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError> {
        (**self).forecast(city).await
    }
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let provider = WeatherApiProvider::builder(api_key.to_owned())
        .base_url(config.provider.base_url.clone())
        .timeout(config.provider.timeout())
        .build()?;

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No weather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let mut cfg = Config::default();
        cfg.provider.api_key = Some("KEY".to_string());

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
