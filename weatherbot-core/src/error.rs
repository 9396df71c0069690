//! Errors raised while fetching and presenting weather data.

use thiserror::Error;

/// Provider error code for "No matching location found".
pub const LOCATION_NOT_FOUND_CODE: i64 = 1006;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Location not found")]
    LocationNotFound,

    #[error("Provider returned error code {code}")]
    Upstream { code: i64 },

    #[error("Air quality index {0} is outside 1..=6")]
    AirQualityOutOfRange(i64),

    #[error("Provider returned {got} forecast day(s), {wanted} requested")]
    MissingForecastDays { wanted: usize, got: usize },

    #[error("Provider request failed with status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WeatherError {
    /// Map a provider `error.code` to the matching variant.
    pub fn from_provider_code(code: i64) -> Self {
        if code == LOCATION_NOT_FOUND_CODE {
            Self::LocationNotFound
        } else {
            Self::Upstream { code }
        }
    }

    /// Text shown to the chat user.
    pub fn user_message(&self) -> String {
        match self {
            Self::LocationNotFound => {
                "Location not found. Please provide a valid city name.".to_string()
            }
            Self::Upstream { code } => format!("ERROR {code}"),
            Self::AirQualityOutOfRange(index) => {
                format!("The provider reported an invalid air quality index ({index}).")
            }
            Self::MissingForecastDays { wanted, got } => format!(
                "The provider returned only {got} forecast day(s), {wanted} were requested."
            ),
            Self::Status { .. } | Self::Network(_) | Self::Decode(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
        }
    }

    /// Errors the provider told us about explicitly; answered without logging.
    pub fn is_classified(&self) -> bool {
        matches!(self, Self::LocationNotFound | Self::Upstream { .. })
    }

    /// Bad data in an otherwise successful response.
    pub fn is_data_quality(&self) -> bool {
        matches!(self, Self::AirQualityOutOfRange(_) | Self::MissingForecastDays { .. })
    }
}
