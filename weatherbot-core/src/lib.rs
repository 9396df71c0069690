//! Core library for the `weatherbot` chat bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The WeatherAPI.com provider behind the [`WeatherProvider`] trait
//! - Presentation of weather data as chat replies
//! - Command routing with a guaranteed reply per command
//!
//! It is used by `weatherbot-cli`, but the [`Bot`] can be driven by any
//! transport that implements [`ReplySink`].

pub mod chat;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod present;
pub mod provider;

pub use chat::{RecordingSink, ReplySink};
pub use command::{Bot, Invocation, Outcome};
pub use config::{Config, LivenessConfig, ProviderConfig};
pub use error::WeatherError;
pub use model::{
    AirQuality, Color, Field, Forecast, ForecastDay, ForecastDays, Reply, ReplyPayload,
    WeatherQuery, WeatherReading,
};
pub use provider::{WeatherProvider, provider_from_config};
