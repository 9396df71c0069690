use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// How many forecast days a command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastDays {
    One,
    Two,
    Three,
}

impl ForecastDays {
    pub fn count(self) -> usize {
        match self {
            ForecastDays::One => 1,
            ForecastDays::Two => 2,
            ForecastDays::Three => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    pub city: String,
    pub forecast_days: ForecastDays,
}

/// US EPA air-quality index bucket, as reported by the provider (1..=6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirQuality {
    Good,
    Fair,
    Bad,
    VeryBad,
}

impl AirQuality {
    pub fn label(self) -> &'static str {
        match self {
            AirQuality::Good => "Good",
            AirQuality::Fair => "Fair",
            AirQuality::Bad => "Bad",
            AirQuality::VeryBad => "Very Bad",
        }
    }
}

impl TryFrom<i64> for AirQuality {
    type Error = WeatherError;

    fn try_from(index: i64) -> Result<Self, Self::Error> {
        match index {
            1 => Ok(AirQuality::Good),
            2 => Ok(AirQuality::Fair),
            3..=5 => Ok(AirQuality::Bad),
            6 => Ok(AirQuality::VeryBad),
            other => Err(WeatherError::AirQualityOutOfRange(other)),
        }
    }
}

impl fmt::Display for AirQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub location: String,
    pub temperature_f: f64,
    pub condition_text: String,
    pub condition_icon: String,
    pub uv_index: f64,
    pub precip_in: f64,
    pub wind_mph: f64,
    pub humidity_pct: u8,
    pub air_quality: AirQuality,
    pub is_day: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub min_temp_f: f64,
    pub max_temp_f: f64,
    pub condition_text: String,
    pub condition_icon: String,
    pub sunrise: String,
    pub sunset: String,
}

/// Forecast for one location; `days[0]` is today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: String,
    pub days: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GOLD: Color = Color::rgb(255, 185, 0);
    pub const LIGHT_GREY: Color = Color::rgb(151, 156, 159);
    pub const BLURPLE: Color = Color::rgb(88, 101, 242);
    pub const PALE_CYAN: Color = Color::rgb(185, 255, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const NIGHT: Color = Color::rgb(25, 25, 75);
    pub const PURPLE: Color = Color::rgb(155, 89, 182);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed `0xRRGGBB` value, the form most chat embeds expect.
    pub fn to_u32(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.to_u32())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A styled message: the embed-like reply sent back to the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub fields: Vec<Field>,
    pub footer: Option<String>,
    pub color: Color,
}

impl fmt::Display for ReplyPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(description) = &self.description {
            write!(f, "\n{description}")?;
        }
        if !self.fields.is_empty() {
            writeln!(f)?;
        }
        for field in &self.fields {
            write!(f, "\n{}: {}", field.name, field.value)?;
        }
        if let Some(footer) = &self.footer {
            write!(f, "\n\n{footer}")?;
        }
        Ok(())
    }
}

/// One message delivered to the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Text(String),
    Payload(ReplyPayload),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn as_payload(&self) -> Option<&ReplyPayload> {
        match self {
            Reply::Payload(payload) => Some(payload),
            Reply::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Payload(_) => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(text) => f.write_str(text),
            Reply::Payload(payload) => fmt::Display::fmt(payload, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_quality_maps_all_epa_buckets() {
        let labels: Vec<_> = (1..=6_i64)
            .map(|i| AirQuality::try_from(i).expect("index in range").label())
            .collect();

        assert_eq!(labels, ["Good", "Fair", "Bad", "Bad", "Bad", "Very Bad"]);
    }

    #[test]
    fn air_quality_out_of_range_is_flagged() {
        for index in [0_i64, 7, -1] {
            let err = AirQuality::try_from(index).unwrap_err();
            assert!(matches!(err, WeatherError::AirQualityOutOfRange(i) if i == index));
        }
    }

    #[test]
    fn color_renders_as_hex() {
        assert_eq!(Color::GOLD.to_string(), "#FFB900");
        assert_eq!(Color::NIGHT.to_u32(), 0x19194B);
    }

    #[test]
    fn payload_renders_as_plain_text() {
        let payload = ReplyPayload {
            title: "Current Weather in Chicago".into(),
            description: Some("72° | Sunny".into()),
            thumbnail: None,
            fields: vec![Field::new("Wind", "5 mph"), Field::new("Humidity", "40%")],
            footer: Some("Air Quality: Good".into()),
            color: Color::GOLD,
        };

        assert_eq!(
            payload.to_string(),
            "Current Weather in Chicago\n72° | Sunny\n\nWind: 5 mph\nHumidity: 40%\n\nAir Quality: Good"
        );
    }
}
