//! Turns provider data into chat replies.
//!
//! Everything here is pure: the router fetches data through a
//! [`WeatherProvider`](crate::WeatherProvider) and hands it to these functions.

use chrono::Datelike;

use crate::model::{Color, Field, ForecastDay, ReplyPayload, WeatherReading};

/// Ordered keyword rule; the first rule with a matching keyword picks the color.
#[derive(Debug, Clone, Copy)]
pub struct ColorRule {
    pub keywords: &'static [&'static str],
    pub color: Color,
}

const fn rule(keywords: &'static [&'static str], color: Color) -> ColorRule {
    ColorRule { keywords, color }
}

pub const CURRENT_COLOR_RULES: &[ColorRule] = &[
    rule(&["sunny"], Color::GOLD),
    rule(&["mist", "fog", "cloudy", "overcast"], Color::LIGHT_GREY),
    rule(&["drizzle", "rain"], Color::BLURPLE),
    rule(&["ice"], Color::PALE_CYAN),
    rule(&["thunder"], Color::YELLOW),
];

pub const FORECAST_COLOR_RULES: &[ColorRule] = &[
    rule(&["clear", "sunny"], Color::GOLD),
    rule(&["mist", "fog", "cloudy", "overcast"], Color::LIGHT_GREY),
    rule(&["drizzle", "rain"], Color::BLURPLE),
    rule(&["ice"], Color::PALE_CYAN),
    rule(&["thunder"], Color::YELLOW),
];

pub const FALLBACK_COLOR: Color = Color::WHITE;

/// Pick a color for `condition` (case-insensitive substring match).
pub fn classify_condition(condition: &str, rules: &[ColorRule]) -> Color {
    let condition = condition.to_lowercase();

    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| condition.contains(kw)))
        .map_or(FALLBACK_COLOR, |rule| rule.color)
}

/// Color for current conditions; night always wins over the condition.
pub fn current_color(reading: &WeatherReading) -> Color {
    if reading.is_day {
        classify_condition(&reading.condition_text, CURRENT_COLOR_RULES)
    } else {
        Color::NIGHT
    }
}

/// Capitalise the first letter of every word, lower-case the rest.
///
/// A "word" starts after any non-alphabetic character, so `"light rain/snow"`
/// becomes `"Light Rain/Snow"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for c in text.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }

    out
}

/// The provider hands out protocol-relative icon URLs.
pub fn icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("http:{icon}") } else { icon.to_string() }
}

/// Nearest integer, halves to even (`72.5` -> `72`, `73.5` -> `74`).
pub fn round_whole(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Whole amounts keep one decimal place (`1.0”`), zero is a bare `0`.
pub fn format_precipitation(inches: f64) -> String {
    if inches == 0.0 {
        "0".to_string()
    } else if inches.fract() == 0.0 {
        format!("{inches:.1}\u{201D}")
    } else {
        format!("{inches}\u{201D}")
    }
}

/// `"06:30 AM"` -> `"6:30 AM"`. Only one leading zero is dropped.
pub fn strip_leading_zero(time: &str) -> &str {
    time.strip_prefix('0').unwrap_or(time)
}

pub fn date_label(date: chrono::NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

pub fn day_label(index: usize, date: chrono::NaiveDate) -> String {
    if index == 0 { "Today".to_string() } else { date_label(date) }
}

pub fn current_reply(reading: &WeatherReading) -> ReplyPayload {
    let condition = title_case(&reading.condition_text);
    let temperature = round_whole(reading.temperature_f);

    ReplyPayload {
        title: format!("Current Weather in {}", reading.location),
        description: Some(format!("{temperature}\u{00B0} | {condition}")),
        thumbnail: Some(icon_url(&reading.condition_icon)),
        fields: vec![
            Field::new("UV Index", (reading.uv_index.trunc() as i64).to_string()),
            Field::new("Precipitation", format_precipitation(reading.precip_in)),
            Field::new("Wind", format!("{} mph", round_whole(reading.wind_mph))),
            Field::new("Humidity", format!("{}%", reading.humidity_pct)),
        ],
        footer: Some(format!("Air Quality: {}", reading.air_quality)),
        color: current_color(reading),
    }
}

/// Render one forecast day under `label`.
pub fn forecast_day_reply(location: &str, day: &ForecastDay, label: &str) -> ReplyPayload {
    let condition = title_case(&day.condition_text);

    ReplyPayload {
        title: format!("Forecast for {location} - {label}"),
        description: Some(format!(
            "{}\u{00B0} to {}\u{00B0} | {condition}",
            round_whole(day.min_temp_f),
            round_whole(day.max_temp_f),
        )),
        thumbnail: Some(icon_url(&day.condition_icon)),
        fields: vec![
            Field::new("Sunrise", strip_leading_zero(&day.sunrise)),
            Field::new("Sunset", strip_leading_zero(&day.sunset)),
        ],
        footer: None,
        color: classify_condition(&condition, FORECAST_COLOR_RULES),
    }
}
