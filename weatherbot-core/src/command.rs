//! Command routing.
//!
//! Commands are described once in [`COMMANDS`]: name, argument requirement,
//! what to run and the help line. [`parse`] turns a chat line into an
//! [`Invocation`] and [`Bot::handle`] runs it, guaranteeing that every command
//! ends with at least one message to the user.

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    chat::ReplySink,
    error::WeatherError,
    model::{Color, Field, ForecastDays, Reply, ReplyPayload, WeatherQuery},
    present,
    provider::WeatherProvider,
};

pub const COMMAND_PREFIX: char = '/';

pub const MISSING_CITY_MESSAGE: &str = "Please provide a city name.";
pub const UNKNOWN_COMMAND_MESSAGE: &str = "Invalid command. /help for more information.";
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Current,
    Forecast(ForecastDays),
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    None,
    /// Free text to end of line; `missing` is sent when it is empty.
    Required { missing: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub argument: Argument,
    pub action: Action,
    pub usage: &'static str,
    pub description: &'static str,
}

const CITY: Argument = Argument::Required { missing: MISSING_CITY_MESSAGE };

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "weather",
        argument: CITY,
        action: Action::Current,
        usage: "/weather [city]",
        description: "fetches current weather conditions in [city]",
    },
    CommandSpec {
        name: "forecast",
        argument: CITY,
        action: Action::Forecast(ForecastDays::One),
        usage: "/forecast [city]",
        description: "fetches today's forecast for [city]",
    },
    CommandSpec {
        name: "forecast2",
        argument: CITY,
        action: Action::Forecast(ForecastDays::Two),
        usage: "/forecast2 [city]",
        description: "fetches 2-day forecast for [city]",
    },
    CommandSpec {
        name: "forecast3",
        argument: CITY,
        action: Action::Forecast(ForecastDays::Three),
        usage: "/forecast3 [city]",
        description: "fetches 3-day forecast for [city]",
    },
    CommandSpec {
        name: "help",
        argument: Argument::None,
        action: Action::Help,
        usage: "/help",
        description: "lists the available commands",
    },
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Current { city: String },
    Forecast(WeatherQuery),
    Help,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("missing argument for /{command}")]
    MissingArgument { command: &'static str, message: &'static str },

    #[error("unknown command /{0}")]
    UnknownCommand(String),
}

impl RouteError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingArgument { message, .. } => message,
            Self::UnknownCommand(_) => UNKNOWN_COMMAND_MESSAGE,
        }
    }
}

impl CommandSpec {
    fn invocation(&self, argument: &str) -> Result<Invocation, RouteError> {
        if let Argument::Required { missing } = self.argument {
            if argument.is_empty() {
                return Err(RouteError::MissingArgument { command: self.name, message: missing });
            }
        }

        let city = argument.to_string();
        Ok(match self.action {
            Action::Current => Invocation::Current { city },
            Action::Forecast(forecast_days) => {
                Invocation::Forecast(WeatherQuery { city, forecast_days })
            }
            Action::Help => Invocation::Help,
        })
    }
}

/// Parse a chat line. Returns `None` when the line is not a command at all.
///
/// `/name@botname args` is accepted as `/name args`.
pub fn parse(line: &str) -> Option<Result<Invocation, RouteError>> {
    let rest = line.trim().strip_prefix(COMMAND_PREFIX)?;

    let (token, argument) = match rest.split_once(char::is_whitespace) {
        Some((token, argument)) => (token, argument.trim()),
        None => (rest, ""),
    };
    let name = token.split_once('@').map_or(token, |(name, _)| name);

    let Some(spec) = lookup(name) else {
        return Some(Err(RouteError::UnknownCommand(name.to_string())));
    };

    Some(spec.invocation(argument))
}

/// How a single chat line was dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a command; nothing was sent.
    Ignored,
    /// Reply payload(s) were sent.
    Answered { replies: usize },
    /// Bad command line; a prompt was sent.
    Rejected,
    /// The command failed; an error message was sent.
    Failed,
}

pub fn help_reply() -> ReplyPayload {
    ReplyPayload {
        title: "Available Commands".to_string(),
        description: None,
        thumbnail: None,
        fields: COMMANDS
            .iter()
            .filter(|spec| spec.action != Action::Help)
            .map(|spec| Field::new(spec.usage, spec.description))
            .collect(),
        footer: None,
        color: Color::PURPLE,
    }
}

/// The weather bot: routes commands to a provider and presents the results.
#[derive(Debug)]
pub struct Bot<P> {
    provider: P,
}

impl<P: WeatherProvider> Bot<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn current(&self, city: &str) -> Result<ReplyPayload, WeatherError> {
        let reading = self.provider.current(city).await?;
        Ok(present::current_reply(&reading))
    }

    /// One payload per requested day, today first.
    pub async fn forecast(&self, query: &WeatherQuery) -> Result<Vec<ReplyPayload>, WeatherError> {
        let forecast = self.provider.forecast(&query.city).await?;

        let wanted = query.forecast_days.count();
        if forecast.days.len() < wanted {
            return Err(WeatherError::MissingForecastDays { wanted, got: forecast.days.len() });
        }

        Ok(forecast
            .days
            .iter()
            .take(wanted)
            .enumerate()
            .map(|(index, day)| {
                let label = present::day_label(index, day.date);
                present::forecast_day_reply(&forecast.location, day, &label)
            })
            .collect())
    }

    async fn run(&self, invocation: &Invocation) -> Result<Vec<ReplyPayload>, WeatherError> {
        match invocation {
            Invocation::Current { city } => Ok(vec![self.current(city).await?]),
            Invocation::Forecast(query) => self.forecast(query).await,
            Invocation::Help => Ok(vec![help_reply()]),
        }
    }

    /// Handle one chat line, sending every reply through `sink`.
    ///
    /// Only a failing sink makes this return `Err`.
    pub async fn handle(&self, line: &str, sink: &dyn ReplySink) -> anyhow::Result<Outcome> {
        let invocation = match parse(line) {
            None => return Ok(Outcome::Ignored),
            Some(Err(err)) => {
                debug!(%err, "rejected command");
                sink.send(Reply::text(err.user_message())).await?;
                return Ok(Outcome::Rejected);
            }
            Some(Ok(invocation)) => invocation,
        };

        debug!(?invocation, "dispatching command");

        match self.run(&invocation).await {
            Ok(payloads) => {
                let replies = payloads.len();
                for payload in payloads {
                    sink.send(Reply::Payload(payload)).await?;
                }
                Ok(Outcome::Answered { replies })
            }
            Err(err) => {
                if err.is_data_quality() {
                    warn!(?invocation, %err, "provider returned unusable data");
                } else if !err.is_classified() {
                    error!(?invocation, %err, "command failed");
                }
                sink.send(Reply::text(err.user_message())).await?;
                Ok(Outcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(line: &str) -> Option<String> {
        match parse(line) {
            Some(Ok(Invocation::Current { city })) => Some(city),
            Some(Ok(Invocation::Forecast(query))) => Some(query.city),
            _ => None,
        }
    }

    #[test]
    fn non_commands_are_ignored() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn city_captures_rest_of_line() {
        assert_eq!(city("/weather New York City"), Some("New York City".to_string()));
        assert_eq!(city("  /forecast3   San Jose  "), Some("San Jose".to_string()));
    }

    #[test]
    fn forecast_variants_fix_day_count() {
        let days = |line| match parse(line) {
            Some(Ok(Invocation::Forecast(query))) => Some(query.forecast_days),
            _ => None,
        };
        assert_eq!(days("/forecast Austin"), Some(ForecastDays::One));
        assert_eq!(days("/forecast2 Austin"), Some(ForecastDays::Two));
        assert_eq!(days("/forecast3 Austin"), Some(ForecastDays::Three));
    }

    #[test]
    fn missing_city_prompt_is_identical_for_all_weather_commands() {
        for name in ["weather", "forecast", "forecast2", "forecast3"] {
            let err = parse(&format!("/{name}")).expect("is a command").unwrap_err();
            assert_eq!(err.user_message(), MISSING_CITY_MESSAGE);

            let err = parse(&format!("/{name}    ")).expect("is a command").unwrap_err();
            assert_eq!(err.user_message(), MISSING_CITY_MESSAGE);
        }
    }

    #[test]
    fn unknown_command_gets_fixed_prompt() {
        let err = parse("/snow Denver").expect("is a command").unwrap_err();
        assert_eq!(err, RouteError::UnknownCommand("snow".to_string()));
        assert_eq!(err.user_message(), UNKNOWN_COMMAND_MESSAGE);
    }

    #[test]
    fn commands_are_case_sensitive() {
        assert!(matches!(parse("/Weather Paris"), Some(Err(RouteError::UnknownCommand(_)))));
    }

    #[test]
    fn bot_suffix_is_stripped() {
        assert_eq!(city("/weather@forecast_bot Oslo"), Some("Oslo".to_string()));
        assert_eq!(parse("/help@forecast_bot"), Some(Ok(Invocation::Help)));
    }

    #[test]
    fn help_ignores_arguments() {
        assert_eq!(parse("/help me please"), Some(Ok(Invocation::Help)));
    }

    #[test]
    fn help_lists_the_four_weather_commands() {
        let help = help_reply();
        let usages: Vec<_> = help.fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(
            usages,
            ["/weather [city]", "/forecast [city]", "/forecast2 [city]", "/forecast3 [city]"]
        );
        assert_eq!(help.fields[0].value, "fetches current weather conditions in [city]");
        assert_eq!(help.color, Color::PURPLE);
    }
}
