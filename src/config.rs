use crate::{domain::ChatId, practicum::OAuthToken, telegram::BotToken};
use snafu::{ensure, ResultExt, Snafu};
use std::{env, time::Duration};
use tracing::error;

const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
const RETRY_PERIOD: &str = "HOMEWORK_RETRY_PERIOD";

pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(10 * 60);

/// The three secrets the relay cannot run without.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub practicum_token: OAuthToken,
    pub telegram_token: BotToken,
    pub chat_id: ChatId,
}

impl Credentials {
    pub fn from_environment() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Every missing secret is logged before failing, so one run shows
    /// all of them.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut missing = Vec::new();
        let mut fetch = |name: &'static str| {
            let value = lookup(name).filter(|v| !v.is_empty());
            if value.is_none() {
                error!("Required environment variable {} is missing", name);
                missing.push(name);
            }
            value
        };

        let practicum_token = fetch(PRACTICUM_TOKEN);
        let telegram_token = fetch(TELEGRAM_TOKEN);
        let chat_id = fetch(TELEGRAM_CHAT_ID);

        match (practicum_token, telegram_token, chat_id) {
            (Some(practicum_token), Some(telegram_token), Some(chat_id)) => Ok(Self {
                practicum_token: OAuthToken(practicum_token),
                telegram_token: BotToken(telegram_token),
                chat_id: ChatId(chat_id),
            }),
            _ => MissingSecretsSnafu { names: missing }.fail(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub retry_period: Duration,
}

impl Config {
    pub fn from_environment() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let retry_period = match lookup(RETRY_PERIOD) {
            Some(period) => {
                let secs: u64 = period
                    .trim()
                    .parse()
                    .context(InvalidRetryPeriodSnafu { period: &*period })?;
                ensure!(secs > 0, ZeroRetryPeriodSnafu);
                Duration::from_secs(secs)
            }
            None => DEFAULT_RETRY_PERIOD,
        };

        Ok(Self { retry_period })
    }
}

pub(crate) fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Missing required environment variables: {}", names.join(", ")))]
    MissingSecrets { names: Vec<&'static str> },

    #[snafu(display("HOMEWORK_RETRY_PERIOD is invalid: {:?}", period))]
    InvalidRetryPeriod {
        source: std::num::ParseIntError,
        period: String,
    },

    #[snafu(display("HOMEWORK_RETRY_PERIOD must be greater than zero"))]
    ZeroRetryPeriod,
}

type Result<T, E = Error> = std::result::Result<T, E>;
