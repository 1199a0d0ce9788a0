use crate::{
    config,
    domain::{ApiResponse, Cursor},
    error::{Classify, ErrorKind},
};
use reqwest::{header::AUTHORIZATION, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use snafu::{OptionExt, ResultExt, Snafu};
use std::{fmt, time::Duration};
use tracing::{trace, trace_span, Instrument};
use url::Url;

const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
const ENDPOINT: &str = "PRACTICUM_ENDPOINT";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OAuthToken(pub String);

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OAuthToken").field(&"<redacted>").finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    endpoint: Url,
}

impl Config {
    pub fn from_environment() -> Result<Self> {
        Self::from_lookup(config::env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup(ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());
        let endpoint = Url::parse(&endpoint).context(InvalidEndpointSnafu { endpoint: &*endpoint })?;

        Ok(Self { endpoint })
    }

    pub fn into_client(self, token: OAuthToken) -> Result<Client> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context(UnableToBuildClientSnafu)?;

        Ok(Client {
            client,
            config: self,
            token,
        })
    }
}

pub struct Client {
    client: reqwest::Client,
    config: Config,
    token: OAuthToken,
}

impl Client {
    /// One request, no retries. Retrying is the poll loop's business.
    pub async fn homework_statuses(&self, cursor: Cursor) -> Result<Value> {
        let Self {
            client,
            config,
            token,
        } = self;
        let s = trace_span!("homework_statuses", from_date = cursor.0);

        async {
            let resp = client
                .get(config.endpoint.clone())
                .header(AUTHORIZATION, format!("OAuth {}", token.0))
                .query(&[("from_date", cursor.0)])
                .send()
                .await
                .context(UnableToExecuteRequestSnafu)?;

            let status = resp.status();
            let body = resp.text().await.context(UnableToReadBodySnafu)?;
            trace!(%status, "Received response");

            interpret(status, &body)
        }
        .instrument(s)
        .await
    }
}

/// Anything that can answer "which homeworks changed since this cursor".
pub(crate) trait HomeworkSource {
    async fn fetch(&mut self, cursor: Cursor) -> Result<Value>;
}

impl HomeworkSource for Client {
    async fn fetch(&mut self, cursor: Cursor) -> Result<Value> {
        self.homework_statuses(cursor).await
    }
}

type MessageExtractor = fn(&str) -> Option<String>;

/// Error bodies that carry a message, by status code. Any other
/// unsuccessful status is reported by its code alone.
const ERROR_MESSAGES: &[(StatusCode, MessageExtractor)] = &[
    (StatusCode::UNAUTHORIZED, unauthorized_message),
    (StatusCode::BAD_REQUEST, bad_request_message),
];

fn unauthorized_message(body: &str) -> Option<String> {
    #[derive(Debug, Deserialize)]
    struct UnauthorizedBody {
        message: String,
    }

    serde_json::from_str::<UnauthorizedBody>(body)
        .ok()
        .map(|b| b.message)
}

fn bad_request_message(body: &str) -> Option<String> {
    #[derive(Debug, Deserialize)]
    struct BadRequestBody {
        error: Inner,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        error: String,
    }

    serde_json::from_str::<BadRequestBody>(body)
        .ok()
        .map(|b| b.error.error)
}

pub(crate) fn interpret(status: StatusCode, body: &str) -> Result<Value> {
    if !status.is_success() {
        let message = ERROR_MESSAGES
            .iter()
            .find(|(code, _)| *code == status)
            .and_then(|(_, extract)| extract(body));

        return RequestFailedSnafu {
            status: status.as_u16(),
            message,
        }
        .fail();
    }

    serde_json::from_str(body).context(MalformedPayloadSnafu)
}

/// Gates a parsed payload: it must be an object holding `homeworks`
/// (an array) and `current_date`.
pub fn check_response(value: Value) -> Result<ApiResponse> {
    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return NotAnObjectSnafu {
                found: json_type(&other),
            }
            .fail()
        }
    };

    let homeworks = fields
        .remove("homeworks")
        .context(MissingKeySnafu { key: "homeworks" })?;
    let current_date = fields
        .remove("current_date")
        .context(MissingKeySnafu {
            key: "current_date",
        })?;

    let homeworks = match homeworks {
        Value::Array(homeworks) => homeworks,
        other => {
            return HomeworksNotAListSnafu {
                found: json_type(&other),
            }
            .fail()
        }
    };

    Ok(ApiResponse {
        homeworks,
        current_date: current_date.as_i64(),
    })
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe_failure(status: u16, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("API returned status {}: {}", status, message),
        None => format!("API returned status {}", status),
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("PRACTICUM_ENDPOINT is invalid: {}", endpoint))]
    InvalidEndpoint {
        source: url::ParseError,
        endpoint: String,
    },

    UnableToBuildClient {
        source: reqwest::Error,
    },

    #[snafu(display("Unable to reach the review service"))]
    UnableToExecuteRequest {
        source: reqwest::Error,
    },

    #[snafu(display("Unable to read the review service response"))]
    UnableToReadBody {
        source: reqwest::Error,
    },

    #[snafu(display("{}", describe_failure(*status, message.as_deref())))]
    RequestFailed {
        status: u16,
        message: Option<String>,
    },

    #[snafu(display("malformed payload"))]
    MalformedPayload {
        source: serde_json::Error,
    },

    #[snafu(display("API response is not an object (found {})", found))]
    NotAnObject {
        found: &'static str,
    },

    #[snafu(display("Key {:?} is missing from the API response", key))]
    MissingKey {
        key: &'static str,
    },

    #[snafu(display("Value of \"homeworks\" is not a list (found {})", found))]
    HomeworksNotAList {
        found: &'static str,
    },
}

impl Classify for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEndpoint { .. } | Self::UnableToBuildClient { .. } => ErrorKind::Config,
            Self::UnableToExecuteRequest { source } => source.kind(),
            Self::UnableToReadBody { .. } => ErrorKind::Transport,
            Self::RequestFailed { .. }
            | Self::MalformedPayload { .. }
            | Self::NotAnObject { .. }
            | Self::MissingKey { .. }
            | Self::HomeworksNotAList { .. } => ErrorKind::Protocol,
        }
    }
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
