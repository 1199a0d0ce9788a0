use crate::{
    domain::ChatId,
    error::{Classify, ErrorKind},
};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt, Snafu};
use std::{fmt, time::Duration};
use tracing::{debug, trace, trace_span, Instrument};
use url::Url;

const API_ROOT: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BotToken(pub String);

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BotToken").field(&"<redacted>").finish()
    }
}

#[derive(Clone)]
pub struct Config {
    chat_id: ChatId,
    send_message_url: Url,
    timeout: Duration,
}

// The URL embeds the bot token
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("chat_id", &self.chat_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn new(token: &BotToken, chat_id: ChatId) -> Result<Self> {
        let send_message_url = Url::parse(&format!("{}/bot{}/sendMessage", API_ROOT, token.0))
            .context(UnableToConfigureSendMessageUrlSnafu)?;

        Ok(Self {
            chat_id,
            send_message_url,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Every request is bounded by the configured timeout.
    pub fn into_client(self) -> Result<Client> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context(UnableToBuildClientSnafu)?;

        Ok(Client {
            client,
            config: self,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    config: Config,
}

impl Client {
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let Self { client, config } = self;
        let s = trace_span!("send_message", len = text.len());

        #[derive(Debug, Serialize)]
        struct SendMessageParams<'a> {
            chat_id: &'a str,
            text: &'a str,
        }

        #[derive(Debug, Deserialize)]
        struct SendMessageResponse {
            ok: bool,
            description: Option<String>,
        }

        async {
            trace!("Sending message");

            let params = SendMessageParams {
                chat_id: &config.chat_id.0,
                text,
            };

            // Telegram explains failures in the body, even for error
            // statuses. The URL is stripped from errors as it embeds the token.
            let res = client
                .post(config.send_message_url.clone())
                .json(&params)
                .send()
                .await
                .map_err(reqwest::Error::without_url)
                .context(UnableToSendMessageSnafu)?
                .json::<SendMessageResponse>()
                .await
                .map_err(reqwest::Error::without_url)
                .context(UnableToDeserializeSendMessageResponseSnafu)?;

            ensure!(
                res.ok,
                MessageRejectedSnafu {
                    description: res.description.unwrap_or_default(),
                }
            );

            debug!("Sent message {:?}", text);
            Ok(())
        }
        .instrument(s)
        .await
    }
}

/// Anything that can deliver a text to the one configured recipient.
pub(crate) trait Messenger {
    async fn send(&mut self, text: &str) -> Result<()>;
}

impl Messenger for Client {
    async fn send(&mut self, text: &str) -> Result<()> {
        self.send_message(text).await
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    UnableToConfigureSendMessageUrl {
        source: url::ParseError,
    },

    UnableToBuildClient {
        source: reqwest::Error,
    },

    #[snafu(display("Unable to send message"))]
    UnableToSendMessage {
        source: reqwest::Error,
    },

    #[snafu(display("Unable to read the messaging service response"))]
    UnableToDeserializeSendMessageResponse {
        source: reqwest::Error,
    },

    #[snafu(display("Message was rejected: {}", description))]
    MessageRejected {
        description: String,
    },
}

impl Classify for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UnableToConfigureSendMessageUrl { .. } | Self::UnableToBuildClient { .. } => {
                ErrorKind::Config
            }
            _ => ErrorKind::Notification,
        }
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;
