#![deny(rust_2018_idioms)]

use snafu::{ResultExt, Snafu};
use tracing::info;

mod config;
mod domain;
mod error;
mod flow;
mod poller;
mod practicum;
mod telegram;
#[cfg(test)]
mod test_server;
mod tracker;

fn main() {
    if let Err(e) = core() {
        eprintln!("Error: {}", error::error_chain(&e));
        std::process::exit(1);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn core() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let credentials = config::Credentials::from_environment().context(UnableToConfigureSnafu)?;
    let config = config::Config::from_environment().context(UnableToConfigureSnafu)?;

    let practicum_config =
        practicum::Config::from_environment().context(UnableToConfigurePracticumSnafu)?;
    let telegram_config =
        telegram::Config::new(&credentials.telegram_token, credentials.chat_id.clone())
            .context(UnableToConfigureTelegramSnafu)?;

    let source = practicum_config
        .into_client(credentials.practicum_token)
        .context(UnableToConfigurePracticumSnafu)?;
    let messenger = telegram_config
        .into_client()
        .context(UnableToConfigureTelegramSnafu)?;
    let flow = flow::NotifyFlow::new(messenger);

    info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let mut poller = poller::Poller::new(
        source,
        flow,
        poller::TokioDelay,
        config.retry_period,
        domain::Cursor::now(),
    );
    poller.run().await;

    PollerExitedSnafu.fail()
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("Unable to configure application"))]
    UnableToConfigure { source: config::Error },

    #[snafu(display("Unable to configure the review service integration"))]
    UnableToConfigurePracticum { source: practicum::Error },

    #[snafu(display("Unable to configure the Telegram integration"))]
    UnableToConfigureTelegram { source: telegram::Error },

    #[snafu(display("The poller exited and never should"))]
    PollerExited,
}

type Result<T, E = Error> = std::result::Result<T, E>;
