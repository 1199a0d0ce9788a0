use crate::{
    domain::Cursor,
    error::{error_chain, Classify, ErrorKind, FailureStreak},
    flow::NotifyFlow,
    practicum::{self, HomeworkSource},
    telegram::Messenger,
    tracker,
};
use snafu::{ResultExt, Snafu};
use std::time::Duration;
use tracing::{debug, error, info, trace, trace_span, Instrument};

const FAILURE_PREFIX: &str = "Сбой в работе программы";

/// Waits between cycles. Tests swap in one that returns immediately.
pub(crate) trait Delay {
    async fn sleep(&mut self, period: Duration);
}

#[derive(Debug, Default)]
pub(crate) struct TokioDelay;

impl Delay for TokioDelay {
    async fn sleep(&mut self, period: Duration) {
        tokio::time::sleep(period).await
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct CycleSummary {
    pub notified: usize,
    pub cursor: Cursor,
}

/// Drives poll → validate → diff → notify, reporting any failure to
/// the recipient and sleeping a fixed period before the next cycle.
#[derive(Debug)]
pub(crate) struct Poller<S, M, D> {
    source: S,
    flow: NotifyFlow<M>,
    delay: D,
    retry_period: Duration,
    cursor: Cursor,
    streak: FailureStreak,
}

impl<S, M, D> Poller<S, M, D>
where
    S: HomeworkSource,
    M: Messenger,
    D: Delay,
{
    pub fn new(
        source: S,
        flow: NotifyFlow<M>,
        delay: D,
        retry_period: Duration,
        cursor: Cursor,
    ) -> Self {
        Self {
            source,
            flow,
            delay,
            retry_period,
            cursor,
            streak: FailureStreak::default(),
        }
    }

    /// Never returns.
    pub async fn run(&mut self) {
        info!(
            from_date = self.cursor.0,
            "Polling every {} seconds",
            self.retry_period.as_secs()
        );

        loop {
            self.tick().await.ok();
        }
    }

    /// One cycle followed by the sleep.
    pub async fn tick(&mut self) -> Result<CycleSummary> {
        let r = self.run_cycle().await;

        trace!("Sleeping for {:?}", self.retry_period);
        self.delay.sleep(self.retry_period).await;

        r
    }

    pub async fn run_cycle(&mut self) -> Result<CycleSummary> {
        let s = trace_span!("cycle", from_date = self.cursor.0);
        let r = self.poll_once().instrument(s).await;

        self.streak.check(&r);
        match &r {
            Ok(summary) => debug!(
                notified = summary.notified,
                cursor = summary.cursor.0,
                "Cycle complete"
            ),
            Err(e) => self.report(e).await,
        }

        r
    }

    async fn poll_once(&mut self) -> Result<CycleSummary> {
        let raw = self
            .source
            .fetch(self.cursor)
            .await
            .context(UnableToPollSnafu)?;

        let response = practicum::check_response(raw).context(InvalidResponseSnafu)?;

        let notified = self
            .flow
            .notify(&response.homeworks)
            .await
            .context(UnableToProcessHomeworksSnafu)?;

        if response.current_date.is_none() {
            trace!("No usable current_date, keeping the cursor");
        }
        self.cursor = self.cursor.advance(response.current_date);

        Ok(CycleSummary {
            notified,
            cursor: self.cursor,
        })
    }

    async fn report(&mut self, e: &Error) {
        let message = format!("{}: {}", FAILURE_PREFIX, error_chain(e));
        error!(
            kind = %e.kind(),
            failures = self.streak.failure_count(),
            "{}",
            message
        );

        self.flow.report(&message).await;
    }
}

#[derive(Debug, Snafu)]
pub(crate) enum Error {
    #[snafu(display("Unable to get homework statuses"))]
    UnableToPoll { source: practicum::Error },

    #[snafu(display("Unexpected review service response"))]
    InvalidResponse { source: practicum::Error },

    #[snafu(display("Unable to process homework statuses"))]
    UnableToProcessHomeworks { source: tracker::Error },
}

impl Classify for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UnableToPoll { source } | Self::InvalidResponse { source } => source.kind(),
            Self::UnableToProcessHomeworks { source } => source.kind(),
        }
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;
