use std::{error::Error, fmt};
use tracing::warn;

/// How a failure is handled by the poll loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    /// A required setting is missing or invalid. Fatal before the loop starts.
    Config,
    /// The request never produced an HTTP response.
    Transport,
    /// The service answered, but not with something we can use.
    Protocol,
    /// A homework record could not be turned into a verdict.
    Data,
    /// An outbound message could not be delivered. Logged only.
    Notification,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Data => "data",
            Self::Notification => "notification",
        };
        f.write_str(s)
    }
}

pub(crate) trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for reqwest::Error {
    fn kind(&self) -> ErrorKind {
        if self.is_status() || self.is_decode() {
            ErrorKind::Protocol
        } else if self.is_builder() {
            ErrorKind::Config
        } else {
            ErrorKind::Transport
        }
    }
}

/// Renders an error followed by each of its sources.
pub(crate) fn error_chain(e: &dyn Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();

    while let Some(s) = source {
        let s_text = s.to_string();
        // Skip a source whose text already ends the message
        if !s_text.is_empty() && !text.ends_with(&s_text) {
            text.push_str(": ");
            text.push_str(&s_text);
        }
        source = s.source();
    }

    text
}

/// Counts sequential failed cycles. The loop never gives up, so this
/// only feeds the logs.
#[derive(Debug, Default)]
pub(crate) struct FailureStreak {
    failure_count: usize,
}

impl FailureStreak {
    pub(crate) fn check<T, E>(&mut self, r: &Result<T, E>)
    where
        E: Error + Classify,
    {
        match r {
            Ok(_) => {
                if self.failure_count > 0 {
                    warn!(
                        "Recovered after {} sequential failed cycles",
                        self.failure_count
                    );
                }
                self.failure_count = 0;
            }
            Err(e) => {
                self.failure_count += 1;
                if self.failure_count > 1 {
                    warn!(
                        kind = %e.kind(),
                        "{} sequential failed cycles",
                        self.failure_count,
                    );
                }
            }
        }
    }

    pub(crate) fn failure_count(&self) -> usize {
        self.failure_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    enum Inner {
        #[snafu(display("invalid token"))]
        Leaf,
    }

    #[derive(Debug, Snafu)]
    enum Outer {
        #[snafu(display("Unable to poll"))]
        Wrapped { source: Inner },

        Transparent { source: Inner },
    }

    impl Classify for Outer {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Protocol
        }
    }

    #[test]
    fn chain_includes_every_source() {
        let e = Outer::Wrapped { source: Inner::Leaf };
        assert_eq!(error_chain(&e), "Unable to poll: invalid token");
    }

    #[test]
    fn chain_skips_repeated_text() {
        let e = Outer::Transparent { source: Inner::Leaf };
        assert_eq!(error_chain(&e), "Transparent: invalid token");
    }

    #[test]
    fn streak_resets_on_success() {
        let mut streak = FailureStreak::default();
        let failed: Result<(), Outer> = Err(Outer::Wrapped { source: Inner::Leaf });

        streak.check(&failed);
        streak.check(&failed);
        assert_eq!(streak.failure_count(), 2);

        streak.check(&Ok::<(), Outer>(()));
        assert_eq!(streak.failure_count(), 0);
    }
}
