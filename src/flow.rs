use crate::{
    error::{error_chain, Classify},
    telegram::Messenger,
    tracker::{self, Tracker},
};
use serde_json::Value;
use tracing::{debug, error, trace};

#[derive(Debug)]
pub(crate) struct NotifyFlow<M> {
    tracker: Tracker,
    messenger: M,
}

impl<M> NotifyFlow<M>
where
    M: Messenger,
{
    pub fn new(messenger: M) -> Self {
        Self {
            tracker: Tracker::default(),
            messenger,
        }
    }

    /// Announces every homework whose verdict changed, in the order
    /// given. Returns how many messages were attempted.
    ///
    /// The first record that cannot be assessed stops the pass; the
    /// records before it stay announced.
    pub async fn notify(&mut self, homeworks: &[Value]) -> Result<usize, tracker::Error> {
        let Self { tracker, messenger } = self;

        if homeworks.is_empty() {
            debug!("No homework statuses changed");
            return Ok(0);
        }

        let mut attempted = 0;
        for raw in homeworks {
            let assessment = tracker.assess(raw)?;

            if !assessment.changed {
                trace!(name = %assessment.name, "Verdict unchanged");
                continue;
            }

            debug!(
                name = %assessment.name,
                previous = ?tracker.last_sent(&assessment.name),
                "Verdict changed"
            );
            if let Err(e) = messenger.send(&assessment.text).await {
                error!(
                    kind = %e.kind(),
                    "Unable to announce the status of {:?}: {}",
                    assessment.name,
                    error_chain(&e),
                );
            }

            // Attempted counts as seen, delivered or not
            tracker.record(assessment);
            attempted += 1;
        }

        Ok(attempted)
    }

    /// Best effort: a failure is logged and dropped.
    pub async fn report(&mut self, text: &str) {
        if let Err(e) = self.messenger.send(text).await {
            error!(kind = %e.kind(), "Unable to deliver diagnostic: {}", error_chain(&e));
        }
    }

    #[cfg(test)]
    pub(crate) fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    #[cfg(test)]
    pub(crate) fn messenger(&self) -> &M {
        &self.messenger
    }
}
