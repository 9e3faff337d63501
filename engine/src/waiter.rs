//! Bounded waits for write propagation on an eventually-consistent read
//! path. `FixedDelay` reproduces the legacy fixed sleep after every mutating
//! call; `PollUntilMatch` is the stricter default for new code.

use std::time::Duration;

use regsync_client::{ApiError, RegistryApi};
use regsync_core::ResourceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    Present,
    Absent,
}

impl Expectation {
    fn matches(
        &self,
        state: &regsync_core::RemoteState,
    ) -> bool {
        match self {
            Expectation::Present => state.is_present(),
            Expectation::Absent => !state.is_present(),
        }
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Expectation::Present => write!(f, "present"),
            Expectation::Absent => write!(f, "absent"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitMode {
    /// Sleep a fixed duration after the write and return without
    /// re-checking. Legacy parity mode.
    FixedDelay { delay: Duration },
    /// Probe the read path at `interval` until it reflects the write,
    /// timing out once `max_wait` has elapsed without a match.
    PollUntilMatch {
        interval: Duration,
        max_wait: Duration,
    },
}

impl Default for WaitMode {
    fn default() -> Self {
        WaitMode::PollUntilMatch {
            interval: Duration::from_millis(250),
            max_wait: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timed out after {waited:?} waiting for {id} to become {expected}")]
    TimedOut {
        id: ResourceId,
        expected: Expectation,
        waited: Duration,
    },
    #[error("{0}")]
    Api(#[from] ApiError),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Waiter {
    mode: WaitMode,
}

impl Waiter {
    pub fn new(mode: WaitMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> WaitMode {
        self.mode
    }

    /// Blocks until the read path reflects the preceding write, within the
    /// configured bound. A timeout means the write was accepted but never
    /// observed, which callers must tell apart from a rejected write.
    pub async fn await_propagation<C: RegistryApi>(
        &self,
        client: &C,
        id: &ResourceId,
        expected: Expectation,
    ) -> Result<(), WaitError> {
        match self.mode {
            WaitMode::FixedDelay { delay } => {
                tokio::time::sleep(delay).await;
                Ok(())
            },
            WaitMode::PollUntilMatch { interval, max_wait } => {
                let started = tokio::time::Instant::now();
                loop {
                    if expected.matches(&client.probe(id).await?) {
                        return Ok(());
                    }
                    if started.elapsed() >= max_wait {
                        tracing::warn!(resource = %id, %expected, "propagation wait timed out");
                        return Err(WaitError::TimedOut {
                            id: id.clone(),
                            expected,
                            waited: started.elapsed(),
                        });
                    }
                    tokio::time::sleep(interval).await;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regsync_client::MemoryRegistry;
    use regsync_core::{RegistryId, RegistrySpec};

    fn poll(
        interval_ms: u64,
        max_wait_ms: u64,
    ) -> Waiter {
        Waiter::new(WaitMode::PollUntilMatch {
            interval: Duration::from_millis(interval_ms),
            max_wait: Duration::from_millis(max_wait_ms),
        })
    }

    fn partner_registry() -> (RegistryId, RegistrySpec) {
        (
            RegistryId::new("partner-registry").unwrap(),
            RegistrySpec {
                description: "partner-registry".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn zero_max_wait_times_out_deterministically() {
        let client = MemoryRegistry::new();
        let (id, _) = partner_registry();
        let resource = ResourceId::Registry(id);

        let err = poll(1, 0)
            .await_propagation(&client, &resource, Expectation::Present)
            .await
            .unwrap_err();

        assert!(matches!(err, WaitError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn zero_max_wait_still_accepts_an_already_matching_state() {
        let client = MemoryRegistry::new();
        let (id, spec) = partner_registry();
        client.insert_registry(&id, spec);
        let resource = ResourceId::Registry(id);

        poll(1, 0)
            .await_propagation(&client, &resource, Expectation::Present)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn polling_converges_once_the_lag_expires() {
        let client = MemoryRegistry::with_propagation_lag(3);
        let (id, spec) = partner_registry();
        let resource = ResourceId::Registry(id.clone());

        client.create_registry(&id, &spec).await.unwrap();

        poll(1, 1_000)
            .await_propagation(&client, &resource, Expectation::Present)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn polling_observes_absence_after_a_delete() {
        let client = MemoryRegistry::new();
        let (id, spec) = partner_registry();
        client.insert_registry(&id, spec);
        let resource = ResourceId::Registry(id.clone());

        client.delete_registry(&id).await.unwrap();

        poll(1, 1_000)
            .await_propagation(&client, &resource, Expectation::Absent)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fixed_delay_returns_without_probing() {
        let client = MemoryRegistry::new();
        let (id, _) = partner_registry();
        let resource = ResourceId::Registry(id);

        let waiter = Waiter::new(WaitMode::FixedDelay {
            delay: Duration::from_millis(1),
        });

        waiter
            .await_propagation(&client, &resource, Expectation::Present)
            .await
            .unwrap();

        assert!(client.operations().is_empty());
    }
}
