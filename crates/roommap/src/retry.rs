use std::{error::Error, fmt::Display, time::Duration};

use serde::{Deserialize, Serialize};

/// Fixed-delay polling policy. `max_attempts: None` polls forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(with = "millis", rename = "delay_ms")]
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            max_attempts: Some(40),
        }
    }
}

/// Calls `probe` until it returns `true`, sleeping `policy.delay` between calls. The first call
/// happens immediately. Returns the number of attempts it took.
pub async fn poll_until<F>(mut probe: F, policy: RetryPolicy) -> Result<u32, RetryError>
where
    F: FnMut() -> bool,
{
    let mut attempts = 0;

    loop {
        attempts += 1;
        if probe() {
            return Ok(attempts);
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(RetryError::Exhausted { attempts });
        }

        log::trace!("[retry] Attempt {attempts} failed, retrying in {:?}", policy.delay);
        tokio::time::sleep(policy.delay).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    Exhausted { attempts: u32 },
}

impl Error for RetryError {}

impl Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted { attempts } => write!(f, "gave up after {attempts} attempts"),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_probe() {
        let start = tokio::time::Instant::now();
        let attempts = poll_until(|| true, RetryPolicy::default()).await.unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_the_fixed_delay_between_probes() {
        let calls = Cell::new(0);
        let start = tokio::time::Instant::now();

        let attempts = poll_until(
            || {
                calls.set(calls.get() + 1);
                calls.get() == 4
            },
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(attempts, 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_the_cap() {
        let policy = RetryPolicy {
            delay: Duration::from_millis(500),
            max_attempts: Some(3),
        };

        assert_eq!(
            poll_until(|| false, policy).await,
            Err(RetryError::Exhausted { attempts: 3 })
        );
    }

    #[test]
    fn policy_from_json() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"delay_ms": 250, "max_attempts": null}"#).unwrap();

        assert_eq!(policy.delay, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, None);
    }
}
