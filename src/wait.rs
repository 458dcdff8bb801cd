use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::error::PageError;

/// Re-checks `check` every `interval` until it returns `true`.
///
/// Gives up with [`PageError::Timeout`] once `timeout` has elapsed. An error
/// from `check` is returned immediately.
pub async fn poll_until<F>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<(), PageError>
where
    F: FnMut() -> Result<bool, PageError>,
{
    let started = Instant::now();
    loop {
        if check()? {
            return Ok(());
        }
        let waited = started.elapsed();
        if waited >= timeout {
            return Err(PageError::Timeout {
                what: what.to_string(),
                waited,
            });
        }
        tokio::time::sleep(interval.min(timeout - waited)).await;
    }
}

/// Randomized pause between page visits, so requests don't arrive on a fixed beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    pub async fn pause(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        //650ms plus up to 280ms of jitter
        Self::new(Duration::from_millis(650), Duration::from_millis(930))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn poll_returns_once_condition_holds() {
        let mut calls = 0;
        let result = poll_until("third call", Duration::from_secs(1), Duration::from_millis(1), || {
            calls += 1;
            Ok(calls == 3)
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn poll_times_out() {
        let result = poll_until("never", Duration::from_millis(20), Duration::from_millis(5), || {
            Ok(false)
        })
        .await;
        match result {
            Err(PageError::Timeout { what, waited }) => {
                assert_eq!(what, "never");
                assert!(waited >= Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_stops_on_check_error() {
        let mut calls = 0;
        let result = poll_until("broken", Duration::from_secs(1), Duration::from_millis(1), || {
            calls += 1;
            Err(PageError::driver("tab crashed"))
        })
        .await;
        assert!(matches!(result, Err(PageError::Driver(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn pacing_stays_in_range() {
        let pacing = Pacing::new(Duration::from_millis(930), Duration::from_millis(650));
        for _ in 0..50 {
            let delay = pacing.delay();
            assert!(delay >= Duration::from_millis(650) && delay <= Duration::from_millis(930));
        }
        assert_eq!(Pacing::none().delay(), Duration::ZERO);
    }
}
