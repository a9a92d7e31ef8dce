use std::time::{Duration, Instant};

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll: Duration::from_millis(250),
        }
    }

    #[cfg(test)]
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }
}

/// Polls `probe` until it yields `Some`, or returns `Ok(None)` once
/// `policy.timeout` has elapsed. Errors from `probe` end the wait early.
///
/// The probe always runs at least once, so a zero timeout still checks the
/// current state.
pub fn wait_until<T>(
    policy: WaitPolicy,
    mut probe: impl FnMut() -> Result<Option<T>>,
) -> Result<Option<T>> {
    let deadline = Instant::now() + policy.timeout;
    loop {
        if let Some(value) = probe()? {
            return Ok(Some(value));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        std::thread::sleep(policy.poll.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_as_soon_as_probe_succeeds() {
        let mut calls = 0;
        let policy = WaitPolicy::new(Duration::from_secs(5)).with_poll(Duration::from_millis(1));
        let found = wait_until(policy, || {
            calls += 1;
            Ok((calls == 3).then_some("ready"))
        })
        .expect("wait");
        assert_eq!(found, Some("ready"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn zero_timeout_probes_once() {
        let mut calls = 0;
        let found: Option<()> = wait_until(WaitPolicy::new(Duration::ZERO), || {
            calls += 1;
            Ok(None)
        })
        .expect("wait");
        assert!(found.is_none());
        assert_eq!(calls, 1);
    }

    #[test]
    fn probe_error_is_propagated() {
        let err = wait_until::<()>(WaitPolicy::new(Duration::from_secs(5)), || {
            anyhow::bail!("session gone")
        })
        .expect_err("must fail");
        assert_eq!(err.to_string(), "session gone");
    }

    #[test]
    fn gives_up_after_timeout() {
        let policy = WaitPolicy::new(Duration::from_millis(20)).with_poll(Duration::from_millis(5));
        let started = Instant::now();
        let found: Option<()> = wait_until(policy, || Ok(None)).expect("wait");
        assert!(found.is_none());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
