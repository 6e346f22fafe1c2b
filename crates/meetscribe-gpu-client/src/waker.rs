//! Power-on-and-poll loop: asks the smart plug to turn on, then polls
//! the health probe until it answers healthy or `boot_wait_time`
//! elapses. No cancellation input — the deadline is the only exit, and
//! concurrent wakes for the same device are not guarded against.

use std::sync::Arc;
use std::time::Duration;

use meetscribe_smart_plug::SmartPlugActuator;
use tracing::{error, info};

use crate::probe::GpuHealthProbe;

const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10);

pub struct GpuWaker {
    smart_plug: Arc<dyn SmartPlugActuator>,
    probe: GpuHealthProbe,
    boot_wait_time: Duration,
    check_interval: Duration,
}

impl GpuWaker {
    pub fn new(
        smart_plug: Arc<dyn SmartPlugActuator>,
        probe: GpuHealthProbe,
        boot_wait_time: Duration,
    ) -> Self {
        Self {
            smart_plug,
            probe,
            boot_wait_time,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    fn is_configured(&self) -> bool {
        self.smart_plug.is_configured() && self.boot_wait_time > Duration::ZERO
    }

    /// Returns `true` once the probe reports healthy, `false` if
    /// unconfigured, the plug failed to turn on, or `boot_wait_time`
    /// elapsed first.
    pub async fn try_wake(&self, job_id: &str) -> bool {
        if !self.is_configured() {
            return false;
        }

        if !self.smart_plug.turn_on().await {
            error!(job_id, "smart plug turn_on failed, aborting wake");
            return false;
        }

        let mut elapsed = Duration::ZERO;
        loop {
            tokio::time::sleep(self.check_interval).await;
            elapsed += self.check_interval;

            if self.probe.is_available().await {
                info!(job_id, elapsed_secs = elapsed.as_secs(), "GPU worker woke up");
                return true;
            }

            if elapsed >= self.boot_wait_time {
                error!(job_id, "GPU worker did not wake within boot_wait_time");
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetscribe_smart_plug::NullSmartPlug;

    #[tokio::test]
    async fn unconfigured_waker_returns_false_immediately() {
        let waker = GpuWaker::new(
            Arc::new(NullSmartPlug),
            GpuHealthProbe::new("127.0.0.1", 1, None),
            Duration::from_secs(30),
        );
        assert!(!waker.try_wake("job-1").await);
    }

    #[tokio::test]
    async fn zero_boot_wait_time_is_treated_as_unconfigured() {
        struct AlwaysOn;
        #[async_trait::async_trait]
        impl SmartPlugActuator for AlwaysOn {
            fn is_configured(&self) -> bool {
                true
            }
            async fn turn_on(&self) -> bool {
                true
            }
            async fn turn_off(&self) -> bool {
                true
            }
            async fn is_on(&self) -> Option<bool> {
                Some(true)
            }
        }

        let waker = GpuWaker::new(
            Arc::new(AlwaysOn),
            GpuHealthProbe::new("127.0.0.1", 1, None),
            Duration::ZERO,
        );
        assert!(!waker.try_wake("job-1").await);
    }
}
