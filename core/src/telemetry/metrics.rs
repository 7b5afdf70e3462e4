use std::sync::Mutex;

/// Counts external commands run through a gateway.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub commands: usize,
    pub failures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_command(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.commands += 1;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failures += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_commands_and_failures() {
        let recorder = MetricsRecorder::new();
        recorder.record_command();
        recorder.record_command();
        recorder.record_failure();
        assert_eq!(
            recorder.snapshot(),
            Metrics {
                commands: 2,
                failures: 1
            }
        );
    }
}
