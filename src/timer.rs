use indicatif::HumanDuration;
use std::time::{Duration, Instant};

/// Wall-clock timer for one collection flow.
#[derive(Debug, Clone)]
pub struct StageTimer {
    start_time: Instant,
    duration: Option<Duration>,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
            duration: None,
        }
    }

    pub fn finish(&mut self) -> Duration {
        let duration = self.start_time.elapsed();
        self.duration = Some(duration);
        duration
    }

    /// Duration recorded by `finish`, or the time elapsed so far.
    pub fn get_duration(&self) -> Duration {
        self.duration.unwrap_or_else(|| self.start_time.elapsed())
    }

    pub fn get_duration_human(&self) -> String {
        HumanDuration(self.get_duration()).to_string()
    }
}
