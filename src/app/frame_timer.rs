use std::collections::VecDeque;

/// Sliding one-second window of frame timestamps.
#[derive(Debug, Default)]
pub struct FrameTimer {
    timestamps: VecDeque<f64>,
}

impl FrameTimer {
    const WINDOW_SECS: f64 = 1.0;

    pub fn tick(&mut self, now_secs: f64) {
        self.timestamps.push_back(now_secs);
        self.prune_stale(now_secs);
    }

    /// Mean frame time over the window, in milliseconds.
    pub fn frame_time_ms(&self) -> Option<f64> {
        let first = *self.timestamps.front()?;
        let last = *self.timestamps.back()?;
        let intervals = self.timestamps.len().checked_sub(1).filter(|&n| n > 0)?;
        Some((last - first) * 1000.0 / intervals as f64)
    }

    pub fn fps_message(&self) -> String {
        match self.frame_time_ms() {
            Some(ms) if ms > 0.0 => format!("{:.0} FPS ({ms:.2} ms/frame)", 1000.0 / ms),
            _ => "-- FPS".to_owned(),
        }
    }

    fn prune_stale(&mut self, now_secs: f64) {
        while let Some(oldest) = self.timestamps.front().copied() {
            if now_secs - oldest > Self::WINDOW_SECS {
                let _ = self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}
