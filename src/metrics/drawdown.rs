//! Drawdown of an equity curve.
//!
//! Drawdowns are fractions relative to the running peak and are never positive:
//! -0.25 means the curve sits 25% below its high-water mark.

/// Drawdown tracker for incremental equity updates.
#[derive(Debug, Clone, Default)]
pub struct DrawdownTracker {
    /// Running peak, `None` until the first update.
    peak: Option<f64>,
    /// Current drawdown fraction.
    current_drawdown: f64,
    /// Deepest drawdown seen.
    max_drawdown: f64,
    /// Bars since the last peak.
    current_duration: usize,
    /// Longest stretch below a peak.
    max_duration: usize,
    /// Index at max drawdown.
    max_drawdown_idx: usize,
    /// Total count of updates.
    count: usize,
}

impl DrawdownTracker {
    /// Create a new drawdown tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with the next equity value.
    pub fn update(&mut self, value: f64) {
        self.count += 1;

        let peak = match self.peak {
            Some(peak) if peak >= value => peak,
            _ => {
                self.peak = Some(value);
                self.current_drawdown = 0.0;
                self.current_duration = 0;
                return;
            }
        };

        self.current_duration += 1;
        self.max_duration = self.max_duration.max(self.current_duration);

        // A non-positive peak has no meaningful ratio.
        self.current_drawdown = if peak > 0.0 { value / peak - 1.0 } else { 0.0 };
        if self.current_drawdown < self.max_drawdown {
            self.max_drawdown = self.current_drawdown;
            self.max_drawdown_idx = self.count - 1;
        }
    }

    /// Deepest drawdown as a fraction (≤ 0).
    #[inline]
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Current drawdown as a fraction (≤ 0).
    #[inline]
    pub fn current_drawdown(&self) -> f64 {
        self.current_drawdown
    }

    /// Running peak.
    #[inline]
    pub fn peak(&self) -> Option<f64> {
        self.peak
    }

    /// Longest run of bars spent below a peak.
    #[inline]
    pub fn max_duration(&self) -> usize {
        self.max_duration
    }

    /// Index where the deepest drawdown occurred.
    #[inline]
    pub fn max_drawdown_idx(&self) -> usize {
        self.max_drawdown_idx
    }
}

/// Drawdown at every point of an equity curve.
pub fn drawdown_curve(equity_curve: &[f64]) -> Vec<f64> {
    let mut tracker = DrawdownTracker::new();
    equity_curve
        .iter()
        .map(|&v| {
            tracker.update(v);
            tracker.current_drawdown()
        })
        .collect()
}

/// Maximum drawdown: `min_t(equity[t] / running_max - 1)`, 0 if the curve never declines.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut tracker = DrawdownTracker::new();
    for &v in equity_curve {
        tracker.update(v);
    }
    tracker.max_drawdown()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tracking() {
        let mut tracker = DrawdownTracker::new();

        tracker.update(100.0);
        tracker.update(110.0);
        tracker.update(105.0);
        tracker.update(120.0);
        tracker.update(100.0);

        assert!((tracker.max_drawdown() - (100.0 / 120.0 - 1.0)).abs() < 1e-12);
        assert_eq!(tracker.peak(), Some(120.0));
        assert_eq!(tracker.max_drawdown_idx(), 4);
    }

    #[test]
    fn test_drawdown_curve() {
        let equity = vec![100.0, 110.0, 105.0, 120.0, 100.0];
        let dd = drawdown_curve(&equity);

        assert_eq!(dd.len(), 5);
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0);
        assert!((dd[2] - (105.0 / 110.0 - 1.0)).abs() < 1e-12);
        assert_eq!(dd[3], 0.0);
        assert!((dd[4] - (100.0 / 120.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_max_drawdown() {
        let equity = vec![100.0, 120.0, 90.0, 110.0, 85.0];
        let mdd = max_drawdown(&equity);
        assert!((mdd - (85.0 / 120.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_non_decreasing_has_zero_drawdown() {
        assert_eq!(max_drawdown(&[1.0, 1.0, 2.0, 3.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
        assert!(max_drawdown(&[3.0, 2.999]) < 0.0);
    }

    #[test]
    fn test_durations() {
        let mut tracker = DrawdownTracker::new();
        for v in [10.0, 9.0, 8.0, 9.5, 11.0, 10.0] {
            tracker.update(v);
        }
        assert_eq!(tracker.max_duration(), 3);
    }
}
