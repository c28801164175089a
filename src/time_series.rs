/// A WPM reading taken at `t` seconds into the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// WPM readings collected once per tick while a session runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WpmTrace {
    points: Vec<TimeSeriesPoint>,
}

impl WpmTrace {
    pub fn push(&mut self, point: TimeSeriesPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_tuples(&self) -> Vec<(f64, f64)> {
        self.points.iter().copied().map(Into::into).collect()
    }

    pub fn peak(&self) -> f64 {
        self.points.iter().map(|p| p.wpm).fold(0.0, f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|p| p.wpm).sum::<f64>() / self.points.len() as f64)
    }

    /// Population standard deviation of the readings; lower is steadier.
    pub fn consistency(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self
            .points
            .iter()
            .map(|p| {
                let diff = mean - p.wpm;
                diff * diff
            })
            .sum::<f64>()
            / self.points.len() as f64;
        Some(variance.sqrt())
    }
}
