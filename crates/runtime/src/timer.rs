/// Fixed-period interval timer driven by elapsed time.
///
/// The timer never reads a clock itself: callers feed it elapsed milliseconds
/// and it reports how many whole periods fired. Fractional remainders carry
/// over so a 100 ms timer fed 30 ms at a time still fires every 100 ms.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntervalTimer {
    period_ms: f64,
    carry_ms: f64,
    running: bool,
}

impl IntervalTimer {
    /// A stopped timer. Periods below 1 ms are raised to 1 ms.
    pub fn new(period_ms: f64) -> Self {
        Self {
            period_ms: period_ms.max(1.0),
            carry_ms: 0.0,
            running: false,
        }
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts (or restarts) the timer with a fresh period.
    pub fn start(&mut self) {
        self.running = true;
        self.carry_ms = 0.0;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.carry_ms = 0.0;
    }

    /// Advances by `dt_ms` and returns the number of periods that elapsed.
    pub fn advance(&mut self, dt_ms: f64) -> u32 {
        if !self.running || dt_ms <= 0.0 {
            return 0;
        }
        self.carry_ms += dt_ms;
        let fired = (self.carry_ms / self.period_ms).floor();
        self.carry_ms -= fired * self.period_ms;
        fired as u32
    }
}
