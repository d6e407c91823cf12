use chrono::NaiveDate;
use foundation::{EpochSeconds, TimeSpan, add_days, date_label, date_to_epoch, parse_date};
use runtime::IntervalTimer;

use crate::config::SliderConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SliderState {
    Idle,
    Playing { next_step: u32 },
}

/// What one `advance` did: the steps applied, in order, and whether the
/// animation ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliderAdvance {
    pub steps: Vec<u32>,
    pub finished: bool,
}

/// Day slider over `steps` days from `epoch`, with timed playback.
#[derive(Debug, Clone)]
pub struct DateSlider {
    epoch: NaiveDate,
    steps: u32,
    value: u32,
    state: SliderState,
    timer: IntervalTimer,
}

impl DateSlider {
    pub fn new(config: &SliderConfig) -> Self {
        Self {
            epoch: config.epoch,
            steps: config.steps.max(1),
            value: 0,
            state: SliderState::Idle,
            timer: IntervalTimer::new(config.tick_ms),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max_value(&self) -> u32 {
        self.steps - 1
    }

    pub fn state(&self) -> SliderState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, SliderState::Playing { .. })
    }

    /// The play control is disabled while an animation runs.
    pub fn play_enabled(&self) -> bool {
        !self.is_playing()
    }

    pub fn date(&self) -> NaiveDate {
        add_days(self.epoch, self.value)
    }

    pub fn cursor(&self) -> EpochSeconds {
        date_to_epoch(self.date())
    }

    pub fn label(&self) -> String {
        date_label(self.date())
    }

    /// Manual input. Ignored while playing; out-of-range values are clamped.
    pub fn set_value(&mut self, value: u32) -> Option<EpochSeconds> {
        if self.is_playing() {
            return None;
        }
        self.value = value.min(self.max_value());
        Some(self.cursor())
    }

    /// Rewinds to the first day and starts ticking. `false` if already playing.
    pub fn play(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.state = SliderState::Playing { next_step: 0 };
        self.timer.start();
        true
    }

    /// Cancels playback, leaving the slider on the last applied day.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.is_playing();
        self.state = SliderState::Idle;
        self.timer.stop();
        was_playing
    }

    pub fn advance(&mut self, dt_ms: f64) -> SliderAdvance {
        let mut out = SliderAdvance::default();
        for _ in 0..self.timer.advance(dt_ms) {
            let SliderState::Playing { next_step } = self.state else {
                break;
            };
            self.value = next_step;
            out.steps.push(next_step);
            if next_step >= self.max_value() {
                self.state = SliderState::Idle;
                self.timer.stop();
                out.finished = true;
            } else {
                self.state = SliderState::Playing {
                    next_step: next_step + 1,
                };
            }
        }
        out
    }
}

/// Normalized state of the start/end date inputs after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangeUpdate {
    pub start: String,
    pub end: String,
    /// `min` attribute of the end input.
    pub end_min: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRangeInputs {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRangeInputs {
    /// Takes raw `YYYY-MM-DD` input values. A blank start clears the end;
    /// an end before the start snaps to the start.
    pub fn update(&mut self, start: &str, end: &str) -> DateRangeUpdate {
        self.start = parse_date(start);
        self.end = match self.start {
            None => None,
            Some(s) => parse_date(end).map(|e| e.max(s)),
        };
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        DateRangeUpdate {
            start: fmt(self.start),
            end: fmt(self.end),
            end_min: fmt(self.start),
        }
    }

    /// Span for the filter; a missing end means the start day alone.
    pub fn span(&self) -> Option<TimeSpan> {
        let start = self.start?;
        let end = self.end.unwrap_or(start);
        Some(TimeSpan {
            start: date_to_epoch(start),
            end: date_to_epoch(end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DateRangeInputs, DateSlider, SliderState};
    use crate::config::ViewerConfig;
    use foundation::EpochSeconds;
    use pretty_assertions::assert_eq;

    fn slider() -> DateSlider {
        DateSlider::new(&ViewerConfig::barcelona().slider)
    }

    #[test]
    fn fifty_ticks_run_the_whole_range() {
        let mut s = slider();
        s.set_value(17);
        assert!(s.play());
        assert!(!s.play_enabled());
        assert_eq!(s.state(), SliderState::Playing { next_step: 0 });

        let mut applied = Vec::new();
        let mut finished = false;
        for _ in 0..50 {
            let step = s.advance(100.0);
            applied.extend(step.steps);
            finished |= step.finished;
        }
        assert_eq!(applied, (0..50).collect::<Vec<_>>());
        assert!(finished);
        assert_eq!(s.state(), SliderState::Idle);
        assert!(s.play_enabled());
        assert_eq!(s.label(), "Mon Sep 09 2024");
        assert_eq!(s.advance(1000.0).steps, Vec::<u32>::new());
    }

    #[test]
    fn one_large_step_is_the_same_as_many_small_ones() {
        let mut s = slider();
        s.play();
        let out = s.advance(5000.0);
        assert_eq!(out.steps.len(), 50);
        assert!(out.finished);
    }

    #[test]
    fn first_tick_lands_on_the_epoch() {
        let mut s = slider();
        s.play();
        assert!(s.advance(99.0).steps.is_empty());
        assert_eq!(s.advance(1.0).steps, vec![0]);
        assert_eq!(s.label(), "Mon Jul 22 2024");
        assert_eq!(s.cursor(), EpochSeconds(1_721_606_400.0));
    }

    #[test]
    fn dragging_while_playing_is_ignored() {
        let mut s = slider();
        s.play();
        s.advance(300.0);
        assert_eq!(s.set_value(40), None);
        assert_eq!(s.value(), 2);
    }

    #[test]
    fn stop_cancels_playback() {
        let mut s = slider();
        s.play();
        s.advance(250.0);
        assert!(s.stop());
        assert!(s.advance(1000.0).steps.is_empty());
        assert_eq!(s.value(), 1);
        assert!(!s.stop());
    }

    #[test]
    fn manual_values_are_clamped() {
        let mut s = slider();
        assert_eq!(s.set_value(1000), Some(s.cursor()));
        assert_eq!(s.value(), 49);
    }

    #[test]
    fn blank_start_clears_the_range() {
        let mut r = DateRangeInputs::default();
        let u = r.update("", "2024-08-01");
        assert_eq!((u.start.as_str(), u.end.as_str(), u.end_min.as_str()), ("", "", ""));
        assert_eq!(r.span(), None);
    }

    #[test]
    fn end_snaps_to_start() {
        let mut r = DateRangeInputs::default();
        let u = r.update("2024-08-10", "2024-08-01");
        assert_eq!(u.end, "2024-08-10");
        assert_eq!(u.end_min, "2024-08-10");
        let span = r.span().unwrap();
        assert_eq!(span.start, span.end);
    }

    #[test]
    fn blank_end_uses_the_start_day() {
        let mut r = DateRangeInputs::default();
        let u = r.update("2024-07-22", "");
        assert_eq!(u.end, "");
        let span = r.span().unwrap();
        assert_eq!(span.end, EpochSeconds(1_721_606_400.0));
    }
}
