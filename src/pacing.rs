//! Rate limiting for the generation tick and the redraw frame.
//!
//! Time is passed in as milliseconds since an arbitrary origin so the
//! channels stay deterministic under test.

use std::fmt;

/// Length of the window over which the observed rate is counted.
pub const RATE_WINDOW_MS: u64 = 1_000;

/// Target rates offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RatePreset {
    Hz1,
    Hz4,
    #[default]
    Hz10,
    Hz24,
    Hz60,
    Hz144,
}

impl RatePreset {
    pub const ALL: [RatePreset; 6] = [
        RatePreset::Hz1,
        RatePreset::Hz4,
        RatePreset::Hz10,
        RatePreset::Hz24,
        RatePreset::Hz60,
        RatePreset::Hz144,
    ];

    pub fn hz(self) -> u32 {
        match self {
            RatePreset::Hz1 => 1,
            RatePreset::Hz4 => 4,
            RatePreset::Hz10 => 10,
            RatePreset::Hz24 => 24,
            RatePreset::Hz60 => 60,
            RatePreset::Hz144 => 144,
        }
    }

    /// Minimum time between two events, `floor(1000 / hz)`.
    pub fn interval_ms(self) -> u64 {
        RATE_WINDOW_MS / self.hz() as u64
    }

    pub fn from_hz(hz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.hz() == hz)
    }
}

impl fmt::Display for RatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} FPS", self.hz())
    }
}

/// One independently paced event stream.
#[derive(Debug, Clone)]
pub struct RateChannel {
    preset: RatePreset,
    interval_ms: u64,
    last_fire_ms: u64,
    window_ms: u64,
    window_count: u32,
    observed_rate: u32,
}

impl RateChannel {
    pub fn new(preset: RatePreset) -> Self {
        Self {
            preset,
            interval_ms: preset.interval_ms(),
            last_fire_ms: 0,
            window_ms: 0,
            window_count: 0,
            observed_rate: 0,
        }
    }

    pub fn preset(&self) -> RatePreset {
        self.preset
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn set_rate(&mut self, preset: RatePreset) {
        self.preset = preset;
        self.interval_ms = preset.interval_ms();
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_fire_ms) >= self.interval_ms
    }

    /// Fires if the interval has elapsed since the last fire.
    pub fn should_fire(&mut self, now_ms: u64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        self.fire(now_ms);
        true
    }

    /// Records an event regardless of the interval.
    pub fn fire(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_fire_ms);
        self.last_fire_ms = now_ms;
        self.window_count += 1;
        self.window_ms += elapsed;
        if self.window_ms >= RATE_WINDOW_MS {
            self.observed_rate = self.window_count;
            self.window_ms = 0;
            self.window_count = 0;
        }
    }

    pub fn time_until_due(&self, now_ms: u64) -> u64 {
        (self.last_fire_ms + self.interval_ms).saturating_sub(now_ms)
    }

    /// Events counted in the last completed window.
    pub fn observed_rate(&self) -> u32 {
        self.observed_rate
    }

    /// Clears all counters; the target rate is kept.
    pub fn reset(&mut self, now_ms: u64) {
        *self = Self {
            last_fire_ms: now_ms,
            ..Self::new(self.preset)
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Tick,
    Frame,
}

/// The tick and frame channels.
#[derive(Debug, Clone)]
pub struct Pacer {
    tick: RateChannel,
    frame: RateChannel,
}

impl Pacer {
    pub fn new(tick: RatePreset, frame: RatePreset) -> Self {
        Self {
            tick: RateChannel::new(tick),
            frame: RateChannel::new(frame),
        }
    }

    pub fn channel(&self, channel: Channel) -> &RateChannel {
        match channel {
            Channel::Tick => &self.tick,
            Channel::Frame => &self.frame,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut RateChannel {
        match channel {
            Channel::Tick => &mut self.tick,
            Channel::Frame => &mut self.frame,
        }
    }

    pub fn set_rate(&mut self, channel: Channel, preset: RatePreset) {
        self.channel_mut(channel).set_rate(preset);
    }

    pub fn should_fire(&mut self, channel: Channel, now_ms: u64) -> bool {
        self.channel_mut(channel).should_fire(now_ms)
    }

    /// Frame gate with the urgent override: a pending state change redraws
    /// immediately and still counts toward the observed frame rate.
    pub fn should_fire_frame(&mut self, now_ms: u64, urgent: bool) -> bool {
        if urgent {
            self.frame.fire(now_ms);
            return true;
        }
        self.frame.should_fire(now_ms)
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.tick.reset(now_ms);
        self.frame.reset(now_ms);
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(RatePreset::default(), RatePreset::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_intervals() {
        let intervals: Vec<u64> = RatePreset::ALL.iter().map(|p| p.interval_ms()).collect();
        assert_eq!(intervals, vec![1000, 250, 100, 41, 16, 6]);
        assert_eq!(RatePreset::from_hz(24), Some(RatePreset::Hz24));
        assert_eq!(RatePreset::from_hz(30), None);
        assert_eq!(RatePreset::Hz144.to_string(), "144 FPS");
        assert_eq!(RatePreset::default(), RatePreset::Hz10);
    }

    #[test]
    fn test_channel_gates_on_interval() {
        let mut channel = RateChannel::new(RatePreset::Hz10);
        assert!(!channel.should_fire(99));
        assert!(channel.should_fire(100));
        assert!(!channel.should_fire(150));
        assert_eq!(channel.time_until_due(150), 50);
        assert!(channel.should_fire(200));
        assert!(channel.should_fire(350));
    }

    #[test]
    fn test_observed_rate_after_window() {
        let mut channel = RateChannel::new(RatePreset::Hz10);
        for t in (100..=900).step_by(100) {
            assert!(channel.should_fire(t));
        }
        assert_eq!(channel.observed_rate(), 0);
        assert!(channel.should_fire(1000));
        assert_eq!(channel.observed_rate(), 10);
        assert_eq!(channel.window_count, 0);
        assert_eq!(channel.window_ms, 0);
    }

    #[test]
    fn test_set_rate_recomputes_interval() {
        let mut channel = RateChannel::new(RatePreset::Hz1);
        assert!(!channel.should_fire(500));
        channel.set_rate(RatePreset::Hz4);
        assert_eq!(channel.interval_ms(), 250);
        assert!(channel.should_fire(500));
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut channel = RateChannel::new(RatePreset::Hz60);
        for t in (0..=2_000).step_by(20) {
            channel.should_fire(t);
        }
        assert!(channel.observed_rate() > 0);
        channel.reset(2_000);
        assert_eq!(channel.observed_rate(), 0);
        assert_eq!(channel.preset(), RatePreset::Hz60);
        assert!(!channel.should_fire(2_010));
        assert!(channel.should_fire(2_016));
    }

    #[test]
    fn test_urgent_frame_bypasses_gate_and_counts() {
        let mut pacer = Pacer::new(RatePreset::Hz1, RatePreset::Hz1);
        assert!(!pacer.should_fire_frame(10, false));
        assert!(pacer.should_fire_frame(10, true));
        assert_eq!(pacer.channel(Channel::Frame).window_count, 1);
        // The override re-arms the interval from the urgent redraw.
        assert!(!pacer.should_fire_frame(1_000, false));
        assert!(pacer.should_fire_frame(1_010, false));
        assert_eq!(pacer.channel(Channel::Frame).observed_rate(), 2);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut pacer = Pacer::new(RatePreset::Hz10, RatePreset::Hz1);
        assert!(pacer.should_fire(Channel::Tick, 100));
        assert!(!pacer.should_fire(Channel::Frame, 100));
        pacer.set_rate(Channel::Frame, RatePreset::Hz144);
        assert_eq!(pacer.channel(Channel::Tick).interval_ms(), 100);
        assert!(pacer.should_fire(Channel::Frame, 100));
    }
}
