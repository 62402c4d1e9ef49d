use crate::clock::Millis;
use crate::deferred::Deferred;

/// Default countdown length: fifteen minutes.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 15 * 60;

/// Interval between countdown ticks.
pub const TICK_MS: Millis = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

/// Countdown that auto-starts on the first keystroke.
///
/// Ticks are driven by [`Timer::poll`]; the pending tick is cancelled every
/// time the timer leaves `Running`, so a reset never inherits a stale tick.
#[derive(Debug, Clone)]
pub struct Timer {
    countdown_secs: u32,
    time_left: u32,
    is_running: bool,
    manually_paused: bool,
    tick: Deferred<()>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

impl Timer {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            countdown_secs,
            time_left: countdown_secs,
            is_running: false,
            manually_paused: false,
            tick: Deferred::new(),
        }
    }

    /// Rebuilds a stopped timer from a saved `time_left`.
    ///
    /// A saved value of zero restores the full countdown.
    pub fn restore(countdown_secs: u32, time_left: u32) -> Self {
        let mut timer = Self::new(countdown_secs);
        if time_left > 0 {
            timer.time_left = time_left.min(countdown_secs);
        }
        timer
    }

    /// Derived from the flags. A timer restored with part of its countdown
    /// used reports `Idle` until content or a toggle starts it again, so
    /// `Idle` does not imply a full countdown.
    pub fn state(&self) -> TimerState {
        if self.time_left == 0 {
            TimerState::Expired
        } else if self.is_running {
            TimerState::Running
        } else if self.manually_paused {
            TimerState::Paused
        } else {
            TimerState::Idle
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn manually_paused(&self) -> bool {
        self.manually_paused
    }

    /// Seconds consumed from the countdown since the last reset.
    pub fn elapsed_secs(&self) -> u32 {
        self.countdown_secs - self.time_left
    }

    /// Instant of the next scheduled tick, if the timer is running.
    pub fn next_tick_at(&self) -> Option<Millis> {
        self.tick.due_at()
    }

    /// Starts the countdown when content appears, unless the user paused it
    /// or no time remains. Returns whether this call started it.
    pub fn observe_content(&mut self, content: &str, now: Millis) -> bool {
        if content.is_empty() || self.is_running || self.manually_paused || self.time_left == 0 {
            return false;
        }
        tracing::debug!(time_left = self.time_left, "timer auto-started");
        self.run(now);
        true
    }

    /// Pause/resume button. Has no effect once expired.
    pub fn toggle(&mut self, now: Millis) -> TimerState {
        match self.state() {
            TimerState::Running => {
                self.is_running = false;
                self.manually_paused = true;
                self.tick.cancel();
            }
            TimerState::Idle | TimerState::Paused => {
                self.manually_paused = false;
                self.run(now);
            }
            TimerState::Expired => {}
        }
        self.state()
    }

    pub fn reset(&mut self) {
        self.time_left = self.countdown_secs;
        self.is_running = false;
        self.manually_paused = false;
        self.tick.cancel();
    }

    /// One countdown step. Stops the timer when it reaches zero.
    pub fn on_tick(&mut self) {
        if !self.is_running {
            return;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            tracing::debug!("timer expired");
            self.is_running = false;
            self.tick.cancel();
        }
    }

    /// Fires every tick due at `now`, returning how many fired.
    pub fn poll(&mut self, now: Millis) -> u32 {
        let mut fired = 0;
        while let Some(due_at) = self.tick.due_at() {
            if due_at > now {
                break;
            }
            self.tick.cancel();
            self.on_tick();
            fired += 1;
            if self.is_running {
                self.tick.arm(due_at + TICK_MS, ());
            }
        }
        fired
    }

    /// Drops the pending tick without touching the countdown.
    pub fn cancel_tick(&mut self) {
        self.tick.cancel();
    }

    fn run(&mut self, now: Millis) {
        self.is_running = true;
        self.tick.arm(now + TICK_MS, ());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_idle() {
        let timer = Timer::default();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.time_left(), 900);
        assert_eq!(timer.elapsed_secs(), 0);
        assert!(!timer.is_running());
        assert_eq!(timer.next_tick_at(), None);
    }

    #[test]
    fn test_auto_start_on_content() {
        let mut timer = Timer::default();
        assert!(!timer.observe_content("", 0));
        assert_eq!(timer.state(), TimerState::Idle);

        assert!(timer.observe_content("h", 0));
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.next_tick_at(), Some(TICK_MS));

        // already running
        assert!(!timer.observe_content("hi", 10));
        assert_eq!(timer.next_tick_at(), Some(TICK_MS));
    }

    #[test]
    fn test_manual_pause_suppresses_auto_start() {
        let mut timer = Timer::default();
        timer.observe_content("a", 0);
        assert_eq!(timer.toggle(500), TimerState::Paused);
        assert!(timer.manually_paused());
        assert_eq!(timer.next_tick_at(), None);

        assert!(!timer.observe_content("ab", 600));
        assert_eq!(timer.state(), TimerState::Paused);

        assert_eq!(timer.toggle(700), TimerState::Running);
        assert!(!timer.manually_paused());
        assert_eq!(timer.next_tick_at(), Some(1_700));
    }

    #[test]
    fn test_reset_clears_flags() {
        let mut timer = Timer::default();
        timer.observe_content("a", 0);
        timer.poll(5_000);
        timer.toggle(5_000);
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.time_left(), 900);
        assert!(!timer.manually_paused());
        assert_eq!(timer.next_tick_at(), None);
    }

    #[test]
    fn test_runs_to_expiry() {
        let mut timer = Timer::default();
        timer.observe_content("a", 0);
        for _ in 0..900 {
            timer.on_tick();
        }
        assert_eq!(timer.state(), TimerState::Expired);
        assert!(!timer.is_running());
        assert_eq!(timer.time_left(), 0);

        timer.on_tick();
        assert_eq!(timer.time_left(), 0);
        assert!(!timer.observe_content("more", 0));
        assert_eq!(timer.toggle(0), TimerState::Expired);
    }

    #[test]
    fn test_poll_fires_one_tick_per_second() {
        let mut timer = Timer::default();
        timer.observe_content("a", 0);
        assert_eq!(timer.poll(999), 0);
        assert_eq!(timer.poll(1_000), 1);
        assert_eq!(timer.time_left(), 899);
        assert_eq!(timer.poll(4_500), 3);
        assert_eq!(timer.time_left(), 896);
        assert_eq!(timer.next_tick_at(), Some(5_000));
    }

    #[test]
    fn test_poll_stops_at_zero() {
        let mut timer = Timer::new(3);
        timer.observe_content("a", 0);
        assert_eq!(timer.poll(60_000), 3);
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.next_tick_at(), None);
    }

    #[test]
    fn test_no_stale_tick_after_reset() {
        let mut timer = Timer::default();
        timer.observe_content("a", 0);
        timer.poll(2_000);
        timer.reset();
        timer.observe_content("b", 2_500);
        // the tick armed before the reset was due at 3_000; the new one is due at 3_500
        assert_eq!(timer.poll(3_000), 0);
        assert_eq!(timer.time_left(), 900);
        assert_eq!(timer.poll(3_500), 1);
        assert_eq!(timer.time_left(), 899);
    }

    #[test]
    fn test_restore() {
        let timer = Timer::restore(900, 600);
        assert_eq!(timer.time_left(), 600);
        assert_eq!(timer.elapsed_secs(), 300);
        assert_eq!(timer.state(), TimerState::Idle);

        assert_eq!(Timer::restore(900, 0).time_left(), 900);
        assert_eq!(Timer::restore(60, 600).time_left(), 60);
    }

    #[test]
    fn test_restored_timer_resumes_from_saved_time() {
        let mut timer = Timer::restore(900, 600);
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(!timer.manually_paused());
        assert!(timer.observe_content("more", 0));
        timer.poll(1_000);
        assert_eq!(timer.time_left(), 599);

        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.time_left(), 900);
    }
}
