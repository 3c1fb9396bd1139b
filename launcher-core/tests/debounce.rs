use core::ops::Add;
use core::time::Duration;

use launcher_core::config::LauncherConfig;
use launcher_core::controller::{
    ControlState, Inputs, LauncherController, LauncherOutputs, Transition,
};
use launcher_core::duty::Duty;
use launcher_core::gate::{GateActuator, GateDrive};
use launcher_core::input::Debouncer;
use launcher_core::presentation::NoopPresenter;
use launcher_core::time::ControlInstant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MockInstant(u64);

impl MockInstant {
    const fn millis(value: u64) -> Self {
        Self(value)
    }
}

impl Add<Duration> for MockInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + u64::try_from(rhs.as_millis()).expect("test durations fit"))
    }
}

impl ControlInstant for MockInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

#[derive(Default)]
struct IdleOutputs;

impl GateActuator for IdleOutputs {
    fn drive_gate(&mut self, _drive: GateDrive) {}

    fn reset_position(&mut self) {}

    fn position(&mut self) -> i32 {
        0
    }
}

impl LauncherOutputs for IdleOutputs {
    fn set_drive_duty(&mut self, _duty: Duty) {}

    fn set_indicator(&mut self, _on: bool) {}
}

/// Feeds `level(t)` for `t` in `1..=end` and counts confirmed presses.
fn count_presses(interval_ms: u64, end: u64, level: impl Fn(u64) -> bool) -> usize {
    let mut debouncer = Debouncer::new(Duration::from_millis(interval_ms));
    (1..=end)
        .filter(|&t| debouncer.sample(level(t), MockInstant::millis(t)))
        .count()
}

#[test]
fn bounce_bursts_shorter_than_interval_never_fire() {
    for burst in [1_u64, 10, 30, 49] {
        for period in [1_u64, 2, 3, 7] {
            let presses = count_presses(50, 500, |t| t <= burst && (t / period) % 2 == 0);
            assert_eq!(presses, 0, "burst {burst} ms, period {period} ms");
        }
    }
}

#[test]
fn held_press_fires_exactly_once() {
    for hold in [51_u64, 200, 10_000] {
        let presses = count_presses(50, hold + 500, |t| t <= hold);
        assert_eq!(presses, 1, "hold {hold} ms");
    }
}

#[test]
fn press_must_still_be_high_when_interval_elapses() {
    // High on 1..=50 means the line was stable for 50 ms at t = 51, but the
    // sample at 51 is already low.
    assert_eq!(count_presses(50, 300, |t| t <= 50), 0);
    assert_eq!(count_presses(50, 300, |t| t <= 51), 1);
}

#[test]
fn release_chatter_does_not_refire() {
    // Clean press, then 40 ms of chatter on release, then a clean low.
    let level = |t: u64| match t {
        1..=300 => true,
        301..=340 => t % 3 != 0,
        _ => false,
    };
    assert_eq!(count_presses(50, 1_000, level), 1);
}

#[test]
fn repeated_presses_each_fire() {
    let level = |t: u64| (t % 400) < 150;
    assert_eq!(count_presses(50, 4_000, level), 10);
}

#[test]
fn edge_hint_extends_window_between_samples() {
    let mut debouncer: Debouncer<MockInstant> = Debouncer::new(Duration::from_millis(50));

    assert!(!debouncer.sample(true, MockInstant::millis(0)));
    // An interrupt saw the line glitch at 45 ms even though every sample read high.
    debouncer.note_edge(MockInstant::millis(45));
    assert!(!debouncer.sample(true, MockInstant::millis(50)));
    assert!(!debouncer.sample(true, MockInstant::millis(94)));
    assert!(debouncer.sample(true, MockInstant::millis(95)));
}

#[test]
fn controller_ignores_bounce_and_arms_on_clean_press() {
    let mut controller: LauncherController<MockInstant, IdleOutputs, NoopPresenter> =
        LauncherController::new(LauncherConfig::DEFAULT, IdleOutputs, NoopPresenter);
    controller.start(0);

    let mut transitions = Vec::new();
    for t in 1..=400_u64 {
        let button_high = match t {
            1..=30 => t % 4 < 2,
            100..=400 => true,
            _ => false,
        };
        let inputs = Inputs {
            button_high,
            button_edge: matches!(t, 1..=30 | 100),
            pot_raw: 0,
        };
        if let Some(transition) = controller.tick(inputs, MockInstant::millis(t)).transition {
            transitions.push((t, transition));
        }
    }

    assert_eq!(
        transitions,
        vec![(
            150,
            Transition::Armed {
                duty: Duty::STOPPED
            }
        )]
    );
    assert_eq!(controller.state(), ControlState::Armed);
}
