use crate::config::Mode;

/// Starting speed used when a test does not declare one.
pub const DEFAULT_START_SPEED: f64 = 10.0;

/// The playback speeds to try for one test, fastest first.
///
/// Outside [`Mode::Test`] a session always plays at its original speed,
/// since a snapshot recorded too fast would be junk. In test mode an
/// explicit override is the only speed tried; otherwise the ladder starts at
/// the test's speed (10 if unset), steps through 5 when starting above it,
/// and ends with `1, 0.5, 0.5`.
pub fn test_speeds(start_speed: f64, mode: Mode, speed_override: Option<f64>) -> Vec<f64> {
    if mode != Mode::Test {
        return vec![1.0];
    }

    if let Some(speed) = speed_override {
        return vec![speed];
    }

    let start = if start_speed == 0.0 {
        DEFAULT_START_SPEED
    } else {
        start_speed
    };

    let mut speeds = vec![start];
    if start > 5.0 {
        speeds.push(5.0);
    }
    speeds.extend([1.0, 0.5, 0.5]);
    speeds
}
