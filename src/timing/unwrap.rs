/// Modulus of the logger's 11-bit millisecond clock
pub const DEFAULT_TIME_SIZE: u32 = 2048;

/// Elapsed time a full buffer should span at the nominal rate, in ms
///
/// Integer division truncates, matching the logger firmware.
pub fn expected_elapsed_ms(source_length: usize, nominal_rate_hz: u32) -> i64 {
    source_length as i64 * 1000 / nominal_rate_hz as i64
}

/// Recovers true elapsed time between two wrapped clock readings.
///
/// Among every value congruent to the current reading modulo `time_size`,
/// picks the one nearest to where the nominal rate says the clock should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampUnwrapper {
    time_size: u32,
}

impl Default for TimestampUnwrapper {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_SIZE)
    }
}

impl TimestampUnwrapper {
    pub fn new(time_size: u32) -> Self {
        Self { time_size }
    }

    pub fn time_size(&self) -> u32 {
        self.time_size
    }

    /// Elapsed ms between `t_prev` (full resolution) and `t_curr` (wrapped).
    ///
    /// Total over all inputs. A result far from the nominal expectation means
    /// the rate table is wrong or the log is damaged; it is returned as-is.
    /// `nominal_rate_hz` must be non-zero.
    pub fn unwrap(
        &self,
        nominal_rate_hz: u32,
        source_length: usize,
        t_prev: u32,
        t_curr: u32,
    ) -> i64 {
        let time_size = self.time_size as i64;
        let half = time_size / 2;

        let expected = expected_elapsed_ms(source_length, nominal_rate_hz);
        let expected_t = (t_prev as i64 + expected).rem_euclid(time_size);
        let offset = t_curr as i64 - expected_t;

        if offset.abs() < half {
            expected + offset
        } else if offset < 0 {
            // clock wrapped past the modulus ahead of schedule
            expected + offset + time_size
        } else {
            // clock is behind and has not wrapped yet
            expected + offset - time_size
        }
    }
}
