use imutab::resample::resample;
use imutab::timing::{expected_elapsed_ms, target_length, TimestampUnwrapper};

#[test]
fn test_on_schedule_scenario() {
    let unwrapper = TimestampUnwrapper::new(2048);
    let t_curr = (100 + 85 * 1000 / 40) % 2048;
    assert_eq!(t_curr, 177);

    let elapsed = unwrapper.unwrap(40, 85, 100, t_curr);
    assert_eq!(elapsed, 2125);

    let len = target_length(elapsed, 40);
    assert_eq!(len, 85);

    let source: Vec<i32> = (0..85).map(|i| i * 3 - 40).collect();
    assert_eq!(resample(&source, len).unwrap(), source);
}

#[test]
fn test_not_yet_wrapped_scenario() {
    let unwrapper = TimestampUnwrapper::new(2048);
    assert_eq!(expected_elapsed_ms(85, 40), 2125);
    // naive expected reading is 29, actual reading 2000
    assert_eq!(unwrapper.unwrap(40, 85, 2000, 2000), 2048);
}

#[test]
fn test_recovers_elapsed_with_custom_modulus() {
    // 10 samples at 1 kHz -> 10 ms expected, modulus 64
    let time_size = 64u32;
    let unwrapper = TimestampUnwrapper::new(time_size);
    let expected = expected_elapsed_ms(10, 1000);

    for t_prev in 0..time_size {
        for e in (expected - 31)..=(expected + 31) {
            let t_curr = (t_prev as i64 + e).rem_euclid(time_size as i64) as u32;
            assert_eq!(
                unwrapper.unwrap(1000, 10, t_prev, t_curr),
                e,
                "t_prev={} e={}",
                t_prev,
                e
            );
        }
    }
}

#[test]
fn test_recovers_elapsed_for_logger_rates() {
    let unwrapper = TimestampUnwrapper::default();

    for rate in [125u32, 116, 47] {
        let expected = expected_elapsed_ms(85, rate);
        for t_prev in (0..2048u32).step_by(13) {
            for drift in [-1023i64, -400, -1, 0, 1, 37, 600, 1023] {
                let e = expected + drift;
                if e < 0 {
                    continue;
                }
                let t_curr = (t_prev as i64 + e).rem_euclid(2048) as u32;
                assert_eq!(unwrapper.unwrap(rate, 85, t_prev, t_curr), e);
            }
        }
    }
}

#[test]
fn test_result_congruent_to_reading() {
    let unwrapper = TimestampUnwrapper::default();
    for t_prev in (0..2048u32).step_by(31) {
        for t_curr in (0..2048u32).step_by(17) {
            let e = unwrapper.unwrap(125, 85, t_prev, t_curr);
            assert_eq!((t_prev as i64 + e).rem_euclid(2048), t_curr as i64);
            assert!((e - 680).abs() <= 1024);
        }
    }
}
