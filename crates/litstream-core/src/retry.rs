//! Bounded retry with a fixed delay between attempts

use std::time::Duration;

/// Outcome of [`retry_fixed`] once every attempt has failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Call `attempt_fn` up to `max_attempts` times, sleeping `delay` between
/// failures (not after the last one).
///
/// `attempt_fn` receives the 1-based attempt number. `max_attempts == 0`
/// is treated as a single attempt.
pub fn retry_fixed<T, E: std::fmt::Display>(
    label: &str,
    max_attempts: u32,
    delay: Duration,
    mut attempt_fn: impl FnMut(u32) -> Result<T, E>,
) -> Result<T, Exhausted<E>> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match attempt_fn(attempt) {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts => {
                log::warn!(
                    "{label}: attempt {attempt}/{max_attempts} failed: {e}, retrying in {:?}",
                    delay
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                log::error!("{label}: failed after {attempt} attempt(s): {e}");
                return Err(Exhausted { attempts: attempt, last: e });
            }
        }
    }
}
