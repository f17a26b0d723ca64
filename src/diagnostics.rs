/// Media that takes longer than this to become playable is logged.
pub const SLOW_LOAD_MS: u64 = 3000;

#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

pub fn elapsed_ms(started_at: f64) -> u64 {
    (now_ms() - started_at).max(0.0) as u64
}

#[inline]
pub fn log_perf(scope: &str, started_at: f64, details: &str) {
    let elapsed_ms = elapsed_ms(started_at);
    if details.trim().is_empty() {
        tracing::debug!(target: "perf", "{scope} took {elapsed_ms}ms");
    } else {
        tracing::debug!(target: "perf", "{scope} took {elapsed_ms}ms | {details}");
    }
}

/// Warns once the first frame of a clip took longer than [`SLOW_LOAD_MS`].
pub fn log_slow_load(clip_id: &str, source: &str, started_at: f64) -> bool {
    let elapsed_ms = elapsed_ms(started_at);
    let slow = elapsed_ms > SLOW_LOAD_MS;
    if slow {
        tracing::warn!(clip_id, source, elapsed_ms, "slow clip load");
    }
    slow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_load_threshold() {
        assert!(log_slow_load("c", "https://cdn.example/c.mp4", now_ms() - 3500.0));
        assert!(!log_slow_load("c", "https://cdn.example/c.mp4", now_ms()));
    }

    #[test]
    fn elapsed_never_negative() {
        assert_eq!(elapsed_ms(now_ms() + 10_000.0), 0);
    }
}
