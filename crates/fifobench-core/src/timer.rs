use std::cell::Cell;
use std::time::Instant;

thread_local! {
    /// Lazily-initialized per-thread epoch. The benchmark is single-threaded
    /// per worker, so a thread-local origin is enough to give every `now()`
    /// call a consistent monotonic base without a process-wide singleton.
    static EPOCH: Cell<Option<Instant>> = const { Cell::new(None) };
}

/// Seconds elapsed since the first call to `now()` on this thread.
pub fn now() -> f64 {
    EPOCH.with(|e| {
        let origin = match e.get() {
            Some(origin) => origin,
            None => {
                let origin = Instant::now();
                e.set(Some(origin));
                origin
            }
        };
        origin.elapsed().as_secs_f64()
    })
}

/// Elapsed time between a past `now()` sample and the current instant.
pub fn elapsed_since(start: f64) -> f64 {
    now() - start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_monotonic() {
        let a = now();
        let b = now();
        assert!(b >= a);
    }

    #[test]
    fn elapsed_since_is_nonnegative() {
        let start = now();
        assert!(elapsed_since(start) >= 0.0);
    }
}
