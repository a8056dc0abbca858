use std::time::Duration;
use tokio::task::JoinHandle;

/// One-shot timer: after a delay, invoke a callback unless cancelled.
///
/// Arming replaces any pending callback. Dropping the alarm cancels it.
#[derive(Default)]
pub struct Alarm {
    handle: Option<JoinHandle<()>>,
}

impl Alarm {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Schedule `callback` to run after `delay`. Must be called inside a Tokio runtime.
    pub fn arm<F>(&mut self, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
    }

    /// Cancel the pending callback. Returns true if one was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    /// True while a callback is waiting to fire
    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Alarm {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&fired);
        (fired, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (fired, callback) = counter();
        let mut alarm = Alarm::new();
        alarm.arm(Duration::from_secs(5), callback);

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(alarm.is_armed());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!alarm.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (fired, callback) = counter();
        let mut alarm = Alarm::new();
        alarm.arm(Duration::from_secs(1), callback);

        assert!(alarm.cancel());
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!alarm.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending() {
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();
        let mut alarm = Alarm::new();

        alarm.arm(Duration::from_secs(1), first_cb);
        alarm.arm(Duration::from_secs(3), second_cb);
        tokio::time::sleep(Duration::from_secs(4)).await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
