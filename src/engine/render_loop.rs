//! Frame-driven recomputation of a displayed value

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tracing::trace;

use crate::utils::Clock;

/// The host's display-frame cadence.
///
/// Missed ticks are skipped rather than bursted, so a stalled or throttled
/// runtime simply renders fewer frames.
#[derive(Debug)]
pub struct FrameTicker {
    interval: Interval,
}

impl FrameTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub async fn next_frame(&mut self) {
        self.interval.tick().await;
    }
}

/// Handle to a running (or finished) render loop.
///
/// Cancelling, or dropping the handle, guarantees that no further value is
/// published: every publish happens under the `live` lock and cancellation
/// flips it before aborting the task.
#[derive(Debug)]
pub struct RenderLoop {
    live: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl RenderLoop {
    /// A loop that never ran
    pub fn idle() -> Self {
        Self {
            live: Arc::new(Mutex::new(false)),
            task: None,
        }
    }

    /// Compute and publish once for `reference`, then keep recomputing on every
    /// frame while `should_continue` holds for the latest value.
    ///
    /// With no reference nothing is computed and an idle handle is returned.
    pub fn start<R, T, C, P, O>(
        reference: Option<R>,
        clock: Arc<dyn Clock>,
        frame_interval: Duration,
        compute: C,
        should_continue: P,
        mut publish: O,
    ) -> Self
    where
        R: Send + 'static,
        T: Send + 'static,
        C: Fn(&R, DateTime<Utc>) -> T + Send + 'static,
        P: Fn(&T) -> bool + Send + 'static,
        O: FnMut(T) + Send + 'static,
    {
        let Some(reference) = reference else {
            return Self::idle();
        };

        let first = compute(&reference, clock.now());
        let keep_going = should_continue(&first);
        publish(first);

        if !keep_going {
            return Self::idle();
        }

        let live = Arc::new(Mutex::new(true));
        let task_live = Arc::clone(&live);

        let task = tokio::spawn(async move {
            let mut ticker = FrameTicker::new(frame_interval);
            loop {
                ticker.next_frame().await;

                let value = compute(&reference, clock.now());
                let keep_going = should_continue(&value);

                let published = match task_live.lock() {
                    Ok(live) if *live => {
                        publish(value);
                        true
                    }
                    _ => false,
                };
                if !published {
                    break;
                }

                if !keep_going {
                    trace!("Render loop reached a resting value");
                    break;
                }
            }
        });

        Self {
            live,
            task: Some(task),
        }
    }

    /// Whether a next frame is still scheduled
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the loop; no publish happens after this returns
    pub fn cancel(&mut self) {
        if let Ok(mut live) = self.live.lock() {
            *live = false;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FRAME: Duration = Duration::from_millis(16);

    fn counter() -> (Arc<AtomicUsize>, impl FnMut(u32) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        (count, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn absent_reference_publishes_nothing() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (count, publish) = counter();
        let render = RenderLoop::start(None::<u32>, clock, FRAME, |r, _| *r, |_| true, publish);
        assert!(!render.is_active());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn resting_value_publishes_once_without_scheduling() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (count, publish) = counter();
        let render = RenderLoop::start(Some(7u32), clock, FRAME, |r, _| *r, |_| false, publish);
        assert!(!render.is_active());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_every_frame_until_predicate_fails() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);
        let frames = Arc::new(AtomicUsize::new(0));
        let frame_count = Arc::clone(&frames);

        let render = RenderLoop::start(
            Some(()),
            clock,
            FRAME,
            move |_, _| frame_count.fetch_add(1, Ordering::SeqCst),
            |n: &usize| *n < 3,
            move |n| sink.lock().unwrap().push(n),
        );
        assert!(render.is_active());

        tokio::time::sleep(FRAME * 10).await;

        assert_eq!(*values.lock().unwrap(), vec![0, 1, 2, 3]);
        assert!(!render.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_publishing() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (count, publish) = counter();
        let mut render = RenderLoop::start(Some(1u32), clock, FRAME, |r, _| *r, |_| true, publish);

        tokio::time::sleep(FRAME * 3 + Duration::from_millis(1)).await;
        render.cancel();
        let seen = count.load(Ordering::SeqCst);
        assert!(seen >= 2);

        tokio::time::sleep(FRAME * 10).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
        assert!(!render.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (count, publish) = counter();
        let render = RenderLoop::start(Some(1u32), clock, FRAME, |r, _| *r, |_| true, publish);
        drop(render);
        tokio::time::sleep(FRAME * 10).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
