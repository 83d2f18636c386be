use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// A cancellable repeating timer. The playback engine owns exactly one and
/// never starts it twice without stopping it in between.
pub trait Ticker {
    fn start(&mut self, cadence: Duration);
    fn stop(&mut self);
}

impl<T: Ticker + ?Sized> Ticker for Box<T> {
    fn start(&mut self, cadence: Duration) {
        (**self).start(cadence)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Ticker driven by hand. Records what the engine asked of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualTicker {
    running: bool,
    cadence: Option<Duration>,
    starts: usize,
    stops: usize,
    max_live: usize,
    live: usize,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn cadence(&self) -> Option<Duration> {
        self.cadence
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn stops(&self) -> usize {
        self.stops
    }

    /// Most timers ever alive at the same time.
    pub fn max_live(&self) -> usize {
        self.max_live
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, cadence: Duration) {
        self.running = true;
        self.cadence = Some(cadence);
        self.starts += 1;
        self.live += 1;
        self.max_live = self.max_live.max(self.live);
    }

    fn stop(&mut self) {
        if self.running {
            self.live -= 1;
        }
        self.running = false;
        self.stops += 1;
    }
}

/// One tick delivered by [`IntervalTicker`], stamped with the timer
/// generation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Tells whether a queued tick still belongs to the live timer.
#[derive(Debug, Clone)]
pub struct TickGate {
    generation: Arc<AtomicU64>,
}

impl TickGate {
    pub fn is_current(&self, tick: Tick) -> bool {
        self.generation.load(Ordering::SeqCst) == tick.generation
    }
}

/// Tokio interval task posting [`Tick`]s into the event loop's channel.
/// Must be started from inside a tokio runtime.
pub struct IntervalTicker {
    events: UnboundedSender<Tick>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn new(events: UnboundedSender<Tick>) -> Self {
        Self {
            events,
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    pub fn gate(&self) -> TickGate {
        TickGate {
            generation: self.generation.clone(),
        }
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self, cadence: Duration) {
        self.stop();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let events = self.events.clone();
        debug!("starting playback timer #{} every {:?}", generation, cadence);

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(cadence);
            interval.tick().await; // Skip immediate first trigger
            loop {
                interval.tick().await;
                if events.send(Tick { generation }).is_err() {
                    // event loop has shut down
                    break;
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let stale = self.generation.fetch_add(1, Ordering::SeqCst);
            debug!("stopped playback timer #{}", stale);
        }
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn manual_ticker_tracks_live_timers() {
        let mut ticker = ManualTicker::new();
        ticker.start(Duration::from_millis(500));
        ticker.stop();
        ticker.start(Duration::from_millis(500));
        assert!(ticker.is_running());
        assert_eq!(ticker.starts(), 2);
        assert_eq!(ticker.max_live(), 1);
    }

    #[tokio::test]
    async fn interval_ticker_delivers_current_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = IntervalTicker::new(tx);
        let gate = ticker.gate();

        ticker.start(Duration::from_millis(10));
        let tick = rx.recv().await.unwrap();
        assert!(gate.is_current(tick));

        ticker.stop();
        assert!(!gate.is_current(tick));
    }

    #[tokio::test]
    async fn restarting_invalidates_old_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = IntervalTicker::new(tx);
        let gate = ticker.gate();

        ticker.start(Duration::from_millis(10));
        let first = rx.recv().await.unwrap();
        ticker.start(Duration::from_millis(10));
        assert!(!gate.is_current(first));

        // drain anything the first timer queued before it was aborted
        loop {
            let tick = rx.recv().await.unwrap();
            if gate.is_current(tick) {
                assert_ne!(tick.generation, first.generation);
                break;
            }
        }
    }
}
