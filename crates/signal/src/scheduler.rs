//! Frame-coalescing schedulers
//!
//! Work dispatched onto a scheduler runs in submission order, batched so
//! that everything queued within one refresh interval runs on the same
//! frame. [`FrameQueue`] is the deterministic core; the drivers around it
//! decide when a frame happens:
//! - [`RefreshScheduler`]: a thread ticking at a fixed refresh interval
//! - [`ManualScheduler`]: frames advanced explicitly, for tests
//! - [`ImmediateScheduler`]: no queue at all, work runs inline

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

/// Unit of work accepted by a scheduler
pub type Work = Box<dyn FnOnce() + Send>;

/// Something that runs work, possibly later and on another thread
pub trait Scheduler: Send + Sync {
    /// Queue `work` for execution
    fn dispatch(&self, work: Work);
}

/// Runs work inline on the dispatching thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn dispatch(&self, work: Work) {
        work();
    }
}

/// Scheduler metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Work items waiting for the next frame
    pub queue_depth: usize,
    /// Frames that ran at least one item
    pub frames: u64,
    /// Work items run since creation, including ones that panicked
    pub tasks_completed: u64,
    /// Work items that panicked
    pub panics: u64,
}

#[derive(Default)]
struct QueueState {
    pending: Vec<Work>,
    frame_requested: bool,
}

/// Ordered work queue drained once per frame.
///
/// `enqueue` reports whether the caller must request a frame: only the
/// first item after a drain does. `on_frame` runs the items queued before
/// it was called; items queued while it runs wait for the next frame.
#[derive(Default)]
pub struct FrameQueue {
    state: Mutex<QueueState>,
    frames: AtomicU64,
    tasks_completed: AtomicU64,
    panics: AtomicU64,
}

impl FrameQueue {
    /// Create an idle queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue work. Returns `true` when a frame must be requested.
    pub fn enqueue(&self, work: Work) -> bool {
        let mut state = self.state.lock();
        state.pending.push(work);
        !std::mem::replace(&mut state.frame_requested, true)
    }

    /// Run one frame. Returns the number of items run.
    pub fn on_frame(&self) -> usize {
        let batch = {
            let mut state = self.state.lock();
            state.frame_requested = false;
            std::mem::take(&mut state.pending)
        };
        if batch.is_empty() {
            return 0;
        }

        let count = batch.len();
        for work in batch {
            // A panicking item must not take the rest of the frame with it
            if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(work)) {
                self.panics.fetch_add(1, Ordering::Relaxed);
                error!(
                    target: "stockpile::scheduler",
                    "scheduled work panicked: {:?}",
                    e.downcast_ref::<&str>().copied().unwrap_or("(non-string panic)")
                );
            }
            self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        }
        self.frames.fetch_add(1, Ordering::Relaxed);
        count
    }

    /// Whether nothing is waiting for a frame
    pub fn is_idle(&self) -> bool {
        self.state.lock().pending.is_empty()
    }

    /// Return a snapshot of queue metrics.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            queue_depth: self.state.lock().pending.len(),
            frames: self.frames.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
        }
    }
}

/// Scheduler whose frames are advanced by the caller
#[derive(Default)]
pub struct ManualScheduler {
    queue: FrameQueue,
    frame_requested: AtomicBool,
}

impl ManualScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame. Returns the number of items run.
    pub fn advance_frame(&self) -> usize {
        self.frame_requested.store(false, Ordering::SeqCst);
        self.queue.on_frame()
    }

    /// Advance frames until nothing is queued. Returns the number of items run.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        while !self.queue.is_idle() {
            total += self.advance_frame();
        }
        total
    }

    /// Whether some dispatch has requested a frame that has not run yet
    pub fn has_pending_frame(&self) -> bool {
        self.frame_requested.load(Ordering::SeqCst)
    }

    /// Return a snapshot of scheduler metrics.
    pub fn stats(&self) -> SchedulerStats {
        self.queue.stats()
    }
}

impl Scheduler for ManualScheduler {
    fn dispatch(&self, work: Work) {
        if self.queue.enqueue(work) {
            self.frame_requested.store(true, Ordering::SeqCst);
        }
    }
}

/// Default refresh interval of the shared scheduler (60 Hz)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(16);

struct RefreshInner {
    queue: FrameQueue,
    frame_requested: Mutex<bool>,
    wake: Condvar,
    shutdown: AtomicBool,
    interval: Duration,
    epoch: Instant,
}

/// Threaded scheduler ticking at a fixed refresh interval.
///
/// The thread parks on a condition variable while the queue is empty, so
/// an idle scheduler holds no timer. Work dispatched within one interval
/// runs together on the next frame boundary.
pub struct RefreshScheduler {
    inner: Arc<RefreshInner>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

static SHARED: OnceCell<Arc<RefreshScheduler>> = OnceCell::new();

impl RefreshScheduler {
    /// Start a scheduler thread named `stockpile-refresh`.
    pub fn new(interval: Duration) -> io::Result<Self> {
        if interval.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "refresh interval must be non-zero",
            ));
        }

        let inner = Arc::new(RefreshInner {
            queue: FrameQueue::new(),
            frame_requested: Mutex::new(false),
            wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
            interval,
            epoch: Instant::now(),
        });

        let inner_clone = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("stockpile-refresh".to_string())
            .spawn(move || refresh_loop(&inner_clone))?;
        debug!(target: "stockpile::scheduler", interval_ms = interval.as_millis() as u64, "refresh scheduler started");

        Ok(Self {
            inner,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Process-wide scheduler at [`DEFAULT_REFRESH_INTERVAL`].
    ///
    /// Started on first use and never shut down.
    pub fn shared() -> io::Result<Arc<RefreshScheduler>> {
        SHARED
            .get_or_try_init(|| RefreshScheduler::new(DEFAULT_REFRESH_INTERVAL).map(Arc::new))
            .map(Arc::clone)
    }

    /// Configured refresh interval
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Whether nothing is waiting for a frame
    pub fn is_idle(&self) -> bool {
        self.inner.queue.is_idle()
    }

    /// Return a snapshot of scheduler metrics.
    pub fn stats(&self) -> SchedulerStats {
        self.inner.queue.stats()
    }

    /// Stop the thread after it runs whatever is still queued.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        {
            let _requested = self.inner.frame_requested.lock();
            self.inner.wake.notify_all();
        }

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            // Dropping the last handle from inside a work item must not self-join
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
            debug!(target: "stockpile::scheduler", "refresh scheduler stopped");
        }
    }
}

impl Scheduler for RefreshScheduler {
    fn dispatch(&self, work: Work) {
        if self.inner.queue.enqueue(work) {
            let mut requested = self.inner.frame_requested.lock();
            *requested = true;
            self.inner.wake.notify_one();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn refresh_loop(inner: &RefreshInner) {
    loop {
        {
            let mut requested = inner.frame_requested.lock();
            while !*requested && !inner.shutdown.load(Ordering::Acquire) {
                inner.wake.wait(&mut requested);
            }
            if !*requested {
                return;
            }
            *requested = false;
        }

        if !inner.shutdown.load(Ordering::Acquire) {
            std::thread::sleep(until_next_frame(inner.epoch, inner.interval));
        }
        inner.queue.on_frame();
    }
}

fn until_next_frame(epoch: Instant, interval: Duration) -> Duration {
    let elapsed = epoch.elapsed().as_nanos();
    let interval_ns = interval.as_nanos().max(1);
    let remaining = interval_ns - elapsed % interval_ns;
    Duration::from_nanos(remaining.min(u64::MAX as u128) as u64)
}
