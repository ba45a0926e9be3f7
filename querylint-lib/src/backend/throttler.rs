use crate::Result;
use core::pin::pin;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use ohno::IntoAppError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

/// Limits how many metric queries are in flight and lets any caller pause new ones.
///
/// Call [`Throttler::acquire`] before each request and hold the permit until the response
/// arrives. When the backend asks for a break (HTTP 429), [`Throttler::pause_for`] stops
/// new requests from starting until the pause expires. Overlapping pauses resolve to the
/// longest one.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
    paused: AtomicBool,
    resume: Notify,
    resume_at: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Minimum extension required for a new pause to override an active one.
    const MIN_PAUSE_EXTENSION: Duration = Duration::from_millis(250);

    /// Create a throttler allowing at most `max_concurrent` requests at a time.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            paused: AtomicBool::new(false),
            resume: Notify::new(),
            resume_at: Mutex::new(None),
        })
    }

    /// Wait until unpaused, then take a concurrency slot.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        loop {
            // Register for the wake-up before checking the flag so a resume in between is not lost.
            let mut resumed = pin!(self.resume.notified());
            let _ = resumed.as_mut().enable();

            if self.is_paused() {
                resumed.await;
                continue;
            }

            return Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .into_app_err("request throttler was shut down");
        }
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Stop new requests for `duration`, then resume automatically.
    ///
    /// Requests already holding a permit are unaffected. Returns `false` when an
    /// equivalent or longer pause is already in effect.
    pub fn pause_for(self: &Arc<Self>, duration: Duration) -> bool {
        let new_resume_at = Instant::now() + duration;

        {
            let mut guard = self.resume_at.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.is_some_and(|existing| existing + Self::MIN_PAUSE_EXTENSION >= new_resume_at) {
                return false;
            }
            *guard = Some(new_resume_at);
        }

        log::debug!("pausing metric queries for {}ms", duration.as_millis());
        self.paused.store(true, Ordering::Release);

        let this = Arc::clone(self);
        drop(tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            let should_resume = {
                let mut guard = this.resume_at.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.is_some_and(|t| Instant::now() >= t) {
                    *guard = None;
                    true
                } else {
                    false
                }
            };

            if should_resume {
                this.paused.store(false, Ordering::Release);
                this.resume.notify_waiters();
            }
        }));

        true
    }
}
