//! FIFO speech queue with fallback and interruption.
//!
//! Requests are played strictly in arrival order, one at a time. A failed or
//! timed-out synthesis downgrades that one request to the fallback speaker
//! and the queue moves on. [`SpeechQueue::cancel`] stops the current clip
//! and halts the drain without discarding queued requests, so speech stays
//! interruptible when the user starts talking over the assistant.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use bheema_core::{AssistantEvent, EventBus, SubscriptionId};

use crate::error::SpeechError;
use crate::language::language_tag;
use crate::provider::{FallbackSpeaker, Playback, Synthesizer};

#[derive(Clone, Debug)]
struct SpeechRequest {
    text: String,
    language: String,
}

#[derive(Default)]
struct QueueInner {
    pending: VecDeque<SpeechRequest>,
    speaking: bool,
    cancelled: bool,
    language: String,
}

/// Serializes spoken output.
///
/// Cloning shares the underlying queue, so the controller and the bus
/// subscription see the same state. The inner mutex is held only for queue
/// bookkeeping, never across an await.
#[derive(Clone)]
pub struct SpeechQueue {
    bus: Arc<EventBus>,
    synthesizer: Arc<dyn Synthesizer>,
    playback: Arc<dyn Playback>,
    fallback: Arc<dyn FallbackSpeaker>,
    synthesis_timeout: Duration,
    inner: Arc<Mutex<QueueInner>>,
}

impl SpeechQueue {
    pub fn new(
        bus: Arc<EventBus>,
        synthesizer: Arc<dyn Synthesizer>,
        playback: Arc<dyn Playback>,
        fallback: Arc<dyn FallbackSpeaker>,
        synthesis_timeout: Duration,
    ) -> Self {
        Self {
            bus,
            synthesizer,
            playback,
            fallback,
            synthesis_timeout,
            inner: Arc::new(Mutex::new(QueueInner {
                language: "en".to_string(),
                ..QueueInner::default()
            })),
        }
    }

    /// Set the language applied to requests arriving via the bus.
    pub fn set_language(&self, code: &str) {
        self.inner.lock().expect("speech queue mutex poisoned").language = code.to_string();
    }

    /// Subscribe this queue to `speak` events on the bus.
    ///
    /// Bus handlers are synchronous, so the handler hands the text to
    /// [`SpeechQueue::submit`], which drains on a spawned task.
    pub fn attach(&self) -> SubscriptionId {
        let queue = self.clone();
        self.bus.subscribe("speak", move |event| {
            if let AssistantEvent::Speak { text } = event {
                let language = queue
                    .inner
                    .lock()
                    .expect("speech queue mutex poisoned")
                    .language
                    .clone();
                queue.submit(text, &language);
            }
            Ok(())
        })
    }

    /// Queue an utterance and, if the queue was idle, drain it inline.
    ///
    /// Returns once every request queued at call time has settled.
    pub async fn enqueue(&self, text: &str, language: &str) {
        if self.push(text, language) {
            self.drain().await;
        }
    }

    /// Queue an utterance from synchronous code, draining on a spawned task.
    pub fn submit(&self, text: &str, language: &str) {
        if self.push(text, language) {
            let queue = self.clone();
            tokio::spawn(async move { queue.drain().await });
        }
    }

    /// Stop the current clip and halt the drain. Queued requests are kept;
    /// the next enqueue or submit picks them up.
    pub async fn cancel(&self) {
        {
            let mut inner = self.inner.lock().expect("speech queue mutex poisoned");
            if !inner.speaking && inner.pending.is_empty() {
                return;
            }
            inner.cancelled = true;
        }
        tracing::debug!("Speech cancelled");
        self.playback.stop().await;
    }

    /// Discard all queued requests without touching the current clip.
    pub fn flush(&self) {
        self.inner.lock().expect("speech queue mutex poisoned").pending.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().expect("speech queue mutex poisoned").pending.len()
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.lock().expect("speech queue mutex poisoned").speaking
    }

    /// Push a request. Returns true when the caller should start draining.
    fn push(&self, text: &str, language: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let mut inner = self.inner.lock().expect("speech queue mutex poisoned");
        inner.pending.push_back(SpeechRequest {
            text: text.to_string(),
            language: language.to_string(),
        });
        if inner.speaking {
            false
        } else {
            inner.speaking = true;
            inner.cancelled = false;
            true
        }
    }

    async fn drain(&self) {
        loop {
            let request = {
                let mut inner = self.inner.lock().expect("speech queue mutex poisoned");
                if inner.cancelled {
                    inner.speaking = false;
                    break;
                }
                match inner.pending.pop_front() {
                    Some(request) => request,
                    None => {
                        inner.speaking = false;
                        break;
                    }
                }
            };
            self.speak_one(&request).await;
            self.bus.publish(&AssistantEvent::SpeechEnded);
        }
    }

    /// Settle one request: synthesize and play, or fall back. Errors stop
    /// here; the queue always advances.
    async fn speak_one(&self, request: &SpeechRequest) {
        let tag = language_tag(&request.language);
        if let Err(e) = self.synthesize_and_play(&request.text, &tag).await {
            tracing::warn!(error = %e, "Synthesis failed; using fallback speaker");
            if let Err(e) = self.fallback.speak(&request.text, &tag).await {
                tracing::warn!(error = %e, "Fallback speaker failed; dropping utterance");
            }
        }
    }

    async fn synthesize_and_play(&self, text: &str, tag: &str) -> Result<(), SpeechError> {
        let clip = timeout(self.synthesis_timeout, self.synthesizer.synthesize(text, tag))
            .await
            .map_err(|_| SpeechError::Timeout(self.synthesis_timeout.as_secs()))??;
        if clip.data.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        self.playback.play(clip).await
    }
}

// =============================================================================
// Tests
// =============================================================================
