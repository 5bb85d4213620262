//! Quiz sessions.
//!
//! A [`QuizSession`] owns one [`QuizMachine`] and the provider adapters, and
//! runs the two-stage generation sequence. Every state change is announced
//! on a broadcast channel so a UI can refresh.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::SpiritConfig;
use crate::error::SpiritResult;
use crate::provider::anthropic::AnthropicCardClient;
use crate::provider::openai::OpenAiImageClient;
use crate::provider::{CardGenerator, ImageGenerator, RenderedImage};
use crate::quiz::model::QuizStep;
use crate::quiz::{GenerationTicket, QuizMachine, RunId, Selection};

/// Change notification for a session.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    StepChanged { step: QuizStep },
    GenerationFailed { message: String },
    ImageReady,
    ImageFailed,
    /// Current state, sent to a subscriber when it attaches.
    Snapshot(SessionSnapshot),
}

/// What a page needs to know to tell whether it is out of date.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub step: QuizStep,
    pub run: RunId,
    pub image_pending: bool,
    pub failed: bool,
}

/// How a generation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Card shown; `image` tells whether the illustration arrived.
    Complete { image: bool },
    /// Card stage failed and the quiz was sent back to the start.
    CardFailed,
    /// The session moved on while a call was in flight; results were dropped.
    Stale,
}

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub passcode: String,
    pub failure_reset_delay: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &SpiritConfig) -> Self {
        Self {
            passcode: config.passcode.clone(),
            failure_reset_delay: config.failure_reset_delay(),
        }
    }
}

/// Provider adapters shared by all sessions.
#[derive(Clone)]
pub struct Generators {
    pub cards: Arc<dyn CardGenerator>,
    pub images: Arc<dyn ImageGenerator>,
}

impl Generators {
    /// Build the Anthropic and OpenAI adapters. Fails when a key is missing.
    pub fn from_config(config: &SpiritConfig) -> SpiritResult<Self> {
        let client = config.http_client()?;
        Ok(Self {
            cards: Arc::new(AnthropicCardClient::new(&config.anthropic, client.clone())?),
            images: Arc::new(OpenAiImageClient::new(&config.openai, client)?),
        })
    }
}

pub struct QuizSession {
    id: String,
    machine: Mutex<QuizMachine>,
    generators: Generators,
    settings: SessionSettings,
    tx: broadcast::Sender<SessionEvent>,
    last_seen: Mutex<Instant>,
}

impl QuizSession {
    pub fn new(id: impl Into<String>, generators: Generators, settings: SessionSettings) -> Self {
        let (tx, _rx) = broadcast::channel(32);
        Self {
            id: id.into(),
            machine: Mutex::new(QuizMachine::new()),
            generators,
            settings,
            tx,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn machine(&self) -> MutexGuard<'_, QuizMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the state machine.
    pub fn with_machine<R>(&self, f: impl FnOnce(&QuizMachine) -> R) -> R {
        f(&self.machine())
    }

    pub fn step(&self) -> QuizStep {
        self.machine().step()
    }

    /// Copy of the current illustration, if any.
    pub fn image(&self) -> Option<RenderedImage> {
        self.machine().image().cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let machine = self.machine();
        SessionSnapshot {
            step: machine.step(),
            run: machine.run(),
            image_pending: machine.image_pending(),
            failed: machine.failed(),
        }
    }

    /// Subscribe and capture the current state in one go. Events emitted
    /// after the snapshot is taken are still delivered to the receiver.
    pub fn attach(&self) -> (SessionSnapshot, broadcast::Receiver<SessionEvent>) {
        let rx = self.subscribe();
        (self.snapshot(), rx)
    }

    fn emit(&self, event: SessionEvent) {
        debug!(session = %self.id, ?event, "Session event");
        let _ = self.tx.send(event);
    }

    /// Record activity on the session.
    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    pub fn unlock(&self, attempt: &str) -> SpiritResult<()> {
        self.machine().unlock(attempt, &self.settings.passcode)?;
        info!(session = %self.id, "Quiz unlocked");
        self.emit(SessionEvent::StepChanged { step: QuizStep::Style });
        Ok(())
    }

    /// Answer the current question. When this completes the quiz, the
    /// returned ticket must be passed to [`QuizSession::generate`].
    pub fn select(&self, value: &str) -> SpiritResult<Selection> {
        let selection = self.machine().select(value)?;
        let step = match &selection {
            Selection::Advanced(step) => *step,
            Selection::Generate(_) => QuizStep::Generating,
        };
        self.emit(SessionEvent::StepChanged { step });
        Ok(selection)
    }

    pub fn back(&self) -> SpiritResult<QuizStep> {
        let step = self.machine().back()?;
        self.emit(SessionEvent::StepChanged { step });
        Ok(step)
    }

    pub fn reset(&self) -> SpiritResult<()> {
        self.machine().reset()?;
        info!(session = %self.id, "Quiz reset");
        self.emit(SessionEvent::StepChanged { step: QuizStep::Style });
        Ok(())
    }

    /// Run the card call, then the image call, for `ticket`.
    pub async fn generate(&self, ticket: GenerationTicket) -> GenerationOutcome {
        let run = ticket.run;
        info!(session = %self.id, run, element = %ticket.answers.element, "Generating card");

        let card = match self.generators.cards.generate_card(&ticket.answers).await {
            Ok(card) => card,
            Err(e) => return self.fail(run, &e.to_string()).await,
        };

        let image_prompt = card.image_prompt.clone();
        let shown = self.machine().card_ready(run, card);
        if !shown {
            debug!(session = %self.id, run, "Discarding stale card");
            return GenerationOutcome::Stale;
        }
        self.emit(SessionEvent::StepChanged { step: QuizStep::Display });

        match self.generators.images.generate_image(&image_prompt).await {
            Ok(image) => {
                let applied = self.machine().image_ready(run, image);
                if !applied {
                    debug!(session = %self.id, run, "Discarding stale image");
                    return GenerationOutcome::Stale;
                }
                info!(session = %self.id, run, "Card complete");
                self.emit(SessionEvent::ImageReady);
                GenerationOutcome::Complete { image: true }
            }
            Err(e) => {
                warn!(session = %self.id, run, error = %e, "Image generation failed, keeping placeholder");
                let applied = self.machine().image_failed(run);
                if !applied {
                    return GenerationOutcome::Stale;
                }
                self.emit(SessionEvent::ImageFailed);
                GenerationOutcome::Complete { image: false }
            }
        }
    }

    async fn fail(&self, run: RunId, details: &str) -> GenerationOutcome {
        error!(session = %self.id, run, error = %details, "Card generation failed");

        let marked = self.machine().card_failed(run);
        if !marked {
            return GenerationOutcome::Stale;
        }
        let message = self.machine().message().unwrap_or_default().to_string();
        self.emit(SessionEvent::GenerationFailed { message });

        tokio::time::sleep(self.settings.failure_reset_delay).await;

        let reset = self.machine().failure_reset(run);
        if reset {
            info!(session = %self.id, run, "Quiz restarted after failure");
            self.emit(SessionEvent::StepChanged { step: QuizStep::Style });
        }
        GenerationOutcome::CardFailed
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process fake providers.

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    use crate::card::model::sample_card;
    use crate::card::Card;
    use crate::error::{SpiritError, SpiritResult};
    use crate::provider::{CardGenerator, ImageGenerator, RenderedImage};
    use crate::quiz::model::AnswerSet;

    #[derive(Default)]
    pub struct FakeCards {
        pub fail: bool,
        pub calls: AtomicUsize,
        /// When set, calls wait for a notification before answering.
        pub gate: Option<Notify>,
    }

    #[async_trait]
    impl CardGenerator for FakeCards {
        async fn generate_card(&self, answers: &AnswerSet) -> SpiritResult<Card> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(SpiritError::Transport("connection refused".to_string()));
            }
            let mut card = sample_card();
            card.element = answers.element.clone();
            Ok(card)
        }
    }

    #[derive(Default)]
    pub struct FakeImages {
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerator for FakeImages {
        async fn generate_image(&self, _image_prompt: &str) -> SpiritResult<RenderedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SpiritError::Transport("HTTP 500".to_string()));
            }
            Ok(RenderedImage::png(vec![0x89, b'P', b'N', b'G']))
        }
    }
}
