//! Quiz state machine.
//!
//! [`QuizMachine`] is a plain synchronous value: it records answers, walks
//! the transition table in [`model::QuizStep::on`] and accepts generation
//! results tagged with the run they belong to. Async orchestration lives in
//! [`crate::session`].

pub mod model;

use tracing::debug;

use crate::card::Card;
use crate::error::{SpiritError, SpiritResult};
use crate::provider::RenderedImage;
use model::{AnswerSet, PartialAnswers, Question, QuizEvent, QuizStep};

pub const SUMMONING_MESSAGE: &str = "Summoning your spirit animal...";
pub const PAINTING_MESSAGE: &str = "Painting your spirit animal...";
pub const FAILURE_MESSAGE: &str = "Oh no! Something went wrong. Try again!";

/// Identifies one generation run. Bumped on every start and every reset.
pub type RunId = u64;

/// Everything the generation sequence needs, captured when it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub run: RunId,
    pub answers: AnswerSet,
}

/// Outcome of selecting an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Moved on to the next question.
    Advanced(QuizStep),
    /// The last question was answered; the caller must run generation.
    Generate(GenerationTicket),
}

#[derive(Debug, Clone)]
pub struct QuizMachine {
    step: QuizStep,
    answers: PartialAnswers,
    card: Option<Card>,
    image: Option<RenderedImage>,
    run: RunId,
    image_pending: bool,
    failed: bool,
    message: Option<&'static str>,
}

impl Default for QuizMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizMachine {
    /// A fresh, locked quiz.
    pub fn new() -> Self {
        Self {
            step: QuizStep::Locked,
            answers: PartialAnswers::default(),
            card: None,
            image: None,
            run: 0,
            image_pending: false,
            failed: false,
            message: None,
        }
    }

    pub fn step(&self) -> QuizStep {
        self.step
    }

    pub fn answers(&self) -> &PartialAnswers {
        &self.answers
    }

    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    pub fn image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    /// True while the image call of the current run is in flight.
    pub fn image_pending(&self) -> bool {
        self.image_pending
    }

    /// True between a card-stage failure and the automatic reset.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Progress or failure message for the user, if any.
    pub fn message(&self) -> Option<&'static str> {
        self.message
    }

    /// Look up the transition for `event` without applying it.
    fn target(&self, event: QuizEvent) -> SpiritResult<QuizStep> {
        self.step
            .on(event)
            .ok_or_else(|| SpiritError::InvalidStateTransition {
                from: self.step.to_string(),
                event: event.as_str().to_string(),
            })
    }

    fn enter(&mut self, to: QuizStep) {
        debug!(from = %self.step, to = %to, "Quiz transition");
        self.step = to;
    }

    /// Leave the gate when `attempt` matches `secret`, ignoring case.
    pub fn unlock(&mut self, attempt: &str, secret: &str) -> SpiritResult<()> {
        let to = self.target(QuizEvent::Unlock)?;
        if !passcode_matches(attempt, secret) {
            return Err(SpiritError::WrongPasscode);
        }
        self.enter(to);
        Ok(())
    }

    /// Record an answer for the current question and advance.
    pub fn select(&mut self, value: &str) -> SpiritResult<Selection> {
        let to = self.target(QuizEvent::Answer)?;
        let question = self
            .step
            .question()
            .ok_or_else(|| SpiritError::validation("no question in this step"))?;

        if !question.accepts(value) {
            return Err(SpiritError::validation(format!(
                "'{}' is not an option for {:?}",
                value, question
            )));
        }

        let mut answers = self.answers.clone();
        answers.set(question, value);

        if to != QuizStep::Generating {
            self.answers = answers;
            self.enter(to);
            return Ok(Selection::Advanced(to));
        }

        let complete = answers
            .complete()
            .ok_or_else(|| SpiritError::validation("answers are incomplete"))?;

        self.answers = answers;
        self.run += 1;
        self.failed = false;
        self.message = Some(SUMMONING_MESSAGE);
        self.enter(to);

        Ok(Selection::Generate(GenerationTicket {
            run: self.run,
            answers: complete,
        }))
    }

    /// Step back to the previous question. Answers are kept.
    pub fn back(&mut self) -> SpiritResult<QuizStep> {
        let to = self.target(QuizEvent::Back)?;
        self.enter(to);
        Ok(to)
    }

    fn is_current(&self, run: RunId) -> bool {
        run == self.run
    }

    /// Store the card of `run` and show it. Returns false for stale results.
    pub fn card_ready(&mut self, run: RunId, card: Card) -> bool {
        if !self.is_current(run) || self.failed {
            return false;
        }
        let Ok(to) = self.target(QuizEvent::CardReady) else {
            return false;
        };

        self.card = Some(card);
        self.image_pending = true;
        self.message = Some(PAINTING_MESSAGE);
        self.enter(to);
        true
    }

    /// Mark the card stage of `run` as failed. The reset follows separately.
    pub fn card_failed(&mut self, run: RunId) -> bool {
        if !self.is_current(run) || self.step != QuizStep::Generating {
            return false;
        }
        self.failed = true;
        self.message = Some(FAILURE_MESSAGE);
        true
    }

    /// Return to the first question after a failed run.
    pub fn failure_reset(&mut self, run: RunId) -> bool {
        if !self.is_current(run) || !self.failed {
            return false;
        }
        let Ok(to) = self.target(QuizEvent::FailureReset) else {
            return false;
        };
        self.clear();
        self.enter(to);
        true
    }

    /// Attach the illustration of `run`. Returns false for stale results.
    pub fn image_ready(&mut self, run: RunId, image: RenderedImage) -> bool {
        if !self.is_current(run) || self.step != QuizStep::Display {
            return false;
        }
        self.image = Some(image);
        self.image_pending = false;
        self.message = None;
        true
    }

    /// Give up on the illustration of `run`; the card stays usable.
    pub fn image_failed(&mut self, run: RunId) -> bool {
        if !self.is_current(run) || self.step != QuizStep::Display {
            return false;
        }
        self.image_pending = false;
        self.message = None;
        true
    }

    /// Start over from the first question, discarding everything.
    pub fn reset(&mut self) -> SpiritResult<()> {
        let to = self.target(QuizEvent::Reset)?;
        self.clear();
        self.enter(to);
        Ok(())
    }

    fn clear(&mut self) {
        self.answers = PartialAnswers::default();
        self.card = None;
        self.image = None;
        self.image_pending = false;
        self.failed = false;
        self.message = None;
        self.run += 1;
    }

    /// Current question, when in a question step.
    pub fn current_question(&self) -> Option<Question> {
        self.step.question()
    }
}

/// Compare a passcode attempt against the secret, ignoring case.
pub fn passcode_matches(attempt: &str, secret: &str) -> bool {
    attempt.to_lowercase() == secret.to_lowercase()
}
