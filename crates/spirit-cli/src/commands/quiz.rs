//! Interactive terminal quiz.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::{Confirm, Input, Select};
use indicatif::ProgressBar;
use spirit_core::config::SpiritConfig;
use spirit_core::quiz::model::QuizStep;
use spirit_core::quiz::{GenerationTicket, Selection, FAILURE_MESSAGE, PAINTING_MESSAGE, SUMMONING_MESSAGE};
use spirit_core::session::{GenerationOutcome, Generators, QuizSession, SessionEvent, SessionSettings};
use spirit_core::SpiritError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::output;

const GO_BACK: &str = "← Go Back";

#[derive(Args)]
pub struct QuizArgs {
    /// Export each finished card as a PNG to this path
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub async fn execute(args: QuizArgs, config: &SpiritConfig) -> Result<()> {
    let generators = Generators::from_config(config).context("Cannot start the quiz without provider credentials")?;
    let settings = SessionSettings::from_config(config);
    let session = Arc::new(QuizSession::new("terminal", generators, settings));

    output::print_banner();
    unlock(&session)?;

    loop {
        let ticket = loop {
            if let Some(ticket) = ask_next(&session)? {
                break ticket;
            }
        };

        let spinner = output::spinner(SUMMONING_MESSAGE);
        let (outcome, failure) = generate_with_progress(&session, ticket, &spinner).await;

        match outcome {
            GenerationOutcome::Complete { image } => {
                let (card, picture) = session.with_machine(|m| (m.card().cloned(), m.image().cloned()));
                let Some(card) = card else { continue };
                output::print_card(&card);
                if !image {
                    println!("{}", "Could not paint the illustration, using the element icon.".yellow());
                }
                if let Some(path) = &args.export {
                    output::export_card(&card, picture.as_ref(), path);
                }
            }
            GenerationOutcome::CardFailed | GenerationOutcome::Stale => {
                if failure.is_none() {
                    println!("{}", FAILURE_MESSAGE.red().bold());
                }
                println!();
                continue;
            }
        }

        let again = Confirm::new()
            .with_prompt("Make another card?")
            .default(true)
            .interact()
            .context("Failed to read answer")?;
        if !again {
            break;
        }
        session.reset()?;
    }

    Ok(())
}

/// Run one generation, following the session's events: the spinner switches
/// to the painting message once the card is in, and a failure message is
/// printed as soon as it is raised, before the automatic restart.
///
/// Returns the outcome and the failure message that was shown, if any.
async fn generate_with_progress(
    session: &QuizSession,
    ticket: GenerationTicket,
    spinner: &ProgressBar,
) -> (GenerationOutcome, Option<String>) {
    let mut events = session.subscribe();
    let mut failure = None;

    let generation = session.generate(ticket);
    tokio::pin!(generation);

    let outcome = loop {
        tokio::select! {
            outcome = &mut generation => break outcome,
            event = events.recv() => match event {
                Ok(event) => on_event(event, spinner, &mut failure),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break (&mut generation).await,
            },
        }
    };

    while let Ok(event) = events.try_recv() {
        on_event(event, spinner, &mut failure);
    }
    spinner.finish_and_clear();
    (outcome, failure)
}

fn on_event(event: SessionEvent, spinner: &ProgressBar, failure: &mut Option<String>) {
    match event {
        SessionEvent::StepChanged { step: QuizStep::Display } => spinner.set_message(PAINTING_MESSAGE),
        SessionEvent::GenerationFailed { message } => {
            spinner.finish_and_clear();
            println!("{}", message.red().bold());
            *failure = Some(message);
        }
        _ => {}
    }
}

fn unlock(session: &QuizSession) -> Result<()> {
    println!("{}", "Enter the secret passcode to begin".dimmed());
    loop {
        let attempt: String = Input::new()
            .with_prompt("Passcode")
            .interact_text()
            .context("Failed to read passcode")?;

        match session.unlock(&attempt) {
            Ok(()) => return Ok(()),
            Err(SpiritError::WrongPasscode) => {
                println!("{}", "Hmm, that's not it! Try again.".red());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Ask the current question. Returns a ticket once the last one is answered.
fn ask_next(session: &QuizSession) -> Result<Option<GenerationTicket>> {
    let (step, previous) = session.with_machine(|m| {
        let previous = m
            .current_question()
            .and_then(|q| m.answers().get(q).map(str::to_string));
        (m.step(), previous)
    });
    let Some(question) = step.question() else {
        return Err(SpiritError::InvalidStateTransition {
            from: step.to_string(),
            event: "answer".to_string(),
        }
        .into());
    };

    let mut items: Vec<&str> = question.options().to_vec();
    if question.index() > 0 {
        items.push(GO_BACK);
    }
    let default = previous
        .and_then(|p| items.iter().position(|item| *item == p))
        .unwrap_or(0);

    println!();
    println!("{}", output::progress_line(question.index()));
    let choice = Select::new()
        .with_prompt(format!("{} {}", question.icon(), question.title()))
        .items(&items)
        .default(default)
        .interact()
        .context("Failed to read answer")?;

    if items[choice] == GO_BACK {
        session.back()?;
        return Ok(None);
    }

    match session.select(items[choice])? {
        Selection::Advanced(_) => Ok(None),
        Selection::Generate(ticket) => Ok(Some(ticket)),
    }
}
