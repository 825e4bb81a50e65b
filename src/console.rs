//! Console read/print loop
//!
//! Intent-routed characters wait for a player line every turn; self-reporting
//! characters play themselves for a bounded number of turns. Reaching the
//! character's pause state, or a failed turn, asks whether to go on.

use crate::character::DialogueMode;
use crate::dialogue::{
    DialogueController, DialogueError, DialogueSession, StateResolution, TurnInput, TurnOutcome,
};
use crate::llm::StreamControl;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::sync::CancellationToken;

const CONTINUE_PROMPT: &str = "Do you want to continue (yes/no)? ";
const RULE_WIDTH: usize = 30;

/// What the loop does after a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Continue,
    Pause,
    Quit,
}

pub struct Console<R, W> {
    controller: Arc<DialogueController>,
    lines: Lines<R>,
    out: W,
    shutdown: CancellationToken,
    idle_timeout: Option<Duration>,
    max_auto_turns: usize,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    pub fn new(
        controller: Arc<DialogueController>,
        input: R,
        out: W,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            controller,
            lines: input.lines(),
            out,
            shutdown,
            idle_timeout: None,
            max_auto_turns: 10,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_max_auto_turns(mut self, max_auto_turns: usize) -> Self {
        self.max_auto_turns = max_auto_turns.max(1);
        self
    }

    /// Run until the player stops, input ends, or shutdown is requested
    pub async fn run(mut self) -> io::Result<()> {
        let character = self.controller.character();
        writeln!(self.out, "=== {} ===", character.name())?;
        let mode = character.mode();
        let mut session = self.controller.new_session();
        tracing::info!(
            session = %session.id(),
            character = %character.name(),
            "Dialogue started"
        );

        loop {
            let next = match mode {
                DialogueMode::SelfReport => self.auto_cycle(&mut session).await?,
                DialogueMode::IntentRouted => self.reply_turn(&mut session).await?,
            };
            match next {
                Next::Continue => {}
                Next::Pause => {
                    if !self.ask_continue().await? {
                        break;
                    }
                    session = self.controller.restart(&session);
                }
                Next::Quit => break,
            }
        }

        writeln!(self.out, "Goodbye.")?;
        self.out.flush()
    }

    /// Let a self-reporting character play until it pauses
    async fn auto_cycle(&mut self, session: &mut DialogueSession) -> io::Result<Next> {
        for _ in 0..self.max_auto_turns {
            writeln!(self.out, "\nCurrent State: {}", session.current_state())?;
            writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;

            match self.play_turn(session, TurnInput::Auto).await? {
                Some(outcome) => {
                    if let StateResolution::Unresolved { declared, adopted } = &outcome.resolution {
                        let declared = declared.as_deref().unwrap_or("nothing");
                        if *adopted {
                            writeln!(self.out, "(next state '{declared}' is not a known state)")?;
                        } else {
                            writeln!(
                                self.out,
                                "(next state '{declared}' is not a known state, staying in {})",
                                outcome.session.current_state()
                            )?;
                        }
                    }
                    *session = outcome.session;
                    if self.is_pause_state(session) {
                        return Ok(Next::Pause);
                    }
                }
                None if self.shutdown.is_cancelled() => return Ok(Next::Quit),
                None => return Ok(Next::Pause),
            }
        }
        Ok(Next::Pause)
    }

    /// Read one player line and answer it
    async fn reply_turn(&mut self, session: &mut DialogueSession) -> io::Result<Next> {
        let prompt = format!("{} - Your response: ", session.current_state());
        let Some(line) = self.read_line(&prompt).await? else {
            return Ok(Next::Quit);
        };
        if line.is_empty() {
            return Ok(Next::Continue);
        }

        match self.play_turn(session, TurnInput::Utterance(&line)).await? {
            Some(outcome) => {
                if let Some(intent) = &outcome.intent {
                    writeln!(self.out, "Intent: {intent}")?;
                }
                match &outcome.resolution {
                    StateResolution::Transitioned { from, to } => {
                        writeln!(self.out, "Transitioning from {from} to {to}")?;
                    }
                    StateResolution::NoMatchingTransition { .. } => {
                        writeln!(
                            self.out,
                            "No valid transition found. Remaining in {}.",
                            outcome.session.current_state()
                        )?;
                    }
                    StateResolution::Unresolved { .. } => {}
                }
                *session = outcome.session;
                if self.is_pause_state(session) {
                    Ok(Next::Pause)
                } else {
                    Ok(Next::Continue)
                }
            }
            None if self.shutdown.is_cancelled() => Ok(Next::Quit),
            None => Ok(Next::Pause),
        }
    }

    /// Run one turn, printing fragments as they arrive.
    ///
    /// `None` means the turn failed and was reported; the session is unchanged.
    async fn play_turn(
        &mut self,
        session: &DialogueSession,
        input: TurnInput<'_>,
    ) -> io::Result<Option<TurnOutcome>> {
        let control =
            StreamControl::new(self.shutdown.child_token()).with_idle_timeout(self.idle_timeout);

        let mut write_error = None;
        let out = &mut self.out;
        let result = self
            .controller
            .advance_turn(session, input, &control, |fragment| {
                if write_error.is_none() {
                    if let Err(e) = out.write_all(fragment.as_bytes()).and_then(|()| out.flush()) {
                        write_error = Some(e);
                    }
                }
            })
            .await;
        if let Some(e) = write_error {
            return Err(e);
        }
        writeln!(self.out)?;

        match result {
            Ok(outcome) => {
                tracing::debug!(
                    session = %outcome.session.id(),
                    state = %outcome.session.current_state(),
                    previous = ?outcome.session.previous_state(),
                    turns = outcome.session.history().len(),
                    response_chars = outcome.response.len(),
                    "Turn complete"
                );
                Ok(Some(outcome))
            }
            Err(e) => {
                self.report_failure(session, &e)?;
                Ok(None)
            }
        }
    }

    fn report_failure(&mut self, session: &DialogueSession, error: &DialogueError) -> io::Result<()> {
        if error.is_cancelled() {
            tracing::info!(session = %session.id(), "Turn cancelled");
            return writeln!(self.out, "Interrupted.");
        }
        tracing::warn!(
            session = %session.id(),
            state = %session.current_state(),
            error = %error,
            "Turn failed"
        );
        writeln!(self.out, "Turn failed: {error}")
    }

    fn is_pause_state(&self, session: &DialogueSession) -> bool {
        self.controller.character().pause_state() == Some(session.current_state())
    }

    async fn ask_continue(&mut self) -> io::Result<bool> {
        Ok(self
            .read_line(CONTINUE_PROMPT)
            .await?
            .is_some_and(|answer| matches!(answer.to_ascii_lowercase().as_str(), "yes" | "y")))
    }

    /// Prompt and read a trimmed line; `None` on end of input or shutdown
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;

        tokio::select! {
            biased;

            () = self.shutdown.cancelled() => Ok(None),
            line = self.lines.next_line() => Ok(line?.map(|l| l.trim().to_string())),
        }
    }
}
