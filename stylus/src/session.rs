//! # Session Module - Lesson Session Coordination
//!
//! This module provides the high-level interface a host drives while a lesson is open. It
//! ties the target, the learner's buffer, the strict-mode interceptor and the progress
//! reporter together behind one object.
//!
//! ## Key Features
//!
//! - **Two modes**: strict keystroke interception or lenient full-text measurement over the
//!   same matching math
//! - **Atomic lesson switches**: loading a lesson replaces all per-lesson state at once and
//!   bumps the lesson generation, so timers from the previous lesson can never fire
//! - **Polling, not callbacks**: the host calls [`LessonSession::tick`] from its event loop to
//!   expire error flashes and perform debounced saves
//!
//! ## Data Flow
//!
#![doc = simple_mermaid::mermaid!("../diagrams/session_flow.mmd")]
//!
//! ## Usage Examples
//!
//! ### Strict mode
//!
//! ```rust
//! use stylus::input_handler::{Key, Keystroke, Verdict};
//! use stylus::session::{LessonSession, Mode};
//! use stylus::Configuration;
//! use web_time::Instant;
//!
//! let now = Instant::now();
//! let mut session = LessonSession::new(
//!     "hello",
//!     "default_user",
//!     "hi",
//!     "",
//!     Mode::Strict,
//!     Configuration::default(),
//! );
//!
//! let outcome = session.handle_key(Keystroke::new(Key::Char('x')), now);
//! assert!(outcome.verdict.is_suppressed());
//! assert_eq!(session.buffer(), "");
//!
//! session.handle_key(Keystroke::new(Key::Char('h')), now);
//! session.handle_key(Keystroke::new(Key::Char('i')), now);
//! assert!(session.match_state().completed);
//! ```
//!
//! ### Lenient mode
//!
//! ```rust
//! use stylus::session::{LessonSession, Mode};
//! use stylus::Configuration;
//! use web_time::Instant;
//!
//! let mut session = LessonSession::new(
//!     "assign",
//!     "default_user",
//!     "x = 1",
//!     "",
//!     Mode::Lenient,
//!     Configuration::default(),
//! );
//!
//! let update = session.set_text("x=1", Instant::now());
//! assert_eq!(update.state.matched_chars, update.state.total_chars);
//! assert!(update.state.completed);
//! ```

use web_time::Instant;

use crate::config::Configuration;
use crate::decoration::{self, Annotation, Region};
use crate::input_handler::{ErrorSignal, Interceptor, Keystroke, Verdict};
use crate::matching::MatchState;
use crate::progress::{ProgressEvent, ProgressReporter, ProgressSink, SaveOutcome};
use crate::target::Target;
use crate::timer::Generation;

/// How input reaches the buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Every edit is allowed. The engine only measures.
    #[default]
    Lenient,
    /// Every keystroke is validated by the interceptor before it reaches the buffer.
    Strict,
}

/// The result of a buffer change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub state: MatchState,
    pub events: Vec<ProgressEvent>,
}

/// The result of a keystroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    pub verdict: Verdict,
    /// Present when the keystroke changed the buffer
    pub update: Option<Update>,
}

/// The result of driving the session's timers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tick {
    /// An error flash expired during this tick
    pub error_cleared: bool,
    /// Saves performed during this tick
    pub saves: Vec<SaveOutcome>,
}

/// One open lesson
///
/// # Examples
///
/// ```rust
/// use stylus::session::{LessonSession, Mode};
/// use stylus::Configuration;
///
/// let session = LessonSession::new(
///     "loops",
///     "default_user",
///     "for i in 0..3 {}",
///     "for ",
///     Mode::Lenient,
///     Configuration::default(),
/// );
///
/// assert_eq!(session.match_state().matched_chars, 3);
/// assert_eq!(session.buffer(), "for ");
/// ```
#[derive(Debug, Clone)]
pub struct LessonSession {
    generation: Generation,
    target: Target,
    /// The learner's current buffer
    buffer: String,
    mode: Mode,
    /// Present in strict mode only
    interceptor: Option<Interceptor>,
    reporter: ProgressReporter,
    state: MatchState,
    annotations: Vec<Annotation>,
    config: Configuration,
}

impl LessonSession {
    /// Open a lesson
    ///
    /// `starting_text` is the lesson's starting snippet or a previously persisted buffer. In
    /// strict mode it is trimmed to the longest prefix of the target it matches.
    pub fn new(
        lesson_id: &str,
        user_id: &str,
        target_text: &str,
        starting_text: &str,
        mode: Mode,
        config: Configuration,
    ) -> Self {
        Self::build(
            Generation::default(),
            lesson_id,
            user_id,
            Target::new(target_text),
            starting_text,
            mode,
            config,
        )
    }

    fn build(
        generation: Generation,
        lesson_id: &str,
        user_id: &str,
        target: Target,
        starting_text: &str,
        mode: Mode,
        config: Configuration,
    ) -> Self {
        let (interceptor, buffer) = match mode {
            Mode::Strict => {
                let (interceptor, buffer) = Interceptor::resume(&target, starting_text, generation);
                (Some(interceptor), buffer)
            }
            Mode::Lenient => (None, starting_text.replace("\r\n", "\n")),
        };
        let state = target.compute_match(&buffer);
        let reporter = ProgressReporter::new(
            lesson_id,
            user_id,
            generation,
            config.save_debounce,
            config.persist,
        );

        tracing::debug!(lesson = lesson_id, ?mode, total = state.total_chars, "lesson loaded");

        Self {
            generation,
            target,
            buffer,
            mode,
            interceptor,
            reporter,
            state,
            annotations: Vec::new(),
            config,
        }
    }

    /// Attach instructor annotations (builder pattern)
    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Replace the instructor annotations, e.g. after switching lessons
    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    /// Switch to another lesson
    ///
    /// Pending saves of the current lesson are performed first, under the current lesson's
    /// id. Afterwards every piece of per-lesson state is replaced at once. Returns the
    /// outcome of the flushed saves.
    pub fn load_lesson<S: ProgressSink>(
        &mut self,
        lesson_id: &str,
        target_text: &str,
        starting_text: &str,
        sink: &mut S,
    ) -> Vec<SaveOutcome> {
        let outcomes = self.reporter.flush(sink);

        *self = Self::build(
            self.generation.next(),
            lesson_id,
            self.reporter.user_id(),
            Target::new(target_text),
            starting_text,
            self.mode,
            self.config.clone(),
        );

        outcomes
    }

    /// Change between strict and lenient mode, keeping the current buffer
    ///
    /// Entering strict mode trims the buffer to its matched prefix of the target. Returns
    /// `None` when the mode is unchanged.
    pub fn set_mode(&mut self, mode: Mode, now: Instant) -> Option<Update> {
        if mode == self.mode {
            return None;
        }

        self.mode = mode;
        self.interceptor = match mode {
            Mode::Strict => {
                let (interceptor, buffer) =
                    Interceptor::resume(&self.target, &self.buffer, self.generation);
                self.buffer = buffer;
                Some(interceptor)
            }
            Mode::Lenient => None,
        };

        Some(self.recompute(now))
    }

    /// Feed a keystroke
    ///
    /// In lenient mode every keystroke passes through, and the host reports the resulting
    /// text through [`LessonSession::set_text`].
    pub fn handle_key(&mut self, keystroke: Keystroke, now: Instant) -> KeyOutcome {
        let Some(interceptor) = self.interceptor.as_mut() else {
            return KeyOutcome {
                verdict: Verdict::PassThrough,
                update: None,
            };
        };

        let verdict = interceptor.handle(keystroke, &self.target, &self.config, now);

        let changed = match &verdict {
            Verdict::Accepted { text, .. } => {
                self.buffer.push_str(text);
                true
            }
            Verdict::Deleted { count, .. } => {
                for _ in 0..*count {
                    self.buffer.pop();
                }
                true
            }
            _ => false,
        };

        let update = changed.then(|| self.recompute(now));

        KeyOutcome { verdict, update }
    }

    /// Feed the full buffer text
    ///
    /// In strict mode the buffer only changes through accepted keystrokes, so the text is
    /// ignored and the current state is returned without events.
    pub fn set_text(&mut self, text: &str, now: Instant) -> Update {
        if self.mode == Mode::Strict {
            tracing::trace!("ignoring full-text update in strict mode");
            return Update {
                state: self.state,
                events: Vec::new(),
            };
        }

        self.buffer = text.replace("\r\n", "\n");
        self.recompute(now)
    }

    fn recompute(&mut self, now: Instant) -> Update {
        self.state = self.target.compute_match(&self.buffer);
        let events = self.reporter.report(self.state, &self.buffer, now);

        Update {
            state: self.state,
            events,
        }
    }

    /// Drive the error flash and the debounced save
    pub fn tick<S: ProgressSink>(&mut self, now: Instant, sink: &mut S) -> Tick {
        let error_cleared = self
            .interceptor
            .as_mut()
            .is_some_and(|interceptor| interceptor.tick(now));

        Tick {
            error_cleared,
            saves: self.reporter.poll(now, sink),
        }
    }

    /// Perform every pending save now, e.g. before the host exits
    pub fn flush<S: ProgressSink>(&mut self, sink: &mut S) -> Vec<SaveOutcome> {
        self.reporter.flush(sink)
    }

    /// Display regions for the target at `now`
    pub fn regions(&self, now: Instant) -> Vec<Region> {
        self.target
            .plan_regions(self.state.matched_chars, self.error_signal(now), now)
    }

    /// The active error signal, if any
    pub fn error_signal(&self, now: Instant) -> Option<&ErrorSignal> {
        self.interceptor
            .as_ref()
            .and_then(|interceptor| interceptor.error_signal(now))
    }

    /// Annotations to show for the current buffer
    pub fn visible_annotations(&self) -> impl Iterator<Item = &Annotation> {
        let line_count = self.buffer.split('\n').count();
        decoration::visible_annotations(&self.annotations, line_count)
    }

    pub fn match_state(&self) -> MatchState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn lesson_id(&self) -> &str {
        self.reporter.lesson_id()
    }

    pub fn user_id(&self) -> &str {
        self.reporter.user_id()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The strict-mode accepted offset into the target
    pub fn accepted_offset(&self) -> Option<usize> {
        self.interceptor.as_ref().map(Interceptor::cursor)
    }
}
