//! # Input Handler Module - Strict-Mode Keystroke Interception
//!
//! In strict mode every keystroke is validated *before* it reaches the buffer. The
//! [`Interceptor`] accepts a keystroke only when it produces the expected next character
//! of the target, and suppresses everything else. A suppressed keystroke raises a
//! short-lived [`ErrorSignal`] the host can flash on screen.
//!
//! ## Key Responsibilities
//!
//! - **Classification**: navigation and shortcut keys pass through, content keys are
//!   validated, anything else is blocked
//! - **Validation**: compare content keys against the target at the accepted offset
//! - **Indentation skipping**: after a newline, or on Tab, jump over leading indentation so
//!   the learner never retypes it
//! - **Error flashing**: a rejected keystroke flashes until the flash expires or the next
//!   keystroke is accepted
//!
//! ## States
//!
#![doc = simple_mermaid::mermaid!("../diagrams/interceptor_states.mmd")]
//!
//! ## Usage Example
//!
//! ```rust
//! use stylus::input_handler::{Interceptor, Key, Keystroke, Verdict};
//! use stylus::target::Target;
//! use stylus::Configuration;
//! use web_time::Instant;
//!
//! let target = Target::new("ab");
//! let config = Configuration::default();
//! let mut interceptor = Interceptor::default();
//! let now = Instant::now();
//!
//! let verdict = interceptor.handle(Keystroke::new(Key::Char('x')), &target, &config, now);
//! assert!(matches!(verdict, Verdict::Rejected(_)));
//!
//! let verdict = interceptor.handle(Keystroke::new(Key::Char('a')), &target, &config, now);
//! assert_eq!(verdict, Verdict::Accepted { text: "a".to_string(), offset: 1 });
//! ```

use web_time::Instant;

use crate::config::Configuration;
use crate::metrics;
use crate::target::Target;
use crate::timer::{Generation, Timer};

/// A key on the keyboard, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Insert,
    Escape,
    Function(u8),
    Other,
}

/// Modifier keys held during a keystroke
///
/// Shift is not tracked. Shifted characters arrive as their own [`Key::Char`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        control: false,
        alt: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.control || self.alt || self.meta
    }
}

/// A raw keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub key: Key,
    pub modifiers: Modifiers,
}

/// How a keystroke is treated before validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Cursor movement. Passed through untouched.
    Navigation,
    /// A control/alt/meta combination. Passed through untouched.
    Command,
    /// Character, Enter, Tab or Backspace. Validated against the target.
    Content,
    /// Everything else. Blocked regardless of the target.
    Forbidden,
}

impl Keystroke {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn classify(&self) -> KeyClass {
        if self.modifiers.any() {
            return KeyClass::Command;
        }

        match self.key {
            Key::Left
            | Key::Right
            | Key::Up
            | Key::Down
            | Key::Home
            | Key::End
            | Key::PageUp
            | Key::PageDown => KeyClass::Navigation,
            Key::Char(_) | Key::Enter | Key::Tab | Key::Backspace => KeyClass::Content,
            Key::Delete | Key::Insert | Key::Escape | Key::Function(_) | Key::Other => {
                KeyClass::Forbidden
            }
        }
    }
}

/// Transient marker for a rejected keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSignal {
    /// Target offset the rejected keystroke was aimed at
    pub at_offset: usize,
    /// When the signal stops being shown
    pub expires_at: Instant,
}

impl ErrorSignal {
    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// The interceptor's state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterceptorState {
    #[default]
    Accepting,
    FlashingError(ErrorSignal),
}

/// The outcome of a keystroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Not validated. The host applies the key as it normally would.
    PassThrough,
    /// Accepted. The host appends `text` to the buffer. `offset` is the new accepted offset.
    Accepted { text: String, offset: usize },
    /// Backspace accepted. The host removes the last `count` characters.
    Deleted { count: usize, offset: usize },
    /// Wrong key. Nothing may reach the buffer.
    Rejected(ErrorSignal),
    /// A key that is never allowed in strict mode. Nothing may reach the buffer.
    Blocked,
    /// The target is complete or there is nothing to delete. Nothing may reach the buffer.
    Ignored,
}

impl Verdict {
    /// Whether the host must suppress the keystroke
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Blocked | Self::Ignored)
    }
}

/// Strict-mode keystroke acceptor
///
/// Tracks the accepted offset into the target. In strict mode the buffer always equals the
/// target up to that offset, so the offset alone describes the learner's progress.
#[derive(Debug, Clone, Default)]
pub struct Interceptor {
    /// Accepted offset into the target
    cursor: usize,
    state: InterceptorState,
    error_timer: Timer,
    generation: Generation,
}

impl Interceptor {
    /// Create an interceptor for a fresh lesson load
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Create an interceptor resuming from existing buffer content
    ///
    /// The accepted offset is derived from the whitespace-insensitive match of the buffer:
    /// it lands just after the last matched character. Returns the interceptor together with
    /// the canonical buffer for that offset, which the host should adopt.
    pub fn resume(target: &Target, buffer: &str, generation: Generation) -> (Self, String) {
        let matched = target.compute_match(buffer).matched_chars;
        let cursor = target.strip_index().offset_after(matched);

        let interceptor = Self {
            cursor,
            ..Self::new(generation)
        };

        (interceptor, target.prefix(cursor))
    }

    /// The accepted offset into the target
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> InterceptorState {
        self.state
    }

    /// True once no non-whitespace character of the target remains to be typed
    ///
    /// A target without any non-whitespace character is never complete.
    pub fn is_completed(&self, target: &Target) -> bool {
        target.is_completable()
            && self.cursor >= target.strip_index().offset_after(target.total_chars())
    }

    /// The current error signal, if one is active at `now`
    pub fn error_signal(&self, now: Instant) -> Option<&ErrorSignal> {
        match &self.state {
            InterceptorState::FlashingError(signal) if signal.is_active(now) => Some(signal),
            _ => None,
        }
    }

    /// Expire the error flash once it is due
    ///
    /// Returns `true` when the state changed back to accepting.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.error_timer.fire(now, self.generation) {
            self.state = InterceptorState::Accepting;
            return true;
        }

        false
    }

    /// Validate a keystroke against the target
    pub fn handle(
        &mut self,
        keystroke: Keystroke,
        target: &Target,
        config: &Configuration,
        now: Instant,
    ) -> Verdict {
        match keystroke.classify() {
            KeyClass::Navigation | KeyClass::Command => return Verdict::PassThrough,
            KeyClass::Forbidden => return Verdict::Blocked,
            KeyClass::Content => {}
        }

        if self.is_completed(target) {
            return Verdict::Ignored;
        }

        if keystroke.key == Key::Backspace {
            return self.delete(config);
        }

        let start = self.cursor;
        let Some(advance) = self.advance_for(keystroke.key, target, config) else {
            return self.reject(config, now);
        };

        self.cursor += advance;
        self.clear_error();

        Verdict::Accepted {
            text: target.chars_from(start)[..advance].iter().collect(),
            offset: self.cursor,
        }
    }

    /// Number of target characters a content key advances over, or `None` when it is wrong
    fn advance_for(&self, key: Key, target: &Target, config: &Configuration) -> Option<usize> {
        let upcoming = target.chars_from(self.cursor);
        let expected = *upcoming.first()?;

        let typed = match key {
            Key::Char(char) => char,
            Key::Enter => '\n',
            Key::Tab if expected == '\t' => '\t',
            Key::Tab => return Self::indentation_skip(upcoming, config),
            _ => return None,
        };

        if typed != expected {
            return None;
        }

        if typed == '\n' {
            // Carry the learner over the next line's indentation
            let indentation = upcoming[1..]
                .iter()
                .take_while(|char| metrics::is_indentation(**char))
                .count();
            return Some(1 + indentation);
        }

        Some(1)
    }

    /// Length of the space run a Tab press skips, when the target is at indentation
    fn indentation_skip(upcoming: &[char], config: &Configuration) -> Option<usize> {
        let spaces = upcoming.iter().take_while(|char| **char == ' ').count();

        (spaces >= config.min_indent_skip).then(|| spaces.min(config.max_indent_skip))
    }

    fn delete(&mut self, config: &Configuration) -> Verdict {
        if !config.allow_backspace {
            return Verdict::Blocked;
        }

        if self.cursor == 0 {
            return Verdict::Ignored;
        }

        self.cursor -= 1;
        self.clear_error();

        Verdict::Deleted {
            count: 1,
            offset: self.cursor,
        }
    }

    fn reject(&mut self, config: &Configuration, now: Instant) -> Verdict {
        let signal = ErrorSignal {
            at_offset: self.cursor,
            expires_at: now + config.error_flash,
        };

        tracing::trace!(offset = self.cursor, "keystroke rejected");

        // A new rejection replaces the pending expiry
        self.state = InterceptorState::FlashingError(signal);
        self.error_timer.schedule(self.generation, signal.expires_at);

        Verdict::Rejected(signal)
    }

    fn clear_error(&mut self) {
        self.state = InterceptorState::Accepting;
        self.error_timer.cancel();
    }
}
