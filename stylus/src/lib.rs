//! # Stylus - Keystroke Validation for Code-Typing Lessons
//!
//! Stylus drives a learner toward reproducing a fixed *target* snippet of source code.
//! On every edit it measures how much of the target has been reproduced, plans the
//! confirmed / pending / error regions a text surface should paint, and reports progress
//! and completion to the host application.
//!
//! Two configurations share the same matching math:
//!
//! - **Lenient**: the host owns the buffer and feeds full-text snapshots. Nothing is blocked,
//!   the engine only measures.
//! - **Strict**: every keystroke goes through the [`Interceptor`](input_handler::Interceptor),
//!   which rejects anything that is not the expected next character of the target.
//!
//! ## Quick start
//!
//! ```rust
//! use stylus::session::{LessonSession, Mode};
//! use stylus::config::Configuration;
//! use web_time::Instant;
//!
//! let now = Instant::now();
//! let mut session = LessonSession::new(
//!     "intro",
//!     "default_user",
//!     "x = 1",
//!     "",
//!     Mode::Lenient,
//!     Configuration::default(),
//! );
//!
//! let update = session.set_text("x=1", now);
//! assert!(update.state.completed);
//! ```
//!
//! The engine never reads the clock itself. Every time-dependent call takes the current
//! [`Instant`](web_time::Instant), which keeps the whole engine deterministic under test.

pub mod config;
pub mod decoration;
pub mod input_handler;
pub mod matching;
pub mod metrics;
pub mod progress;
pub mod session;
pub mod target;
pub mod timer;

pub use config::Configuration;
pub use decoration::{Annotation, Region, RegionKind};
pub use input_handler::{ErrorSignal, Key, Keystroke, Modifiers, Verdict};
pub use matching::MatchState;
pub use progress::{Payload, PersistMode, ProgressEvent, ProgressSink, SaveOutcome};
pub use session::{LessonSession, Mode};
pub use target::Target;
