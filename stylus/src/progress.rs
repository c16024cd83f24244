//! # Progress Module - Progress Events and Debounced Persistence
//!
//! Turns every [`MatchState`] into progress events for the host and keeps the persistence
//! collaborator up to date without flooding it:
//!
//! - every recomputation emits [`ProgressEvent::Advanced`],
//! - the first completion per lesson load emits [`ProgressEvent::Completed`] once,
//! - the latest snapshot is saved once the edits have been quiet for the debounce period
//!   (in completion-flag mode only a reached completion is ever saved),
//! - persistence failures are logged and reported, never propagated into editing.
//!
//! The reporter owns no clock and no thread: [`ProgressReporter::poll`] is called from the
//! host's event loop and performs any save that has become due.

use web_time::{Duration, Instant};

use crate::matching::MatchState;
use crate::timer::{Generation, Timer};

/// What the debounced save sends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistMode {
    /// The raw buffer text
    #[default]
    Snapshot,
    /// Only whether the lesson has been completed
    CompletionFlag,
}

/// The content of a single save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Buffer(String),
    Completed(bool),
}

/// The persistence collaborator
///
/// Implementations are expected to be idempotent per `(lesson_id, user_id)`: the same
/// payload may be sent more than once.
pub trait ProgressSink {
    type Error: std::error::Error;

    fn save_progress(
        &mut self,
        lesson_id: &str,
        user_id: &str,
        payload: Payload,
    ) -> Result<(), Self::Error>;
}

/// Notifications for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Emitted on every recomputation
    Advanced {
        matched_chars: usize,
        total_chars: usize,
    },
    /// Emitted once per lesson load, on first completion
    Completed,
}

/// The result of a save attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The save failed. Carries the error message for display.
    Failed(String),
}

/// Progress tracking for one lesson load
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    lesson_id: String,
    user_id: String,
    generation: Generation,
    debounce: Duration,
    persist: PersistMode,
    /// Debounce deadline for `latest`
    save_timer: Timer,
    /// Most recent payload waiting for the debounce to elapse
    latest: Option<Payload>,
    /// Completion flag waiting to be recorded
    completion_pending: bool,
    has_notified_completion: bool,
}

impl ProgressReporter {
    pub fn new(
        lesson_id: impl Into<String>,
        user_id: impl Into<String>,
        generation: Generation,
        debounce: Duration,
        persist: PersistMode,
    ) -> Self {
        Self {
            lesson_id: lesson_id.into(),
            user_id: user_id.into(),
            generation,
            debounce,
            persist,
            save_timer: Timer::new(),
            latest: None,
            completion_pending: false,
            has_notified_completion: false,
        }
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Whether the completion notification has fired for this lesson load
    pub fn has_notified_completion(&self) -> bool {
        self.has_notified_completion
    }

    /// Whether a save is waiting to be performed
    pub fn has_pending_save(&self) -> bool {
        self.latest.is_some() || self.completion_pending
    }

    /// Record a recomputed match state together with the buffer it was computed from
    ///
    /// Restarts the debounce period.
    pub fn report(&mut self, state: MatchState, buffer: &str, now: Instant) -> Vec<ProgressEvent> {
        let mut events = vec![ProgressEvent::Advanced {
            matched_chars: state.matched_chars,
            total_chars: state.total_chars,
        }];

        if state.completed && !self.has_notified_completion {
            tracing::debug!(lesson = %self.lesson_id, "lesson completed");
            self.has_notified_completion = true;
            self.completion_pending = true;
            events.push(ProgressEvent::Completed);
        }

        // An unfinished revisit must not overwrite an earlier completion
        self.latest = match self.persist {
            PersistMode::Snapshot => Some(Payload::Buffer(buffer.to_string())),
            PersistMode::CompletionFlag => self
                .has_notified_completion
                .then_some(Payload::Completed(true)),
        };
        if self.latest.is_some() {
            self.save_timer
                .schedule(self.generation, now + self.debounce);
        }

        events
    }

    /// Perform the saves that are due at `now`
    ///
    /// A newly reached completion is recorded right away. The buffer snapshot waits for the
    /// debounce period.
    pub fn poll<S: ProgressSink>(&mut self, now: Instant, sink: &mut S) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::new();

        if self.completion_pending {
            self.completion_pending = false;
            outcomes.push(self.save(sink, Payload::Completed(true)));
        }

        if self.save_timer.fire(now, self.generation)
            && let Some(payload) = self.latest.take()
        {
            outcomes.push(self.save(sink, payload));
        }

        outcomes
    }

    /// Perform every pending save immediately
    pub fn flush<S: ProgressSink>(&mut self, sink: &mut S) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::new();

        if self.completion_pending {
            self.completion_pending = false;
            outcomes.push(self.save(sink, Payload::Completed(true)));
        }

        self.save_timer.cancel();
        if let Some(payload) = self.latest.take() {
            outcomes.push(self.save(sink, payload));
        }

        outcomes
    }

    fn save<S: ProgressSink>(&self, sink: &mut S, payload: Payload) -> SaveOutcome {
        match sink.save_progress(&self.lesson_id, &self.user_id, payload) {
            Ok(()) => {
                tracing::trace!(lesson = %self.lesson_id, "progress saved");
                SaveOutcome::Saved
            }
            Err(error) => {
                tracing::warn!(lesson = %self.lesson_id, %error, "failed to save progress");
                SaveOutcome::Failed(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        saves: Vec<(String, String, Payload)>,
    }

    #[derive(Debug)]
    struct Offline;

    impl fmt::Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "progress service unreachable")
        }
    }

    impl std::error::Error for Offline {}

    impl ProgressSink for RecordingSink {
        type Error = Offline;

        fn save_progress(
            &mut self,
            lesson_id: &str,
            user_id: &str,
            payload: Payload,
        ) -> Result<(), Self::Error> {
            self.saves
                .push((lesson_id.to_string(), user_id.to_string(), payload));
            Ok(())
        }
    }

    struct FailingSink;

    impl ProgressSink for FailingSink {
        type Error = Offline;

        fn save_progress(&mut self, _: &str, _: &str, _: Payload) -> Result<(), Self::Error> {
            Err(Offline)
        }
    }

    fn reporter(persist: PersistMode) -> ProgressReporter {
        ProgressReporter::new(
            "lesson-1",
            "default_user",
            Generation::default(),
            Duration::from_millis(1000),
            persist,
        )
    }

    #[test]
    fn test_report_emits_progress() {
        let mut reporter = reporter(PersistMode::Snapshot);
        let events = reporter.report(MatchState::new(3, 10), "abc", Instant::now());

        assert_eq!(
            events,
            vec![ProgressEvent::Advanced {
                matched_chars: 3,
                total_chars: 10
            }]
        );
        assert!(reporter.has_pending_save());
    }

    #[test]
    fn test_debounce_coalesces_bursts() {
        let now = Instant::now();
        let mut sink = RecordingSink::default();
        let mut reporter = reporter(PersistMode::Snapshot);

        reporter.report(MatchState::new(1, 3), "a", now);
        reporter.report(MatchState::new(2, 3), "ab", now + Duration::from_millis(600));

        // The second edit restarted the quiet period
        assert!(reporter.poll(now + Duration::from_millis(1000), &mut sink).is_empty());
        assert!(sink.saves.is_empty());

        let outcomes = reporter.poll(now + Duration::from_millis(1600), &mut sink);
        assert_eq!(outcomes, vec![SaveOutcome::Saved]);
        assert_eq!(
            sink.saves,
            vec![(
                "lesson-1".to_string(),
                "default_user".to_string(),
                Payload::Buffer("ab".to_string())
            )]
        );

        // Nothing left to save
        assert!(reporter.poll(now + Duration::from_secs(5), &mut sink).is_empty());
        assert_eq!(sink.saves.len(), 1);
    }

    #[test]
    fn test_completion_fires_once() {
        let now = Instant::now();
        let mut sink = RecordingSink::default();
        let mut reporter = reporter(PersistMode::Snapshot);

        let events = reporter.report(MatchState::new(3, 3), "abc", now);
        assert!(events.contains(&ProgressEvent::Completed));
        assert!(reporter.has_notified_completion());

        let events = reporter.report(MatchState::new(2, 3), "ab", now);
        assert!(!events.contains(&ProgressEvent::Completed));
        let events = reporter.report(MatchState::new(3, 3), "abc", now);
        assert!(!events.contains(&ProgressEvent::Completed));

        // The completion flag is recorded without waiting for the debounce
        reporter.poll(now, &mut sink);
        assert_eq!(sink.saves.len(), 1);
        assert_eq!(sink.saves[0].2, Payload::Completed(true));
    }

    #[test]
    fn test_completion_flag_mode() {
        let now = Instant::now();
        let mut sink = RecordingSink::default();
        let mut reporter = reporter(PersistMode::CompletionFlag);

        // Nothing to record until the lesson is finished
        reporter.report(MatchState::new(1, 3), "a", now);
        assert!(!reporter.has_pending_save());
        assert!(reporter.poll(now + Duration::from_secs(1), &mut sink).is_empty());
        assert!(reporter.flush(&mut sink).is_empty());

        reporter.report(MatchState::new(3, 3), "abc", now);
        reporter.poll(now, &mut sink);
        assert_eq!(sink.saves.len(), 1);
        assert_eq!(sink.saves[0].2, Payload::Completed(true));

        // Later edits keep the flag set
        reporter.report(MatchState::new(2, 3), "ab", now);
        reporter.poll(now + Duration::from_secs(1), &mut sink);
        assert_eq!(sink.saves.len(), 2);
        assert_eq!(sink.saves[1].2, Payload::Completed(true));
    }

    #[test]
    fn test_flush_saves_immediately() {
        let now = Instant::now();
        let mut sink = RecordingSink::default();
        let mut reporter = reporter(PersistMode::Snapshot);

        reporter.report(MatchState::new(1, 3), "a", now);
        let outcomes = reporter.flush(&mut sink);

        assert_eq!(outcomes, vec![SaveOutcome::Saved]);
        assert_eq!(sink.saves[0].2, Payload::Buffer("a".to_string()));
        assert!(!reporter.has_pending_save());
        assert!(reporter.poll(now + Duration::from_secs(2), &mut sink).is_empty());
    }

    #[test]
    fn test_failures_are_swallowed() {
        let now = Instant::now();
        let mut reporter = reporter(PersistMode::Snapshot);

        reporter.report(MatchState::new(1, 3), "a", now);
        let outcomes = reporter.poll(now + Duration::from_secs(1), &mut FailingSink);

        assert_eq!(
            outcomes,
            vec![SaveOutcome::Failed("progress service unreachable".to_string())]
        );
        // Not retried
        assert!(!reporter.has_pending_save());

        // Editing carries on
        let events = reporter.report(MatchState::new(2, 3), "ab", now);
        assert_eq!(events.len(), 1);
    }
}
