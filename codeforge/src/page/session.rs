use crossterm::event::{Event, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Gauge, Padding, Paragraph, Wrap},
};
use stylus::{
    LessonSession, Mode, ProgressEvent, RegionKind, SaveOutcome,
    metrics::{LineTable, Position}, session::Update,
};
use web_time::Instant;

use super::Message;
use crate::{
    config::{Config, EditMode, LessonConfig},
    editor::{Edit, EditorBuffer},
    store::ProgressStore,
    utils::{KeyEventHelper, ROUNDED_BLOCK, fade, to_keystroke},
};

/// Width of the line-number gutter, separator included
const GUTTER_WIDTH: u16 = 4;

/// Page: Lesson session
#[derive(Debug)]
pub struct Session {
    lesson: LessonConfig,
    engine: LessonSession,
    /// Free-form editor used in lenient mode
    editor: EditorBuffer,
    store: ProgressStore,
    /// Last notable thing that happened, shown above the progress bar
    status: Option<Status>,
}

#[derive(Debug)]
enum Status {
    Completed,
    SaveFailed(String),
}

impl Session {
    /// Open a lesson, resuming from the learner's saved code when there is any
    pub fn new(config: &Config, lesson: LessonConfig, mode: EditMode) -> Self {
        let store = ProgressStore::new(config.progress_dir());
        let user_id = &config.settings.progress.user_id;
        let starting_code = starting_code(&store, &lesson, user_id);

        let engine = LessonSession::new(
            &lesson.meta.id,
            user_id,
            &lesson.target_code,
            &starting_code,
            mode.into(),
            config.settings.engine.to_configuration(),
        )
        .with_annotations(annotations_for(config, &lesson));

        let editor = EditorBuffer::new(engine.buffer());

        Self {
            lesson,
            engine,
            editor,
            store,
            status: None,
        }
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson.meta.id
    }

    /// Perform every pending save
    pub fn close(&mut self) {
        let outcomes = self.engine.flush(&mut self.store);
        self.record_saves(outcomes);
    }

    /// Move on to the next lesson of the catalog within the same page
    fn next_lesson(&mut self, config: &Config) -> Option<Message> {
        let Some(next) = config.catalog.next_after(&self.lesson.meta.id).cloned() else {
            return Some(Message::Reset);
        };

        let starting_code = starting_code(&self.store, &next, self.engine.user_id());
        let outcomes = self.engine.load_lesson(
            &next.meta.id,
            &next.target_code,
            &starting_code,
            &mut self.store,
        );
        self.status = None;
        self.record_saves(outcomes);

        self.engine.set_annotations(annotations_for(config, &next));
        self.editor = EditorBuffer::new(self.engine.buffer());
        self.lesson = next;

        None
    }

    fn toggle_mode(&mut self) {
        let mode = match self.engine.mode() {
            Mode::Strict => Mode::Lenient,
            Mode::Lenient => Mode::Strict,
        };
        if let Some(update) = self.engine.set_mode(mode, Instant::now()) {
            self.record_update(&update);
        }
        self.editor = EditorBuffer::new(self.engine.buffer());
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        let keystroke = to_keystroke(key);
        let now = Instant::now();

        match self.engine.mode() {
            Mode::Strict => {
                let outcome = self.engine.handle_key(keystroke, now);
                if let Some(update) = outcome.update {
                    self.editor = EditorBuffer::new(self.engine.buffer());
                    self.record_update(&update);
                }
            }
            Mode::Lenient => {
                if keystroke.modifiers.any() {
                    return;
                }
                if self.editor.apply(&keystroke.key) == Edit::Changed {
                    let update = self.engine.set_text(&self.editor.text(), now);
                    self.record_update(&update);
                }
            }
        }
    }

    fn record_update(&mut self, update: &Update) {
        if update.events.contains(&ProgressEvent::Completed) {
            tracing::info!(lesson = %self.lesson.meta.id, "lesson completed");
            self.status = Some(Status::Completed);
        }
    }

    fn record_saves(&mut self, outcomes: Vec<SaveOutcome>) {
        for outcome in outcomes {
            if let SaveOutcome::Failed(message) = outcome {
                self.status = Some(Status::SaveFailed(message));
            }
        }
    }
}

/// The saved code of the learner, or the lesson's starting code
fn starting_code(store: &ProgressStore, lesson: &LessonConfig, user_id: &str) -> String {
    match store.load(&lesson.meta.id, user_id) {
        Ok(record) => record.and_then(|record| record.code),
        Err(error) => {
            tracing::warn!(%error, lesson = %lesson.meta.id, "failed to load saved progress");
            None
        }
    }
    .unwrap_or_else(|| lesson.starting_code.clone())
}

fn annotations_for(config: &Config, lesson: &LessonConfig) -> Vec<stylus::Annotation> {
    if config.settings.show_annotations {
        lesson.annotations()
    } else {
        Vec::new()
    }
}

// Rendering logic
impl Session {
    pub fn render(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let [panes, status, progress] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);
        let [instructions, code] =
            Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
                .areas(panes);
        let [target, editor] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(code);

        self.render_instructions(frame, instructions);
        self.render_target(frame, target, config);
        self.render_editor(frame, editor, config);
        self.render_status(frame, status, config);
        self.render_progress(frame, progress, config);
    }

    pub fn render_top(&self, _config: &Config) -> Option<Line<'_>> {
        Some(Line::raw(format!(
            "{} [{}] <CTRL-T> mode <CTRL-N> next",
            self.lesson.meta.title,
            EditMode::from(self.engine.mode())
        )))
    }

    pub fn poll(&mut self, _config: &Config) -> Option<Message> {
        let tick = self.engine.tick(Instant::now(), &mut self.store);
        self.record_saves(tick.saves);
        None
    }

    pub fn handle_events(&mut self, event: &Event, config: &Config) -> Option<Message> {
        let Event::Key(key) = event else {
            return None;
        };

        if !key.is_press() || key.code == crossterm::event::KeyCode::Esc {
            return None;
        }

        if key.is_ctrl_press_char('t') {
            self.toggle_mode();
        } else if key.is_ctrl_press_char('n') {
            return self.next_lesson(config);
        } else if !key.is_ctrl_press_char('q') {
            self.handle_key(key);
        }

        None
    }

    fn render_instructions(&self, frame: &mut Frame, area: Rect) {
        let block = ROUNDED_BLOCK
            .title(self.lesson.meta.category.as_str())
            .padding(Padding::horizontal(1));
        let paragraph = Paragraph::new(self.lesson.instructions.as_str())
            .wrap(Wrap { trim: false })
            .block(block);

        frame.render_widget(paragraph, area);
    }

    fn render_target(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let theme = &config.settings.theme;
        let ghost = fade(theme.fg(), theme.bg(), config.settings.ghost_opacity);
        let regions = self.engine.regions(Instant::now());

        let style_at = |offset: usize| {
            let mut style = Style::new().fg(ghost);
            for region in regions.iter().filter(|region| region.contains(offset)) {
                style = match region.kind {
                    RegionKind::Confirmed => style.fg(theme.text.success).bold(),
                    RegionKind::Pending => style.fg(ghost),
                    RegionKind::Error => style.bg(theme.text.error),
                };
            }
            style
        };

        let lines = paint_lines(self.engine.target().as_str(), style_at);
        let title = match &self.lesson.meta.language {
            Some(language) => format!("Target ({language})"),
            None => "Target".to_string(),
        };
        let paragraph = Paragraph::new(lines).block(ROUNDED_BLOCK.title(title));

        frame.render_widget(paragraph, area);
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let theme = &config.settings.theme;
        let block = ROUNDED_BLOCK.title("Your code");
        let inner = block.inner(area);

        let buffer = self.engine.buffer();
        let cursor = match self.engine.mode() {
            Mode::Lenient => self.editor.position(),
            Mode::Strict => LineTable::new(buffer).position(buffer.chars().count()),
        };

        let mut lines: Vec<Line> = buffer
            .split('\n')
            .enumerate()
            .map(|(index, line)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>3} ", index + 1),
                        Style::new().fg(theme.editor.gutter),
                    ),
                    Span::raw(line.replace('\t', " ")),
                ])
            })
            .collect();

        for annotation in self.engine.visible_annotations() {
            if let Some(line) = lines.get_mut(annotation.line - 1) {
                line.push_span(Span::styled(
                    format!("  // {}", annotation.text),
                    Style::new().italic().fg(theme.editor.annotation),
                ));
            }
        }

        let (scroll, cell) = cursor_cell(inner, cursor);
        let paragraph = Paragraph::new(lines).scroll((scroll, 0)).block(block);
        frame.render_widget(paragraph, area);

        frame.set_cursor_position(cell);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let text_theme = &config.settings.theme.text;
        let line = match &self.status {
            Some(Status::Completed) => Line::styled(
                "Lesson complete! <CTRL-N> for the next lesson",
                Style::new().bold().fg(text_theme.success),
            ),
            Some(Status::SaveFailed(message)) => Line::styled(
                format!("Progress not saved: {message}"),
                Style::new().fg(text_theme.warning),
            ),
            None => Line::default(),
        };

        frame.render_widget(Paragraph::new(line).block(Block::new()), area);
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let state = self.engine.match_state();
        let gauge = Gauge::default()
            .gauge_style(Style::new().fg(config.settings.theme.editor.progress))
            .ratio((state.percentage() / 100.0).clamp(0.0, 1.0))
            .label(format!("{}/{}", state.matched_chars, state.total_chars));

        frame.render_widget(gauge, area);
    }
}

/// Split a text into lines, styling every character by its offset
fn paint_lines<'a>(text: &str, style_at: impl Fn(usize) -> Style) -> Vec<Line<'a>> {
    let mut lines = vec![Line::default()];

    for (offset, char) in text.chars().enumerate() {
        if char == '\n' {
            // Keep a marked newline visible, e.g. when an error covers an empty line
            if let Some(line) = lines.last_mut()
                && line.spans.is_empty()
            {
                line.push_span(Span::styled(" ", style_at(offset)));
            }
            lines.push(Line::default());
            continue;
        }

        let shown = if char == '\t' { ' ' } else { char };
        if let Some(line) = lines.last_mut() {
            line.push_span(Span::styled(shown.to_string(), style_at(offset)));
        }
    }

    lines
}

/// Scroll that keeps the cursor line in view, and the screen cell of the cursor
///
/// The cell is clamped to `area`.
fn cursor_cell(area: Rect, cursor: Position) -> (u16, (u16, u16)) {
    let line = u16::try_from(cursor.line).unwrap_or(u16::MAX);
    let column = u16::try_from(cursor.column).unwrap_or(u16::MAX);
    let scroll = line.saturating_sub(area.height);

    let last_column = area.right().saturating_sub(1);
    let last_row = area.bottom().saturating_sub(1);
    let x = area
        .x
        .saturating_add(GUTTER_WIDTH)
        .saturating_add(column.saturating_sub(1))
        .min(last_column);
    let y = area
        .y
        .saturating_add(line.saturating_sub(1).saturating_sub(scroll))
        .min(last_row);

    (scroll, (x, y))
}
