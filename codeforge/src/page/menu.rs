use std::collections::HashSet;

use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, List, ListState},
};

use super::{Message, session::Session};
use crate::{
    config::Config,
    store::ProgressStore,
    utils::center,
};

/// A row of the lesson list
#[derive(Debug)]
enum Row {
    Track(String),
    /// Index into the catalog
    Lesson(usize),
}

/// Page: Main menu
#[derive(Debug)]
pub struct Menu {
    rows: Vec<Row>,
    completed: HashSet<String>,
    /// Index into the catalog
    selected: usize,
}

impl Menu {
    /// Creates a new menu
    pub fn new(config: &Config) -> Self {
        let store = ProgressStore::new(config.progress_dir());
        let completed = store
            .completed_lessons(&config.settings.progress.user_id)
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "failed to read completed lessons");
                Vec::new()
            })
            .into_iter()
            .collect();

        let mut rows = Vec::new();
        let mut track: Option<&str> = None;
        for (index, lesson) in config.catalog.iter().enumerate() {
            if track != Some(lesson.meta.track.as_str()) {
                track = Some(lesson.meta.track.as_str());
                rows.push(Row::Track(lesson.meta.track.clone()));
            }
            rows.push(Row::Lesson(index));
        }

        Self {
            rows,
            completed,
            selected: 0,
        }
    }

    /// Start on a specific lesson
    pub fn with_selected(mut self, config: &Config, lesson_id: &str) -> Self {
        if let Some(index) = config.catalog.position(lesson_id) {
            self.selected = index;
        }
        self
    }

    fn selected_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| matches!(row, Row::Lesson(index) if *index == self.selected))
    }
}

// Rendering logic
impl Menu {
    pub fn render(&self, frame: &mut Frame, area: Rect, config: &Config) {
        let area = center(area, Constraint::Percentage(80), Constraint::Percentage(90));
        let theme = &config.settings.theme;

        let items = self.rows.iter().map(|row| match row {
            Row::Track(track) => Line::from(Span::styled(
                track.to_uppercase(),
                Style::new().bold().fg(theme.text.highlight),
            )),
            Row::Lesson(index) => {
                let Some(lesson) = config.catalog.get(*index) else {
                    return Line::default();
                };
                let is_selected = *index == self.selected;
                let selector = if is_selected { "> " } else { "  " };
                let mark = if self.completed.contains(&lesson.meta.id) {
                    Span::styled("✓ ", Style::new().fg(theme.text.success))
                } else {
                    Span::raw("  ")
                };
                let title = format!(
                    "{}.{} {} · {}",
                    lesson.meta.module_number,
                    lesson.meta.lesson_number,
                    lesson.meta.category,
                    lesson.meta.title
                );
                let style = if is_selected {
                    Style::new().fg(theme.text.highlight).reversed()
                } else {
                    Style::new()
                };

                Line::from(vec![Span::raw(selector), mark, Span::styled(title, style)])
            }
        });

        let mut state = ListState::default().with_selected(self.selected_row());
        let list = List::new(items).block(Block::new().title("Select Lesson"));

        frame.render_stateful_widget(list, area, &mut state);
    }

    pub fn render_top(&self, config: &Config) -> Option<Line<'_>> {
        Some(Line::raw(format!(
            "{}/{} completed",
            self.completed.len(),
            config.catalog.len()
        )))
    }

    pub fn handle_events(&mut self, event: &Event, config: &Config) -> Option<Message> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            return self.handle_key(key, config);
        }

        None
    }
}

// Event handlers
impl Menu {
    fn handle_key(&mut self, key: &KeyEvent, config: &Config) -> Option<Message> {
        let len = config.catalog.len();
        if len == 0 {
            return None;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => previous_index(&mut self.selected, len),
            KeyCode::Down | KeyCode::Char('j') => next_index(&mut self.selected, len),
            KeyCode::Enter => {
                let lesson = config.catalog.get(self.selected)?;
                let session = Session::new(config, lesson.clone(), config.settings.engine.mode);
                return Some(Message::Show(session.into()));
            }
            _ => (),
        };

        None
    }
}

const fn previous_index(index: &mut usize, len: usize) {
    *index = if *index == 0 { len - 1 } else { *index - 1 }
}

const fn next_index(index: &mut usize, len: usize) {
    *index = (*index + 1) % len
}
