use std::io::stdout;
use std::time::Duration;

use crossterm::cursor::SetCursorStyle;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use ratatui::{Frame, style::Stylize, text::ToLine, widgets::Padding};

use crate::config::Config;
use crate::page;
use crate::utils::ROUNDED_BLOCK;

/// How long to wait for terminal input before driving the session timers
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

const NO_LESSONS_ERROR: &str = r"No lessons found.
Add lesson files (*.toml) to the lessons directory, or point to one with `--lessons <path>`.";

/// An app message
pub enum Message {
    /// Show a specific page
    Show(page::Page),
    /// Reset to the main menu
    Reset,
    /// Quit the application
    Quit,
}

/// The app itself
pub struct App {
    page: page::Page,
    config: Config,
}

impl App {
    /// Creates a new `App`, optionally opening a lesson right away
    pub fn new(config: Config, lesson_id: Option<&str>) -> Self {
        let page = if config.catalog.is_empty() {
            page::Error::new(NO_LESSONS_ERROR).into()
        } else if let Some(id) = lesson_id {
            match config.catalog.find(id) {
                Some(lesson) => {
                    page::Session::new(&config, lesson.clone(), config.settings.engine.mode).into()
                }
                None => page::Error::new(format!("No lesson with id '{id}'")).into(),
            }
        } else {
            page::Menu::new(&config).into()
        };
        Self { page, config }
    }

    /// Runs the app
    pub fn run(&mut self) -> std::io::Result<()> {
        let mut terminal = ratatui::init();

        execute!(stdout(), SetCursorStyle::SteadyBar)?;

        loop {
            let event = event::poll(POLL_TIMEOUT)?
                .then(event::read)
                .transpose()?;
            if let Some(message) = self.handle_events(event) {
                self.page.close();
                match message {
                    Message::Show(page) => self.page = page,
                    Message::Reset => self.reset(),
                    Message::Quit => break,
                }
            }
            terminal.draw(|frame| self.draw(frame))?;
        }

        execute!(stdout(), SetCursorStyle::DefaultUserShape)?;
        ratatui::restore();

        Ok(())
    }

    /// Return to the menu, keeping the current lesson selected
    fn reset(&mut self) {
        let menu = page::Menu::new(&self.config);
        self.page = match &self.page {
            page::Page::Session(session) => menu.with_selected(&self.config, session.lesson_id()),
            _ => menu,
        }
        .into();
    }

    /// Draws the next frame
    fn draw(&mut self, frame: &mut Frame) {
        let mut block = ROUNDED_BLOCK
            .padding(Padding::new(1, 1, 0, 0))
            .title_top("CODEFORGE".to_line().bold().centered())
            .title_top("<ESC> menu <CTRL-Q> exit".to_line().right_aligned());

        if let Some(top_msg) = self.page.render_top(&self.config) {
            block = block.title_top(top_msg);
        }

        let area = frame.area();
        let content = block.inner(area);

        frame.render_widget(block, area);

        self.page.render(frame, content, &self.config);
    }

    /// Global event handler
    fn handle_events(&mut self, event_opt: Option<Event>) -> Option<Message> {
        event_opt
            .and_then(|event| {
                self.page.handle_events(&event, &self.config).or_else(|| {
                    match event {
                        Event::Key(key) => self.handle_key_event(key),
                        _ => None, // Reserved for future event handling
                    }
                })
            })
            .or_else(|| self.page.poll(&self.config))
    }

    /// Global key events
    const fn handle_key_event(&self, key: KeyEvent) -> Option<Message> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Esc, KeyModifiers::NONE) => Some(Message::Reset),
            _ => None,
        }
    }
}
