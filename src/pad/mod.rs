//! Compile pad — terminal front end: editor, output and log panes.
//!
//! The pad owns its compiler. Every report line goes through an
//! [`InterceptingLogger`]: the interceptor feeds the on-screen log pane and
//! the wrapped [`MemoryLogger`] keeps the session history, which the caller
//! can print once the terminal is restored.

pub mod editor;
pub mod keybindings;
pub mod status;

pub use editor::Editor;
pub use keybindings::{map_key, Action};
pub use status::{CompileStatus, StatusInfo};

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::compiler::Compiler;
use crate::config::Config;
use crate::report::{InterceptingLogger, LogBuffer, LoggerReport, MemoryLogger};

/// Lines of session history kept behind the log pane.
const HISTORY_CAPACITY: usize = 1000;

pub struct Pad {
    pub editor: Editor,
    pub status: StatusInfo,
    /// Postfix form of the last compile.
    pub postfix: String,
    /// Rendered result of the last compile.
    pub result: String,
    pub should_quit: bool,
    log: Rc<RefCell<LogBuffer>>,
    history: MemoryLogger,
    compiler: Compiler,
}

impl Pad {
    pub fn new(source: &str, config: Config) -> Self {
        let log = Rc::new(RefCell::new(LogBuffer::new(config.log_capacity)));
        let history = MemoryLogger::new(Rc::new(RefCell::new(LogBuffer::new(HISTORY_CAPACITY))));

        let pane = Rc::clone(&log);
        let logger = InterceptingLogger::new(
            move |line: &str| pane.borrow_mut().push(line),
            history.clone(),
        );
        let report = Rc::new(LoggerReport::new(logger, config.verbose));

        Self {
            editor: Editor::new(source),
            status: StatusInfo::default(),
            postfix: String::new(),
            result: String::new(),
            should_quit: false,
            log,
            history,
            compiler: Compiler::with_config(report, config),
        }
    }

    /// Lines currently shown in the log pane, oldest first.
    pub fn log_lines(&self) -> Vec<String> {
        self.log.borrow().messages()
    }

    /// Every line logged this session, up to the history capacity.
    pub fn history(&self) -> Vec<String> {
        self.history.messages()
    }

    /// Compile the buffer and refresh the output panes.
    pub fn compile(&mut self) {
        let result = self.compiler.compile(&self.editor.content());
        self.postfix = result.intermediate();
        self.status.compiles += 1;
        match result.execute() {
            Ok(value) => {
                self.result = value.to_string();
                self.status.compile_status = CompileStatus::Ok;
            }
            Err(error) => {
                self.result = crate::compiler::FAILURE_SENTINEL.to_string();
                self.status.compile_status = CompileStatus::Error(error.to_string());
            }
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Compile => self.compile(),
            Action::ClearLog => self.log.borrow_mut().clear(),
            Action::Insert(c) => self.editor.insert_char(c),
            Action::Backspace => self.editor.backspace(),
            Action::Delete => self.editor.delete(),
            Action::Newline => self.editor.newline(),
            Action::Left => self.editor.move_left(),
            Action::Right => self.editor.move_right(),
            Action::Up => self.editor.move_up(),
            Action::Down => self.editor.move_down(),
            Action::Home => self.editor.home(),
            Action::End => self.editor.end(),
        }
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[0]);

        let panes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(3)])
            .split(columns[1]);

        self.draw_editor(frame, columns[0]);
        self.draw_output(frame, panes[0]);
        self.draw_log(frame, panes[1]);
        self.draw_status(frame, chunks[1]);
    }

    fn draw_editor(&mut self, frame: &mut Frame, area: Rect) {
        let inner_height = area.height.saturating_sub(2) as usize;
        self.editor.set_viewport_height(inner_height);
        let scroll_offset = self.editor.scroll_offset();

        let lines: Vec<Line> = self
            .editor
            .lines()
            .iter()
            .enumerate()
            .skip(scroll_offset)
            .take(inner_height)
            .map(|(i, line)| {
                Line::from(vec![
                    Span::styled(format!("{:3} ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::raw(line.as_str()),
                ])
            })
            .collect();

        let block = Block::default().title(" Source ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), area);

        let (row, col) = self.editor.cursor();
        if let Some(position) = cursor_cell(area, row.saturating_sub(scroll_offset), col) {
            frame.set_cursor_position(position);
        }
    }

    fn draw_output(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(Color::DarkGray);
        let lines = vec![
            Line::from(vec![
                Span::styled("postfix ", label),
                Span::raw(self.postfix.as_str()),
            ]),
            Line::from(vec![
                Span::styled("result  ", label),
                Span::raw(self.result.as_str()),
            ]),
        ];
        let block = Block::default().title(" Output ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_log(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" Log ").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let log = self.log.borrow();
        let lines: Vec<Line> = log
            .recent(inner.height as usize)
            .into_iter()
            .map(|entry| {
                let color = match entry.message.get(..2) {
                    Some("E:") => Color::Red,
                    Some("W:") => Color::Yellow,
                    _ => Color::Gray,
                };
                Line::from(Span::styled(entry.message.clone(), Style::default().fg(color)))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let color = match self.status.compile_status {
            CompileStatus::Idle => Color::DarkGray,
            CompileStatus::Ok => Color::Green,
            CompileStatus::Error(_) => Color::Red,
        };
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", self.status.indicator()),
                Style::default().fg(color),
            ),
            Span::raw(self.status.message()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Drive the event loop until the user quits.
    pub fn run(
        &mut self,
        terminal: &mut ratatui::Terminal<impl ratatui::backend::Backend>,
    ) -> io::Result<()> {
        while !self.should_quit {
            terminal
                .draw(|frame| self.draw(frame))
                .map_err(|e| io::Error::other(e.to_string()))?;

            if event::poll(Duration::from_millis(50))? {
                if let CrosstermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Some(action) = map_key(key) {
                            self.handle_action(action);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Screen cell of the editor cursor, or `None` when it falls outside `area`.
fn cursor_cell(area: Rect, row: usize, col: usize) -> Option<(u16, u16)> {
    // border + line number gutter
    let x = area.x.checked_add(5)?.checked_add(u16::try_from(col).ok()?)?;
    let y = area.y.checked_add(1)?.checked_add(u16::try_from(row).ok()?)?;
    let inside = x < area.x.saturating_add(area.width) && y < area.y.saturating_add(area.height);
    inside.then_some((x, y))
}
