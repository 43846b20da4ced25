// Main TUI application using ratatui
// Handles the terminal interface and user input, and hands every
// playback decision to the TrackOrchestrator

use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::Config;
use crate::notify::Notice;
use crate::player::{PlaybackStatus, TrackOrchestrator};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum AppMode {
    Normal,
    Searching,
}

pub struct MusicPlayerApp {
    engine: TrackOrchestrator,
    notices: mpsc::UnboundedReceiver<Notice>,
    selected_result: usize,
    seen_generation: u64,
    search_query: String,
    mode: AppMode,
    should_quit: bool,
    status_message: String,
    seek_step: f64,
    volume_step: f32,
}

impl MusicPlayerApp {
    pub fn new(
        engine: TrackOrchestrator,
        notices: mpsc::UnboundedReceiver<Notice>,
        config: &Config,
    ) -> Self {
        let seen_generation = engine.queue().generation();

        MusicPlayerApp {
            engine,
            notices,
            selected_result: 0,
            seen_generation,
            search_query: String::new(),
            mode: AppMode::Normal,
            should_quit: false,
            status_message: String::new(),
            seek_step: config.seek_step_secs,
            volume_step: config.volume_step,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        // Restore the terminal even if the loop failed
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        loop {
            // Let the audio output report progress / end of track,
            // then apply downloads, search results and media events
            self.engine.tick();
            self.engine.pump();
            self.drain_notices();
            self.sync_with_queue();

            terminal.draw(|f| self.draw_ui(f))?;

            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code);
                    }
                }
            }

            if self.should_quit {
                break;
            }

            // Give spawned downloads/searches a chance on this thread too
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    fn drain_notices(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            self.status_message = notice.to_string();
        }
    }

    // New search results replace the list: move the selection back to the top
    fn sync_with_queue(&mut self) {
        let generation = self.engine.queue().generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.selected_result = 0;
            let found = self.engine.queue().len();
            if found > 0 {
                self.status_message = format!("Found {} results", found);
            }
        }
    }

    fn draw_ui(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(6),
            ])
            .split(frame.size());

        // Header
        let title = match self.mode {
            AppMode::Searching => format!("Search: {}_", self.search_query),
            AppMode::Normal if self.engine.is_searching() => "Searching... please wait".to_string(),
            AppMode::Normal if !self.status_message.is_empty() => self.status_message.clone(),
            AppMode::Normal => {
                "Controls: [/]Search [Enter]Play [n]Next [p]Prev [Space]Play/Pause [j/k]Navigate [←/→]Seek [↑/↓]Volume [m]Mute [q]Quit".to_string()
            }
        };
        let header = Paragraph::new(title)
            .block(Block::default().borders(Borders::ALL).title("Music Player"));
        frame.render_widget(header, chunks[0]);

        // Search results (this is also the play queue)
        let queue = self.engine.queue();
        let playing_index = queue.cursor();
        let pending_id = self
            .engine
            .pending_selection()
            .map(|entry| entry.identifier.as_str());

        let results: Vec<ListItem> = queue
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let marker = if Some(i) == playing_index {
                    "▶ "
                } else if Some(entry.identifier.as_str()) == pending_id {
                    "… "
                } else {
                    "  "
                };
                let content = format!("{}{}", marker, entry.title);
                let style = if i == self.selected_result {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if Some(i) == playing_index {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(content).style(style)
            })
            .collect();

        let results_list = List::new(results).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Results ({})", queue.len())),
        );
        frame.render_widget(results_list, chunks[1]);

        // Player info
        let playback = self.engine.playback();
        let now_playing = match (self.engine.now_playing(), self.engine.pending_selection()) {
            (_, Some(pending)) => format!("Loading: {}", pending.title),
            (Some(entry), None) => format!("Now Playing: {}", entry.title),
            (None, None) => "No track playing".to_string(),
        };

        let state_str = match playback.status() {
            PlaybackStatus::Playing => "▶ Playing",
            PlaybackStatus::Paused => "⏸ Paused",
            PlaybackStatus::Loading => "… Loading",
            PlaybackStatus::Empty => "⏹ Stopped",
        };

        let time_str = match playback.duration() {
            Some(duration) => format!(
                "{} / {}",
                Self::format_time(playback.position()),
                Self::format_time(duration)
            ),
            None => Self::format_time(playback.position()),
        };

        let volume_str = if playback.is_muted() {
            "muted".to_string()
        } else {
            format!("{}%", (playback.volume() * 100.0).round() as u32)
        };

        let player_info = format!(
            "{}\nState: {} | Volume: {} | Time: {}\n{} Previous   {} Next",
            now_playing,
            state_str,
            volume_str,
            time_str,
            if queue.has_previous() { "[p]" } else { "[ ]" },
            if queue.has_next() { "[n]" } else { "[ ]" },
        );

        let player_widget = Paragraph::new(player_info)
            .block(Block::default().borders(Borders::ALL).title("Player"));
        frame.render_widget(player_widget, chunks[2]);
    }

    fn handle_input(&mut self, key: KeyCode) {
        // Clear status message on any key press (except when searching)
        if !matches!(self.mode, AppMode::Searching) {
            self.status_message.clear();
        }

        match self.mode {
            AppMode::Searching => match key {
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                }
                KeyCode::Backspace => {
                    self.search_query.pop();
                }
                KeyCode::Enter => {
                    let query = self.search_query.clone();
                    if !query.trim().is_empty() {
                        self.engine.search(&query);
                    }
                    self.mode = AppMode::Normal;
                    self.search_query.clear();
                }
                KeyCode::Esc => {
                    self.mode = AppMode::Normal;
                    self.search_query.clear();
                }
                _ => {}
            },
            AppMode::Normal => match key {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('/') => self.mode = AppMode::Searching,
                KeyCode::Char(' ') => self.engine.toggle_play_pause(),
                KeyCode::Char('n') => {
                    if self.engine.advance_next().is_none() {
                        self.status_message = "End of the list".to_string();
                    }
                }
                KeyCode::Char('p') => {
                    if self.engine.advance_previous().is_none() {
                        self.status_message = "Start of the list".to_string();
                    }
                }
                KeyCode::Char('m') => self.engine.toggle_mute(),
                KeyCode::Up => self.volume_up(),
                KeyCode::Down => self.volume_down(),
                KeyCode::Right => self.engine.seek_relative(self.seek_step),
                KeyCode::Left => self.engine.seek_relative(-self.seek_step),
                KeyCode::Char('j') => self.next_search_result(),
                KeyCode::Char('k') => self.prev_search_result(),
                KeyCode::Enter => self.play_selected(),
                _ => {}
            },
        }
    }

    fn play_selected(&mut self) {
        match self.engine.select_index(self.selected_result) {
            Ok(selection) => debug!(selection, "selected from results"),
            Err(e) => {
                debug!(error = %e, "nothing to select");
                self.status_message = "Nothing to play, search first with '/'".to_string();
            }
        }
    }

    fn volume_up(&mut self) {
        let current = self.engine.playback().volume();
        self.engine.set_volume(current + self.volume_step);
    }

    fn volume_down(&mut self) {
        let current = self.engine.playback().volume();
        self.engine.set_volume(current - self.volume_step);
    }

    fn next_search_result(&mut self) {
        let len = self.engine.queue().len();
        if len > 0 {
            self.selected_result = (self.selected_result + 1) % len;
        }
    }

    fn prev_search_result(&mut self) {
        let len = self.engine.queue().len();
        if len > 0 {
            if self.selected_result == 0 {
                self.selected_result = len - 1;
            } else {
                self.selected_result -= 1;
            }
        }
    }

    fn format_time(seconds: f64) -> String {
        let mins = (seconds / 60.0) as u64;
        let secs = (seconds % 60.0) as u64;
        format!("{:02}:{:02}", mins, secs)
    }
}
