//! App state and main loop: input handling, applying poll results, and drawing.

use std::{io, sync::Arc, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fleettop::api::ApiClient;
use fleettop::clock::SystemClock;
use fleettop::config::Settings;
use fleettop::fleet::FleetView;
use fleettop::poller::{self, PollMessage, PollerHandle};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::info;

use crate::ui::cards::draw_cards;
use crate::ui::detail::{draw_detail, EventTab};
use crate::ui::header::draw_header;
use crate::ui::processes::{process_rows, processes_clamp, processes_handle_key};

pub struct App {
    view: FleetView,
    source_label: String,

    // Quit flag
    should_quit: bool,

    // Cached from the last draw for input handlers
    grid_columns: usize,
    last_procs_area: Option<Rect>,

    pub procs_scroll_offset: usize,
    pub event_tab: EventTab,
    // Availability cursor in days back from today
    pub day_cursor: usize,
    detail_machine: Option<String>,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            view: FleetView::new(settings.window_days),
            source_label: settings.base_url.clone(),
            should_quit: false,
            grid_columns: 1,
            last_procs_area: None,
            procs_scroll_offset: 0,
            event_tab: EventTab::default(),
            day_cursor: 0,
            detail_machine: None,
        }
    }

    pub async fn run(&mut self, settings: &Settings) -> anyhow::Result<()> {
        let client = Arc::new(ApiClient::new(&settings.base_url, settings.timeout)?);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = poller::spawn(client, Arc::new(SystemClock), settings.poll(), tx);
        info!(url = %settings.base_url, interval_ms = settings.interval.as_millis() as u64, "polling started");

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal, &mut rx, &poller).await;

        // Teardown
        drop(poller);
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("polling stopped");

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        rx: &mut mpsc::UnboundedReceiver<PollMessage>,
        poller: &PollerHandle,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if k.kind == KeyEventKind::Press {
                        self.handle_key(k, poller);
                    }
                }
            }
            if self.should_quit {
                break;
            }

            // Apply whatever the poller delivered since the last frame
            while let Ok(msg) = rx.try_recv() {
                self.view.apply(msg);
            }
            self.sync_detail(poller);

            // Draw
            terminal.draw(|f| self.draw(f))?;

            // Tick rate
            sleep(Duration::from_millis(50)).await;
        }

        Ok(())
    }

    fn handle_key(&mut self, k: KeyEvent, poller: &PollerHandle) {
        let ctrl_c = k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c');
        if ctrl_c || matches!(k.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
            self.should_quit = true;
            return;
        }

        if self.view.detail().is_some() {
            match k.code {
                KeyCode::Esc | KeyCode::Backspace => {
                    self.view.close_detail();
                    self.sync_detail(poller);
                }
                KeyCode::Tab => self.event_tab = self.event_tab.toggle(),
                KeyCode::Left | KeyCode::Char('h') => {
                    let max = self.view.window_days().saturating_sub(1) as usize;
                    self.day_cursor = (self.day_cursor + 1).min(max);
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    self.day_cursor = self.day_cursor.saturating_sub(1)
                }
                _ => {
                    let page = self
                        .last_procs_area
                        .map(|a| a.height.saturating_sub(3).max(1) as usize) // borders (2) + header (1)
                        .unwrap_or(1);
                    processes_handle_key(&mut self.procs_scroll_offset, k, page);
                    let total = self
                        .view
                        .detail_server()
                        .map(|s| process_rows(&s.top_processes))
                        .unwrap_or(0);
                    processes_clamp(&mut self.procs_scroll_offset, total, page);
                }
            }
            return;
        }

        let cols = self.grid_columns.max(1) as isize;
        match k.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.view.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.view.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.view.move_selection(-cols),
            KeyCode::Down | KeyCode::Char('j') => self.view.move_selection(cols),
            KeyCode::Home => self.view.move_selection(isize::MIN),
            KeyCode::End => self.view.move_selection(isize::MAX),
            KeyCode::Enter => {
                if self.view.open_detail().is_some() {
                    self.procs_scroll_offset = 0;
                    self.event_tab = EventTab::default();
                    self.day_cursor = 0;
                    self.sync_detail(poller);
                }
            }
            _ => {}
        }
    }

    // Keep the poller's detail target in line with the pane (it can also
    // close when its server leaves the fleet).
    fn sync_detail(&mut self, poller: &PollerHandle) {
        let open = self.view.detail().map(|d| d.machine.clone());
        if open != self.detail_machine {
            poller.select(open.clone());
            self.detail_machine = open;
        }
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();

        // Root rows: header, fleet grid
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(3)])
            .split(area);

        draw_header(f, rows[0], &self.view, &self.source_label);
        self.grid_columns = draw_cards(f, rows[1], &self.view);
        self.last_procs_area = draw_detail(
            f,
            rows[1],
            &self.view,
            self.procs_scroll_offset,
            self.event_tab,
            self.day_cursor,
        );
    }
}
