use std::time::Duration;

use anyhow::Context;
use crossterm::event::KeyEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::{ChannelClient, ChannelEvent};
use crate::config::{Action, Config, Palette};
use crate::event::{channel_forwarder, start_event_loop, AppEvent};
use crate::prefs::PreferenceStore;
use crate::tui::Tui;
use crate::ui;
use crate::view_model::TelemetryViewModel;

/// Half-period of the connection indicator pulse.
const PULSE_PERIOD: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Help,
}

/// The dashboard screen: owns the view model (and through it the channel)
/// plus everything the renderer needs besides telemetry.
pub struct Dashboard {
    pub view: TelemetryViewModel,
    pub config: Config,
    pub mode: Mode,
    pub should_quit: bool,
    ticks: u64,
}

impl Dashboard {
    pub fn new(config: Config, store: PreferenceStore) -> Self {
        let channel = ChannelClient::new(config.connection.channel_options());
        let view =
            TelemetryViewModel::initialize(channel, store, config.display.cpu_fallback_max_ghz);
        Self {
            view,
            config,
            mode: Mode::Normal,
            should_quit: false,
            ticks: 0,
        }
    }

    pub fn palette(&self) -> &Palette {
        self.config.theme.palette(self.view.dark())
    }

    /// Whether the status dot is lit on this tick.
    pub fn pulse_on(&self) -> bool {
        let tick_ms = self.config.display.tick_rate_ms.max(1);
        let ticks_per_phase = (PULSE_PERIOD.as_millis() as u64 / tick_ms).max(1);
        (self.ticks / ticks_per_phase) % 2 == 0
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(..) => {}
            AppEvent::Tick => self.ticks = self.ticks.wrapping_add(1),
            AppEvent::Channel(event) => self.handle_channel(event),
        }
    }

    fn handle_channel(&mut self, event: ChannelEvent) {
        match &event {
            ChannelEvent::Connect => info!("push channel connected"),
            ChannelEvent::Disconnect => info!("push channel disconnected"),
            ChannelEvent::StatusUpdate(s) => debug!(sequence = ?s.sequence, "status update"),
        }
        self.view.apply(event);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = self.config.keys.lookup(&key).cloned() else {
            return;
        };
        match (self.mode, action) {
            (_, Action::Quit) => self.should_quit = true,
            (Mode::Help, Action::Help | Action::CloseHelp) => self.mode = Mode::Normal,
            (Mode::Normal, Action::Help) => self.mode = Mode::Help,
            (_, Action::ToggleTheme) => {
                if let Err(e) = self.view.toggle_theme() {
                    warn!(error = %e, "failed to persist theme");
                }
            }
            (Mode::Normal, Action::CloseHelp) => {}
        }
    }
}

pub async fn run(config: Config, store: PreferenceStore) -> anyhow::Result<()> {
    let tick_rate = Duration::from_millis(config.display.tick_rate_ms);
    let mut dashboard = Dashboard::new(config, store);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    dashboard
        .view
        .mount(channel_forwarder(event_tx.clone()))
        .context("starting push channel")?;

    let mut tui = match Tui::new().and_then(|mut t| t.enter().map(|_| t)) {
        Ok(tui) => tui,
        Err(e) => {
            dashboard.view.teardown().await;
            return Err(e);
        }
    };
    start_event_loop(event_tx, tick_rate);

    let result = event_loop(&mut dashboard, &mut tui, &mut event_rx).await;

    if dashboard.view.is_mounted() {
        dashboard.view.teardown().await;
    }
    tui.exit();
    result
}

async fn event_loop(
    dashboard: &mut Dashboard,
    tui: &mut Tui,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> anyhow::Result<()> {
    loop {
        tui.draw(|frame| ui::render(dashboard, frame))?;

        let Some(event) = event_rx.recv().await else {
            break;
        };
        dashboard.handle_event(event);

        // Drain whatever queued up while drawing
        while let Ok(event) = event_rx.try_recv() {
            dashboard.handle_event(event);
        }

        if dashboard.should_quit {
            break;
        }
    }
    Ok(())
}
