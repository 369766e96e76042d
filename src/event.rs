use crate::channel::ChannelEvent;
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    Channel(ChannelEvent),
}

pub fn start_event_loop(event_tx: mpsc::UnboundedSender<AppEvent>, tick_rate: Duration) {
    // Crossterm event reader
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        loop {
            match reader.next().await {
                Some(Ok(event)) => {
                    let app_event = match event {
                        // Windows terminals also report releases
                        Event::Key(key) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                        Event::Resize(w, h) => AppEvent::Resize(w, h),
                        _ => continue,
                    };
                    if tx.send(app_event).is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "terminal event stream failed");
                    break;
                }
                None => break,
            }
        }
    });

    // Tick timer drives the connection pulse and the clock
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        loop {
            interval.tick().await;
            if event_tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}

/// Handler that forwards channel events into the UI loop. Sending fails only
/// once the loop is gone, which is fine to ignore.
pub fn channel_forwarder(
    event_tx: mpsc::UnboundedSender<AppEvent>,
) -> impl Fn(ChannelEvent) + Clone + Send + Sync + 'static {
    move |event| {
        let _ = event_tx.send(AppEvent::Channel(event));
    }
}
