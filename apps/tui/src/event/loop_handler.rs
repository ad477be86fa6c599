use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::Stdout;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{handle_input, App, AppMessage};
use crate::ui;

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Completed background messages applied per frame, so a burst of
/// responses cannot starve input handling.
const MAX_MESSAGES_PER_FRAME: usize = 64;

/// Run the main application event loop
pub async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    messages: &mut UnboundedReceiver<AppMessage>,
) -> Result<()> {
    loop {
        app.update();

        for _ in 0..MAX_MESSAGES_PER_FRAME {
            match messages.try_recv() {
                Ok(message) => app.apply(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(eyre!("background task channel closed"));
                }
            }
        }

        terminal
            .draw(|f| ui::ui(app, f))
            .map_err(|e| eyre!("Terminal draw error: {e}"))?;

        if matches!(event::poll(EVENT_POLL_TIMEOUT), Ok(true)) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    handle_input(app, key.code);
                }
                Ok(Event::Resize(width, height)) => {
                    tracing::debug!(width, height, "terminal resized");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "failed to read terminal event"),
            }
        }

        if !app.running {
            tracing::info!("quit requested");
            break;
        }

        // Let spawned fetches and timers make progress on this thread too.
        tokio::task::yield_now().await;
    }
    Ok(())
}
