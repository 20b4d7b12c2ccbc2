use std::io::{Write, stdout};
use std::process::ExitCode;

use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{error, info};

mod cli;
mod columns;
mod controller;
mod domain;
mod inputter;
mod logging;
mod model;
mod order;
mod record;
mod table;
mod ui;
mod window;

use cli::Cli;
use controller::Controller;
use domain::{RosterConfig, RosterError};
use model::{Model, Status};
use record::SyntheticSource;
use ui::TableUI;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cli: Cli) -> Result<(), RosterError> {
    let cfg = cli.config()?;
    let log_path = logging::resolve_log_path(cli.log_file.as_deref())?;
    logging::init(&log_path)?;
    info!("Starting with {cfg:?}");

    let mut source = SyntheticSource::new(cfg.record_count, cfg.seed, cfg.today);

    let mut terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture)
        .map_err(RosterError::from)
        .and_then(|_| event_loop(&mut terminal, &cfg, &mut source));
    release_mouse(&mut stdout());
    ratatui::restore();

    info!("Shutting down");
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    cfg: &RosterConfig,
    source: &mut SyntheticSource,
) -> Result<(), RosterError> {
    let size = terminal.size()?;
    let mut model = Model::init(cfg, source, size.width as usize, size.height as usize)?;
    let mut ui = TableUI::new(cfg);
    let controller = Controller::new(cfg);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    Ok(())
}

/// Turns mouse reporting off again. Failures are logged, the terminal is
/// restored regardless.
fn release_mouse(out: &mut impl Write) -> bool {
    match execute!(out, DisableMouseCapture) {
        Ok(_) => true,
        Err(e) => {
            error!("Failed to disable mouse capture: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct ClosedTerminal;

    impl Write for ClosedTerminal {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn release_mouse_writes_the_disable_sequence() {
        let mut out = Vec::new();
        assert!(release_mouse(&mut out));
        assert!(!out.is_empty());
    }

    #[test]
    fn release_mouse_reports_write_failures() {
        assert!(!release_mouse(&mut ClosedTerminal));
    }
}
