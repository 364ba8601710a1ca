use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::File,
    io,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

use pdu::{App, Args, ScanOptions, ScanProgress, ScanTree, scan_directory, ui};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

const PROGRESS_REFRESH: Duration = Duration::from_millis(100);

fn is_quit(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Draw the progress screen until the scan thread is done.
///
/// Returns `None` if the user gave up waiting.
fn wait_for_scan(
    terminal: &mut Term,
    args: &Args,
    scan: JoinHandle<pdu::Result<ScanTree>>,
    progress: &ScanProgress,
) -> Result<Option<ScanTree>, Box<dyn std::error::Error>> {
    let started = Instant::now();
    while !scan.is_finished() {
        let snapshot = progress.snapshot();
        terminal.draw(|f| ui::render_scanning(f, &args.path, &snapshot, started.elapsed()))?;

        if event::poll(PROGRESS_REFRESH)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && is_quit(&key)
        {
            return Ok(None);
        }
    }

    let tree = scan.join().map_err(|_| "scan thread panicked")??;
    Ok(Some(tree))
}

fn run_app(terminal: &mut Term, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, &mut app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press {
                // Clear status message on any key press
                app.status_message = None;

                if app.pending_delete.is_some() {
                    match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
                        _ => app.cancel_delete(),
                    }
                    continue;
                }

                match (key.code, key.modifiers) {
                    (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Ok(()),
                    (KeyCode::Char('q'), _) | (KeyCode::Esc, _) if !app.show_help => return Ok(()),
                    (KeyCode::Esc, _) => app.show_help = false,
                    (KeyCode::Char('?'), _) => app.show_help = !app.show_help,
                    _ if app.show_help => app.show_help = false, // Any key closes help
                    // Navigation
                    (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.next(),
                    (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.previous(),
                    (KeyCode::Char('d'), KeyModifiers::CONTROL) | (KeyCode::PageDown, _) => app.page_down(),
                    (KeyCode::Char('u'), KeyModifiers::CONTROL) | (KeyCode::PageUp, _) => app.page_up(),
                    (KeyCode::Char('H'), _) | (KeyCode::Home, _) => app.go_to_first(),
                    (KeyCode::Char('G'), _) | (KeyCode::End, _) => app.go_to_last(),
                    // Actions
                    (KeyCode::Enter, _) | (KeyCode::Right, _) | (KeyCode::Char('l'), _) | (KeyCode::Char('o'), _) => app.enter_dir(),
                    (KeyCode::Backspace, _) | (KeyCode::Left, _) | (KeyCode::Char('h'), _) | (KeyCode::Char('u'), _) => app.go_up(),
                    (KeyCode::Char('d'), _) => app.request_delete(),
                    // Sort options
                    (KeyCode::Char('s'), _) => app.toggle_sort_by_size(),
                    (KeyCode::Char('m'), _) => app.toggle_sort_by_mtime(),
                    (KeyCode::Char('c'), _) => app.toggle_sort_by_count(),
                    _ => {}
                }
            }
    }
}

fn run(
    terminal: &mut Term,
    args: &Args,
    scan: JoinHandle<pdu::Result<ScanTree>>,
    progress: &ScanProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    match wait_for_scan(terminal, args, scan, progress)? {
        Some(tree) => Ok(run_app(terminal, App::new(tree))?),
        None => Ok(()),
    }
}

fn setup_logging(args: &Args) -> pdu::Result<()> {
    // The terminal belongs to the UI; only log when asked to log to a file
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path)?;

    let default_filter = if args.verbose { "pdu=debug" } else { "pdu=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(())
}

fn setup_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore terminal state
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging(&args)?;

    let options = ScanOptions::from(&args);
    let progress = Arc::new(ScanProgress::new());
    let scan = {
        let progress = Arc::clone(&progress);
        let path = args.path.clone();
        thread::Builder::new()
            .name("scan".to_string())
            .spawn(move || scan_directory(&path, &options, &progress))?
    };

    // Setup panic hook before entering raw mode
    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &args, scan, &progress);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{}", err)
    }

    Ok(())
}
