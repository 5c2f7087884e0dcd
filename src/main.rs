use std::io::{self, BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use starfield::config::{Config, Rgb};
use starfield::experience::{CategoryFilter, Experience, default_entries};
use starfield::page::{Page, default_sections};
use starfield::render::Renderer;
use starfield::{Generator, StarField, TerminalViewport, ViewportAdapter, logging};

const FIXED_DT: f32 = 1.0 / 60.0;

/// Parallax starfield behind a scrolling terminal portfolio.
///
/// Scroll with the mouse wheel, arrows, j/k, PgUp/PgDn, Space, Home/End.
/// Jump to a section with 1-8 or Tab/Shift+Tab, 't' for the top.
/// Filter experience with a/e/w, switch entries with Left/Right or h/l.
/// Press 'q', ESC, or Ctrl+C to exit.
#[derive(Parser, Debug)]
#[command(name = "starfield", version, about)]
struct Cli {
    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Background color as hex (e.g. --bg-color 1a1b26)
    #[arg(long, value_name = "RRGGBB")]
    bg_color: Option<String>,

    /// Upper bound on stars per generation
    #[arg(long, value_name = "N")]
    max_stars: Option<usize>,

    /// Square pixels of viewport per star
    #[arg(long, value_name = "PX2")]
    density: Option<f64>,

    /// Append log records to this file (level from STARFIELD_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(hex) = &self.bg_color {
            config.theme.background = Rgb::parse_hex(hex)?;
        }
        if let Some(max_stars) = self.max_stars {
            config.field.max_stars = Some(max_stars);
        }
        if let Some(density) = self.density {
            config.field.density = density;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Raw mode and alternate screen for as long as it lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("enabling raw mode")?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)
            .context("entering alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen, DisableMouseCapture);
        let _ = terminal::disable_raw_mode();
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('q')
        || key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// What a page-level key did. Plain scrolling keys fall through to the
/// viewport.
#[derive(Debug, PartialEq)]
enum Navigation {
    Unhandled,
    Scrolled,
    Relayout,
}

fn navigate(key: &KeyEvent, page: &mut Page, viewport: &mut TerminalViewport) -> Navigation {
    let (_, cell_height) = viewport.cell_size();
    let row = first_visible_row(viewport);
    let target = match key.code {
        KeyCode::Char(digit @ '1'..='9') => {
            let section = digit as usize - '1' as usize;
            page.jump_target(section, cell_height)
        }
        KeyCode::Tab => page.next_section(row).and_then(|s| page.jump_target(s, cell_height)),
        KeyCode::BackTab => page.prev_section(row).and_then(|s| page.jump_target(s, cell_height)),
        KeyCode::Char('t') => Some(0.0),
        KeyCode::Char('a') => return relayout(page.set_experience_filter(CategoryFilter::All)),
        KeyCode::Char('e') => return relayout(page.set_experience_filter(CategoryFilter::Education)),
        KeyCode::Char('w') => return relayout(page.set_experience_filter(CategoryFilter::Work)),
        KeyCode::Right | KeyCode::Char('l') => return relayout(page.next_experience_tab()),
        KeyCode::Left | KeyCode::Char('h') => return relayout(page.prev_experience_tab()),
        _ => return Navigation::Unhandled,
    };

    // Keys that name a missing section are consumed without moving
    if let Some(offset) = target {
        log::debug!("Jumping to offset {}", offset);
        viewport.scroll_to(offset);
    }
    Navigation::Scrolled
}

fn relayout(changed: bool) -> Navigation {
    if changed { Navigation::Relayout } else { Navigation::Scrolled }
}

/// Lets the viewport scroll exactly to the end of the page.
fn fit_scroll(viewport: &mut TerminalViewport, page: &Page) {
    let (_, cell_height) = viewport.cell_size();
    let document = page.height_rows() as f64 * cell_height;
    viewport.set_max_scroll(document - viewport.size().height);
}

fn first_visible_row(viewport: &TerminalViewport) -> usize {
    let (_, cell_height) = viewport.cell_size();
    (viewport.scroll_y() / cell_height).floor() as usize
}

fn run(config: Config) -> Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    let _guard = TerminalGuard::enter()?;
    let (cols, rows) = terminal::size().context("querying terminal size")?;

    let sections = config.page.sections.clone().unwrap_or_else(default_sections);
    let entries = config.page.experience.clone().unwrap_or_else(default_entries);
    let mut page = Page::new(sections, config.page.reveal_secs).with_experience(Experience::new(entries));
    let mut viewport = TerminalViewport::new(cols, rows, &config.terminal);
    fit_scroll(&mut viewport, &page);

    let mut field = StarField::mount(&viewport, Generator::new(config.field.clone()));
    let (cell_width, cell_height) = viewport.cell_size();
    let mut renderer = Renderer::new(config.theme.clone(), cell_width, cell_height);
    log::info!("Running at {}x{} cells with {} stars", cols, rows, field.star_count());

    let frame_budget = Duration::from_millis(config.terminal.frame_ms);
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    'frames: loop {
        let mut timeout = frame_budget;
        while event::poll(timeout)? {
            let event = event::read()?;
            // Drain whatever else is queued without waiting again
            timeout = Duration::ZERO;
            if let Event::Key(key) = &event {
                if is_quit(key) {
                    break 'frames;
                }
                if key.kind != KeyEventKind::Release {
                    match navigate(key, &mut page, &mut viewport) {
                        Navigation::Unhandled => {}
                        Navigation::Scrolled => continue,
                        Navigation::Relayout => {
                            fit_scroll(&mut viewport, &page);
                            continue;
                        }
                    }
                }
            }
            if viewport.dispatch(&event) && matches!(event, Event::Resize(..)) {
                fit_scroll(&mut viewport, &page);
                execute!(stdout, Clear(ClearType::All))?;
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            page.update(FIXED_DT);
            accumulator -= FIXED_DT;
        }

        page.observe(first_visible_row(&viewport), viewport.rows() as usize);
        renderer.compose(
            viewport.cols(),
            viewport.rows(),
            &field.placements(),
            &page,
            viewport.scroll_y(),
        );
        renderer.write(&mut stdout)?;
    }

    field.unmount();
    stdout.flush()?;
    log::info!("Exited cleanly");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        logging::init(path).with_context(|| format!("opening log file {}", path.display()))?;
    }

    let config = cli.resolve_config()?;
    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    run(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from(["starfield", "--bg-color", "1a1b26", "--max-stars", "50", "--density", "2500"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.theme.background, Rgb(0x1a, 0x1b, 0x26));
        assert_eq!(config.field.max_stars, Some(50));
        assert_eq!(config.field.density, 2500.0);
    }

    #[test]
    fn bad_cli_values_are_rejected() {
        let cli = Cli::parse_from(["starfield", "--bg-color", "nope"]);
        assert!(cli.resolve_config().is_err());
        let cli = Cli::parse_from(["starfield", "--density", "0"]);
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    fn portfolio(rows: u16) -> (Page, TerminalViewport) {
        let page = Page::new(default_sections(), 0.0).with_experience(Experience::new(default_entries()));
        let mut viewport = TerminalViewport::new(80, rows, &Config::default().terminal);
        fit_scroll(&mut viewport, &page);
        (page, viewport)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digit_jumps_to_section_start() {
        let (mut page, mut viewport) = portfolio(10);
        let skills = page.section_rows(2).unwrap().start;

        assert_eq!(navigate(&press(KeyCode::Char('3')), &mut page, &mut viewport), Navigation::Scrolled);
        assert_eq!(viewport.scroll_y(), skills as f64 * 16.0);
        assert_eq!(first_visible_row(&viewport), skills);

        assert_eq!(navigate(&press(KeyCode::Char('t')), &mut page, &mut viewport), Navigation::Scrolled);
        assert_eq!(viewport.scroll_y(), 0.0);
    }

    #[test]
    fn digit_past_last_section_stays_put() {
        let (mut page, mut viewport) = portfolio(10);
        navigate(&press(KeyCode::Char('2')), &mut page, &mut viewport);
        let before = viewport.scroll_y();
        assert_eq!(navigate(&press(KeyCode::Char('9')), &mut page, &mut viewport), Navigation::Scrolled);
        assert_eq!(viewport.scroll_y(), before);
    }

    #[test]
    fn tab_walks_sections() {
        let (mut page, mut viewport) = portfolio(10);
        navigate(&press(KeyCode::Tab), &mut page, &mut viewport);
        assert_eq!(first_visible_row(&viewport), page.section_rows(1).unwrap().start);
        navigate(&press(KeyCode::Tab), &mut page, &mut viewport);
        assert_eq!(first_visible_row(&viewport), page.section_rows(2).unwrap().start);
        navigate(&press(KeyCode::BackTab), &mut page, &mut viewport);
        assert_eq!(first_visible_row(&viewport), page.section_rows(1).unwrap().start);
    }

    #[test]
    fn filter_keys_relayout_and_refit() {
        let (mut page, mut viewport) = portfolio(10);
        let full = page.height_rows();

        assert_eq!(navigate(&press(KeyCode::Char('e')), &mut page, &mut viewport), Navigation::Relayout);
        fit_scroll(&mut viewport, &page);
        assert!(page.height_rows() < full);
        assert_eq!(viewport.max_scroll(), (page.height_rows() as f64 - 10.0) * 16.0);

        // Already filtered to education
        assert_eq!(navigate(&press(KeyCode::Char('e')), &mut page, &mut viewport), Navigation::Scrolled);
        // A single education entry has no next tab
        assert_eq!(navigate(&press(KeyCode::Right), &mut page, &mut viewport), Navigation::Scrolled);
        assert_eq!(navigate(&press(KeyCode::Down), &mut page, &mut viewport), Navigation::Unhandled);
    }

    #[test]
    fn max_scroll_reaches_page_end() {
        let config = Config::default();
        let page = Page::new(default_sections(), 0.0);
        let mut viewport = TerminalViewport::new(80, 10, &config.terminal);
        fit_scroll(&mut viewport, &page);
        let expected = (page.height_rows() as f64 - 10.0) * 16.0;
        assert_eq!(viewport.max_scroll(), expected);
    }
}
