//! Viewport and scroll signals.
//!
//! [`ViewportAdapter`] is the capability the star field depends on: current
//! size and scroll offset plus change notifications. [`TerminalViewport`]
//! drives it from crossterm events; tests drive it from a fake.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind};

use crate::config::TerminalConfig;
use crate::field::Size;

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// Single-threaded listener list. Listeners may unsubscribe themselves or
/// each other from inside an emission.
pub struct Listeners<T: 'static> {
    inner: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            let callback: Callback<T> = Rc::new(RefCell::new(listener));
            registry.entries.push((id, callback));
            id
        };

        let registry: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            // Skip anything unsubscribed by an earlier listener in this pass
            let live = self.inner.borrow().entries.iter().any(|(entry, _)| *entry == id);
            if !live {
                continue;
            }
            // A listener that re-emits into itself is not re-entered
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)(value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a registered listener. Cancelling is idempotent, and dropping
/// the handle cancels it.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub trait ViewportAdapter {
    /// Current viewport size in pixels.
    fn size(&self) -> Size;
    /// Current vertical scroll offset in pixels from the document top.
    fn scroll_y(&self) -> f64;
    fn on_resize(&self, callback: Box<dyn FnMut(Size)>) -> Subscription;
    fn on_scroll(&self, callback: Box<dyn FnMut(f64)>) -> Subscription;
}

/// Viewport backed by the terminal: cells scaled to pixels, wheel and
/// navigation keys as scrolling.
pub struct TerminalViewport {
    cols: u16,
    rows: u16,
    cell_width: f64,
    cell_height: f64,
    scroll_step: f64,
    scroll_y: f64,
    max_scroll: f64,
    resize: Listeners<Size>,
    scroll: Listeners<f64>,
}

impl TerminalViewport {
    pub fn new(cols: u16, rows: u16, config: &TerminalConfig) -> Self {
        let cell_height = config.cell_height as f64;
        Self {
            cols,
            rows,
            cell_width: config.cell_width as f64,
            cell_height,
            scroll_step: config.scroll_step as f64 * cell_height,
            scroll_y: 0.0,
            max_scroll: 0.0,
            resize: Listeners::new(),
            scroll: Listeners::new(),
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    /// Number of listeners across both signals.
    pub fn listener_count(&self) -> usize {
        self.resize.len() + self.scroll.len()
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let size = self.size();
        log::debug!("Viewport resized to {}x{} cells ({}x{} px)", cols, rows, size.width, size.height);
        self.resize.emit(&size);
    }

    /// Sets the furthest scroll offset, typically document height minus
    /// viewport height.
    pub fn set_max_scroll(&mut self, max_scroll: f64) {
        self.max_scroll = if max_scroll.is_finite() { max_scroll.max(0.0) } else { 0.0 };
        let clamped = self.scroll_y.min(self.max_scroll);
        self.scroll_to(clamped);
    }

    pub fn max_scroll(&self) -> f64 {
        self.max_scroll
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll_to(self.scroll_y + delta);
    }

    /// Moves to `offset`, clamped to the scrollable range. Emits only when
    /// the offset actually changes.
    pub fn scroll_to(&mut self, offset: f64) {
        let offset = if offset.is_finite() { offset.clamp(0.0, self.max_scroll) } else { 0.0 };
        if offset != self.scroll_y {
            self.scroll_y = offset;
            self.scroll.emit(&offset);
        }
    }

    /// Applies a terminal event. Returns whether it changed the viewport.
    pub fn dispatch(&mut self, event: &Event) -> bool {
        let before = (self.cols, self.rows, self.scroll_y);
        match event {
            Event::Resize(cols, rows) => self.resize(*cols, *rows),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => self.scroll_by(self.scroll_step),
                MouseEventKind::ScrollUp => self.scroll_by(-self.scroll_step),
                _ => {}
            },
            Event::Key(key) => self.handle_key(key),
            _ => {}
        }
        before != (self.cols, self.rows, self.scroll_y) || matches!(event, Event::Resize(..))
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let page = (self.rows.saturating_sub(1)).max(1) as f64 * self.cell_height;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(self.scroll_step),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-self.scroll_step),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_by(page),
            KeyCode::PageUp => self.scroll_by(-page),
            KeyCode::Home => self.scroll_to(0.0),
            KeyCode::End => self.scroll_to(self.max_scroll),
            _ => {}
        }
    }
}

impl ViewportAdapter for TerminalViewport {
    fn size(&self) -> Size {
        Size::new(self.cols as f64 * self.cell_width, self.rows as f64 * self.cell_height)
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn on_resize(&self, mut callback: Box<dyn FnMut(Size)>) -> Subscription {
        self.resize.subscribe(move |size| callback(*size))
    }

    fn on_scroll(&self, mut callback: Box<dyn FnMut(f64)>) -> Subscription {
        self.scroll.subscribe(move |offset| callback(*offset))
    }
}
