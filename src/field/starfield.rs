use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::generator::{Generator, RandomSource, Size};
use super::star::{Star, StarId, offset_with_factor};
use crate::viewport::{Subscription, ViewportAdapter};

/// Everything the renderer needs to draw one star at the current scroll.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: StarId,
    pub x: u32,
    pub y: u32,
    pub size: f64,
    pub opacity: f64,
    /// Vertical translation derived from the scroll offset.
    pub translate_y: f64,
}

struct FieldState<R> {
    generator: Generator<R>,
    stars: Vec<Star>,
    scroll_y: f64,
    generation: u64,
}

impl<R: RandomSource> FieldState<R> {
    fn regenerate(&mut self, size: Size) {
        self.stars = self.generator.generate(size);
        self.generation += 1;
    }
}

/// State shared with the viewport listeners. A signal that arrives while
/// the state is borrowed is parked and applied on the next access, so the
/// latest resize and the latest scroll still win.
struct Shared<R> {
    state: RefCell<FieldState<R>>,
    pending_size: Cell<Option<Size>>,
    pending_scroll: Cell<Option<f64>>,
}

impl<R: RandomSource> Shared<R> {
    fn resize(&self, size: Size) {
        self.pending_size.set(Some(size));
        self.settle();
    }

    fn scroll(&self, scroll_y: f64) {
        self.pending_scroll.set(Some(scroll_y));
        self.settle();
    }

    fn settle(&self) {
        if self.pending_size.get().is_none() && self.pending_scroll.get().is_none() {
            return;
        }
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        if let Some(size) = self.pending_size.take() {
            state.regenerate(size);
        }
        if let Some(scroll_y) = self.pending_scroll.take() {
            state.scroll_y = scroll_y;
        }
    }

    fn read<T>(&self, f: impl FnOnce(&FieldState<R>) -> T) -> T {
        self.settle();
        f(&self.state.borrow())
    }
}

/// The mounted backdrop. Owns the live star set and the latest scroll
/// offset, and holds its viewport subscriptions until unmounted or dropped.
pub struct StarField<R: RandomSource + 'static = fastrand::Rng> {
    shared: Rc<Shared<R>>,
    subscriptions: Vec<Subscription>,
}

impl<R: RandomSource + 'static> StarField<R> {
    /// Generates the initial set for the viewport's current size and starts
    /// listening for resize and scroll.
    pub fn mount(viewport: &dyn ViewportAdapter, generator: Generator<R>) -> Self {
        let shared = Rc::new(Shared {
            state: RefCell::new(FieldState {
                generator,
                stars: Vec::new(),
                scroll_y: viewport.scroll_y(),
                generation: 0,
            }),
            pending_size: Cell::new(None),
            pending_scroll: Cell::new(None),
        });

        let field = Self {
            shared,
            subscriptions: Vec::with_capacity(2),
        };
        field.on_viewport_resize(viewport.size());
        field.subscribe(viewport)
    }

    fn subscribe(mut self, viewport: &dyn ViewportAdapter) -> Self {
        let weak: Weak<Shared<R>> = Rc::downgrade(&self.shared);
        let on_resize = viewport.on_resize(Box::new(move |size| {
            if let Some(shared) = weak.upgrade() {
                shared.resize(size);
            }
        }));

        let weak: Weak<Shared<R>> = Rc::downgrade(&self.shared);
        let on_scroll = viewport.on_scroll(Box::new(move |scroll_y| {
            if let Some(shared) = weak.upgrade() {
                shared.scroll(scroll_y);
            }
        }));

        self.subscriptions.push(on_resize);
        self.subscriptions.push(on_scroll);
        log::debug!("Star field mounted with {} stars", self.star_count());
        self
    }

    /// Discards the current set and generates a new one for `size`.
    pub fn on_viewport_resize(&self, size: Size) {
        self.shared.resize(size);
    }

    /// Copy of the live star set.
    pub fn stars(&self) -> Vec<Star> {
        self.with_stars(|stars| stars.to_vec())
    }

    /// Runs `f` over the live star set without copying it.
    pub fn with_stars<T>(&self, f: impl FnOnce(&[Star]) -> T) -> T {
        self.shared.read(|state| f(&state.stars))
    }

    pub fn star_count(&self) -> usize {
        self.shared.read(|state| state.stars.len())
    }

    pub fn scroll_y(&self) -> f64 {
        self.shared.read(|state| state.scroll_y)
    }

    /// Number of regenerations so far, the initial one included.
    pub fn generation(&self) -> u64 {
        self.shared.read(|state| state.generation)
    }

    pub fn is_mounted(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active)
    }

    /// Render list for the current scroll offset, recomputed on every call.
    pub fn placements(&self) -> Vec<Placement> {
        self.shared.read(|state| {
            let parallax = state.generator.config().parallax;
            state
                .stars
                .iter()
                .map(|star| Placement {
                    id: star.id,
                    x: star.x,
                    y: star.y,
                    size: star.size,
                    opacity: star.opacity,
                    translate_y: offset_with_factor(star, state.scroll_y, parallax),
                })
                .collect()
        })
    }

    /// Releases both viewport subscriptions. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if self.is_mounted() {
            log::debug!("Star field unmounted");
        }
        for subscription in &mut self.subscriptions {
            subscription.cancel();
        }
    }
}

impl<R: RandomSource + 'static> Drop for StarField<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::config::TerminalConfig;
    use crate::viewport::TerminalViewport;

    fn viewport(cols: u16, rows: u16) -> TerminalViewport {
        // 8x16 px cells: 125x63 cells is 1000x1008 px
        TerminalViewport::new(cols, rows, &TerminalConfig::default())
    }

    #[test]
    fn mount_generates_for_current_size() {
        let vp = viewport(125, 63);
        let field = StarField::mount(&vp, Generator::new(FieldConfig::default()));
        assert_eq!(field.stars().len(), 100);
        assert_eq!(field.generation(), 1);
        assert_eq!(vp.listener_count(), 2);
    }

    #[test]
    fn scroll_moves_offsets_not_stars() {
        let mut vp = viewport(125, 63);
        vp.set_max_scroll(10_000.0);
        let field = StarField::mount(&vp, Generator::new(FieldConfig::default()));
        let before: Vec<Star> = field.stars().to_vec();

        vp.scroll_to(500.0);
        assert_eq!(field.scroll_y(), 500.0);
        assert_eq!(field.generation(), 1);
        assert_eq!(*field.stars(), before[..]);

        for (placement, star) in field.placements().iter().zip(&before) {
            assert_eq!(placement.id, star.id);
            assert!((placement.translate_y - 500.0 * star.speed * 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn mount_picks_up_existing_scroll() {
        let mut vp = viewport(80, 24);
        vp.set_max_scroll(1000.0);
        vp.scroll_to(320.0);
        let field = StarField::mount(&vp, Generator::new(FieldConfig::default()));
        assert_eq!(field.scroll_y(), 320.0);
    }

    #[test]
    fn resize_replaces_whole_set() {
        let mut vp = viewport(125, 63);
        let field = StarField::mount(&vp, Generator::new(FieldConfig::default()));
        let old_ids: Vec<StarId> = field.stars().iter().map(|s| s.id).collect();

        vp.resize(250, 63);
        assert_eq!(field.generation(), 2);
        assert_eq!(field.stars().len(), 201);
        assert!(field.stars().iter().all(|s| !old_ids.contains(&s.id)));

        vp.resize(0, 31);
        assert!(field.stars().is_empty());
    }

    #[test]
    fn held_star_copy_survives_resize() {
        let mut vp = viewport(125, 63);
        let field = StarField::mount(&vp, Generator::new(FieldConfig::default()));
        let stars = field.stars();

        // 10x10 cells is 80x160 px, room for one star
        vp.resize(10, 10);
        assert_eq!(stars.len(), 100);
        assert_eq!(field.star_count(), 1);
        assert_eq!(field.generation(), 2);
    }

    #[test]
    fn signals_during_star_access_apply_afterwards() {
        let mut vp = viewport(125, 63);
        vp.set_max_scroll(1000.0);
        let field = StarField::mount(&vp, Generator::new(FieldConfig::default()));

        let seen = field.with_stars(|stars| {
            vp.resize(250, 63);
            vp.scroll_to(200.0);
            vp.resize(10, 10);
            stars.len()
        });

        assert_eq!(seen, 100);
        // Only the last parked resize is generated
        assert_eq!(field.star_count(), 1);
        assert_eq!(field.generation(), 2);
        assert_eq!(field.scroll_y(), 200.0);
        assert_eq!(field.placements().len(), 1);
    }

    #[test]
    fn unmount_twice_is_safe() {
        let mut vp = viewport(80, 24);
        let mut field = StarField::mount(&vp, Generator::new(FieldConfig::default()));
        field.unmount();
        field.unmount();
        assert!(!field.is_mounted());
        assert_eq!(vp.listener_count(), 0);

        let count = field.stars().len();
        vp.resize(200, 60);
        assert_eq!(field.stars().len(), count);
        assert_eq!(field.generation(), 1);
    }

    #[test]
    fn drop_releases_listeners() {
        let vp = viewport(80, 24);
        {
            let _field = StarField::mount(&vp, Generator::new(FieldConfig::default()));
            assert_eq!(vp.listener_count(), 2);
        }
        assert_eq!(vp.listener_count(), 0);
    }
}
