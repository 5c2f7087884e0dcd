use super::star::{Star, StarId};
use crate::config::{FieldConfig, UniformRange};

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Area in square pixels, or zero for any degenerate dimension.
    pub fn area(&self) -> f64 {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if usable(self.width) && usable(self.height) {
            self.width * self.height
        } else {
            0.0
        }
    }
}

/// Source of uniform deviates in `[0, 1)`. Need not be seeded or secure.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl RandomSource for fastrand::Rng {
    fn next_unit(&mut self) -> f64 {
        self.f64()
    }
}

impl<F: FnMut() -> f64> RandomSource for F {
    fn next_unit(&mut self) -> f64 {
        self()
    }
}

/// Stars for a viewport of `size`: `floor(area / density)`, optionally capped.
pub fn star_count(size: Size, density: f64, cap: Option<usize>) -> usize {
    if !(density.is_finite() && density > 0.0) {
        return 0;
    }
    let raw = (size.area() / density).floor();
    // `as` saturates, so absurd areas land on usize::MAX before the cap
    let count = if raw.is_finite() { raw as usize } else { 0 };
    match cap {
        Some(cap) => count.min(cap),
        None => count,
    }
}

/// Produces fresh star sets. Ids come from a running counter, so a star from
/// an earlier batch never shares an id with a later one.
pub struct Generator<R = fastrand::Rng> {
    config: FieldConfig,
    rng: R,
    next_id: u64,
}

impl Generator<fastrand::Rng> {
    pub fn new(config: FieldConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }
}

impl<R: RandomSource> Generator<R> {
    pub fn with_rng(config: FieldConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Samples a brand new star set for `size`.
    ///
    /// Attributes are drawn per star in the order size, x, y, speed, opacity.
    /// Zero, negative or non-finite dimensions yield an empty set.
    pub fn generate(&mut self, size: Size) -> Vec<Star> {
        let uncapped = star_count(size, self.config.density, None);
        let count = star_count(size, self.config.density, self.config.max_stars);
        if count < uncapped {
            log::warn!(
                "Star count {} for {}x{} capped at {}",
                uncapped,
                size.width,
                size.height,
                count
            );
        }

        let mut stars = Vec::with_capacity(count);
        for _ in 0..count {
            let star_size = self.sample(self.config.size);
            let x = self.coordinate(size.width);
            let y = self.coordinate(size.height);
            let speed = self.sample(self.config.speed);
            let opacity = self.sample(self.config.opacity);

            stars.push(Star {
                id: StarId(self.next_id),
                x,
                y,
                size: star_size,
                speed,
                opacity,
            });
            self.next_id += 1;
        }

        log::debug!("Generated {} stars for {}x{}", stars.len(), size.width, size.height);
        stars
    }

    fn unit(&mut self) -> f64 {
        // Clamp stubbed or misbehaving sources into [0, 1)
        let u = self.rng.next_unit();
        if u.is_finite() { u.clamp(0.0, 1.0 - f64::EPSILON) } else { 0.0 }
    }

    fn sample(&mut self, range: UniformRange) -> f64 {
        let v = range.min + self.unit() * (range.max - range.min);
        if v < range.max { v } else { range.min }
    }

    fn coordinate(&mut self, extent: f64) -> u32 {
        let cell = (self.unit() * extent).floor();
        // Keep strictly inside the extent even if the product rounds up
        let last = (extent.ceil() - 1.0).max(0.0);
        cell.min(last).clamp(0.0, u32::MAX as f64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(values: Vec<f64>) -> impl FnMut() -> f64 {
        let mut i = 0;
        move || {
            let v = values[i % values.len()];
            i += 1;
            v
        }
    }

    #[test]
    fn count_follows_area_over_density() {
        let cases = [
            (1000.0, 1000.0, 100),
            (1920.0, 1080.0, 207),
            (99.0, 100.0, 0),
            (100.0, 100.0, 1),
            (0.0, 0.0, 0),
            (0.0, 500.0, 0),
            (640.0, 384.0, 24),
        ];
        for (w, h, expected) in cases {
            assert_eq!(star_count(Size::new(w, h), 10_000.0, None), expected, "{w}x{h}");
        }
    }

    #[test]
    fn degenerate_sizes_give_no_stars() {
        let mut generator = Generator::new(FieldConfig::default());
        for size in [
            Size::new(-100.0, 500.0),
            Size::new(500.0, -1.0),
            Size::new(f64::NAN, 1000.0),
            Size::new(f64::INFINITY, 1000.0),
            Size::new(0.0, 0.0),
        ] {
            assert!(generator.generate(size).is_empty(), "{size:?}");
        }
    }

    #[test]
    fn thousand_square_gives_hundred_in_bounds() {
        let mut generator = Generator::new(FieldConfig::default());
        let stars = generator.generate(Size::new(1000.0, 1000.0));
        assert_eq!(stars.len(), 100);
        for star in &stars {
            assert!(star.size >= 1.0 && star.size < 4.0);
            assert!(star.x < 1000 && star.y < 1000);
            assert!(star.speed >= 0.1 && star.speed < 0.6);
            assert!(star.opacity >= 0.3 && star.opacity < 1.0);
        }
    }

    #[test]
    fn bounds_hold_across_many_viewports() {
        let mut generator = Generator::new(FieldConfig::default());
        for (w, h) in [(100u32, 100u32), (101, 99), (317, 2000), (2560, 1440), (1, 20000)] {
            let stars = generator.generate(Size::new(w as f64, h as f64));
            assert_eq!(stars.len(), (w as usize * h as usize) / 10_000);
            for star in &stars {
                assert!(star.x < w && star.y < h);
            }
        }
    }

    #[test]
    fn stubbed_source_gives_exact_fields() {
        // size, x, y, speed, opacity
        let rng = stub(vec![0.0, 0.5, 0.25, 0.5, 0.5]);
        let mut generator = Generator::with_rng(FieldConfig::default(), rng);
        let stars = generator.generate(Size::new(200.0, 100.0));

        assert_eq!(stars.len(), 2);
        for star in &stars {
            assert_eq!(star.size, 1.0);
            assert_eq!(star.x, 100);
            assert_eq!(star.y, 25);
            assert!((star.speed - 0.35).abs() < 1e-12);
            assert!((star.opacity - 0.65).abs() < 1e-12);
        }
    }

    #[test]
    fn deviate_at_upper_edge_stays_exclusive() {
        let rng = stub(vec![1.0]);
        let mut generator = Generator::with_rng(FieldConfig::default(), rng);
        let stars = generator.generate(Size::new(100.0, 100.0));

        let star = &stars[0];
        assert!(star.size < 4.0);
        assert!(star.x < 100 && star.y < 100);
        assert!(star.speed < 0.6);
        assert!(star.opacity < 1.0);
    }

    #[test]
    fn ids_are_unique_within_and_across_batches() {
        let mut generator = Generator::new(FieldConfig::default());
        let first = generator.generate(Size::new(500.0, 500.0));
        let second = generator.generate(Size::new(500.0, 500.0));

        let mut ids: Vec<_> = first.iter().chain(&second).map(|s| s.id).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn cap_limits_count() {
        let config = FieldConfig {
            max_stars: Some(10),
            ..FieldConfig::default()
        };
        let mut generator = Generator::new(config);
        assert_eq!(generator.generate(Size::new(1000.0, 1000.0)).len(), 10);
        assert_eq!(generator.generate(Size::new(300.0, 300.0)).len(), 9);
    }

    #[test]
    fn custom_density() {
        assert_eq!(star_count(Size::new(1000.0, 1000.0), 2_500.0, None), 400);
        assert_eq!(star_count(Size::new(1000.0, 1000.0), 0.0, None), 0);
    }
}
