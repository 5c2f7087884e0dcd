use crate::config::DEFAULT_PARALLAX;

/// Identity of a star, unique within the generator that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StarId(pub u64);

/// A decorative backdrop point. Every field is fixed from generation until
/// the next regeneration replaces the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub id: StarId,
    /// Pixels from the left edge of the viewport.
    pub x: u32,
    /// Pixels from the top edge of the viewport.
    pub y: u32,
    pub size: f64,
    /// Parallax weight. Lower values read as farther away.
    pub speed: f64,
    pub opacity: f64,
}

/// Vertical translation for `star` at document scroll offset `scroll_y`.
pub fn current_offset(star: &Star, scroll_y: f64) -> f64 {
    offset_with_factor(star, scroll_y, DEFAULT_PARALLAX)
}

pub fn offset_with_factor(star: &Star, scroll_y: f64, parallax: f64) -> f64 {
    scroll_y * star.speed * parallax
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(speed: f64) -> Star {
        Star {
            id: StarId(0),
            x: 10,
            y: 20,
            size: 2.0,
            speed,
            opacity: 0.5,
        }
    }

    #[test]
    fn no_scroll_no_offset() {
        for speed in [0.1, 0.25, 0.59] {
            assert_eq!(current_offset(&star(speed), 0.0), 0.0);
        }
    }

    #[test]
    fn speed_point_two_at_500() {
        assert!((current_offset(&star(0.2), 500.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn offset_grows_with_scroll() {
        let s = star(0.3);
        let scrolls = [-200.0, -1.0, 0.0, 0.5, 1.0, 37.0, 1000.0, 1e6];
        for pair in scrolls.windows(2) {
            assert!(current_offset(&s, pair[1]) > current_offset(&s, pair[0]));
        }
    }

    #[test]
    fn offset_is_linear_in_scroll() {
        let s = star(0.45);
        for scroll in [1.0, 3.5, 120.0, 9999.0, -42.0] {
            let single = current_offset(&s, scroll);
            let double = current_offset(&s, 2.0 * scroll);
            assert!((double - 2.0 * single).abs() < 1e-9 * double.abs().max(1.0));
        }
    }

    #[test]
    fn slower_stars_move_less() {
        assert!(current_offset(&star(0.1), 300.0) < current_offset(&star(0.5), 300.0));
    }

    #[test]
    fn factor_scales_offset() {
        let s = star(0.2);
        assert!((offset_with_factor(&s, 500.0, 1.0) - 100.0).abs() < 1e-9);
    }
}
