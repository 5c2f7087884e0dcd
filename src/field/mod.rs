//! The parallax star backdrop: star entities, their generator, and the
//! mounted component that ties them to viewport signals.

pub mod generator;
pub mod star;
pub mod starfield;

pub use generator::{Generator, RandomSource, Size, star_count};
pub use star::{Star, StarId, current_offset, offset_with_factor};
pub use starfield::{Placement, StarField};
