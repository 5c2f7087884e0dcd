//! A procedurally generated starfield backdrop with scroll-linked parallax,
//! drawn in the terminal behind a scrolling single-page portfolio.
//!
//! The core is [`field`]: [`field::Generator`] samples a star set sized to
//! the viewport area, and [`field::StarField`] keeps that set in step with a
//! [`viewport::ViewportAdapter`], regenerating on resize and deriving each
//! star's vertical offset from the scroll position.

pub mod config;
pub mod error;
pub mod experience;
pub mod field;
pub mod logging;
pub mod page;
pub mod render;
pub mod viewport;

pub use config::Config;
pub use error::{Error, Result};
pub use field::{Generator, Placement, Size, Star, StarField, current_offset};
pub use viewport::{Subscription, TerminalViewport, ViewportAdapter};
