//! Page structure and text interpretation
//!
//! This module holds the DOM selector set describing the forum layout and the
//! resolver that turns free-form timestamp text into instants.

pub mod selectors;
pub mod timestamp;

pub use selectors::ForumSelectors;
pub use timestamp::{CalendarDelta, RelativeCategory, TimestampResolver};
