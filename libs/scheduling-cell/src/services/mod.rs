pub mod duration;
pub mod slots;
pub mod conflict;
pub mod past_time;
pub mod windows;
pub mod engine;

pub use duration::DurationAggregator;
pub use slots::{Candidate, SlotGenerator};
pub use conflict::{intervals_overlap, ConflictFilter};
pub use past_time::PastTimeFilter;
pub use windows::validate_weekly_windows;
pub use engine::AvailabilityEngine;
