pub mod availability;
pub mod clock;
pub mod committer;
pub mod lifecycle;
pub mod memory_store;
pub mod store;
pub mod supabase_store;
pub mod windows;

pub use availability::AvailabilityService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use committer::BookingCommitter;
pub use lifecycle::AppointmentLifecycleService;
pub use memory_store::MemoryStore;
pub use store::SchedulingStore;
pub use supabase_store::SupabaseStore;
pub use windows::WorkingWindowService;
