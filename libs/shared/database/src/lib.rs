pub mod supabase;

pub use supabase::{SupabaseClient, CONSTRAINT_VIOLATION};
