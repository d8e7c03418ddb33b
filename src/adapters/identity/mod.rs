//! Identity store adapters.
//!
//! - `SupabaseIdentityStore` - hosted GoTrue admin API
//! - `InMemoryIdentityStore` - tests and local development

mod in_memory;
mod supabase;

pub use in_memory::InMemoryIdentityStore;
pub use supabase::SupabaseIdentityStore;
