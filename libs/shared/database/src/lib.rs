pub mod memory;
pub mod postgrest;
pub mod repository;
pub mod retry;
pub mod supabase;

pub use memory::InMemoryStore;
pub use postgrest::SupabaseStore;
pub use repository::{
    AddressRepository, AppointmentRepository, BookingStore, OfferedServiceRepository,
    SlotRepository, SpecialistRepository, StoreError, StoreResult, UserRepository,
};
pub use retry::{retry_on_conflict, ConflictAware, RetryPolicy};
