pub mod availability;

pub use availability::SlotService;
