pub mod specialist;

pub use specialist::SpecialistService;
