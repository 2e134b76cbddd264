pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::{address_routes, AddressCellState};
pub use services::AddressService;
