pub mod address;

pub use address::AddressService;
