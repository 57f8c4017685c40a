pub mod cart;
pub mod checkout;
pub mod errors;
pub mod lead;
pub mod list;
pub mod ports;
pub mod reports;
pub mod user;
pub mod vehicle;
