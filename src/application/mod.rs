pub mod checkout_service;
pub mod list_controller;

pub use checkout_service::{CheckoutService, CART_CLEAR_DELAY};
pub use list_controller::ListController;
