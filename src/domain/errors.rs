use thiserror::Error;

/// Client-side, field-level failure. Blocks a step transition or a submit and
/// never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please select a {field} for every test drive ({item_id})")]
    MissingSchedule {
        item_id: String,
        field: &'static str,
    },
    #[error("{0} is required")]
    MissingCustomerField(&'static str),
}
