pub mod auth;
pub mod bookings;
pub mod envelope;
pub mod http;
pub mod models;
pub mod reports;
pub mod resources;
pub mod token_store;

pub use auth::{AuthApi, Credentials, Registration, Session};
pub use bookings::HttpBookingApi;
pub use http::HttpClient;
pub use reports::{DashboardApi, SalesApi};
pub use resources::{HttpResource, HttpResourceApi, LeadsApi, UsersApi, VehiclesApi};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
