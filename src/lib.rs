pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;

use std::sync::Arc;

use application::{CheckoutService, ListController};
use config::Config;
use domain::lead::Lead;
use domain::list::ListFilters;
use domain::user::User;
use domain::vehicle::{Vehicle, VehicleFilter};
use errors::ApiError;
use infrastructure::{
    AuthApi, DashboardApi, FileTokenStore, HttpBookingApi, HttpClient, HttpResourceApi, LeadsApi,
    MemoryTokenStore, SalesApi, TokenStore, UsersApi, VehiclesApi,
};

/// Every adapter of the dealership API, sharing one transport and token.
pub struct DealershipClient {
    http: HttpClient,
    auth: AuthApi,
    leads: LeadsApi,
    vehicles: VehiclesApi,
    users: UsersApi,
    bookings: HttpBookingApi,
    dashboard: DashboardApi,
    sales: SalesApi,
}

impl DealershipClient {
    /// Builds the client from configuration. The token is persisted to
    /// `config.token_path` when set, otherwise kept in memory.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = HttpClient::new(config)?;
        let store: Arc<dyn TokenStore> = match &config.token_path {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::default()),
        };
        Ok(Self::with_parts(http, store))
    }

    /// [`DealershipClient::new`] over [`Config::from_env`].
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(&Config::from_env()?)
    }

    pub fn with_parts(http: HttpClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            auth: AuthApi::new(http.clone(), store),
            leads: HttpResourceApi::new(http.clone()),
            vehicles: HttpResourceApi::new(http.clone()),
            users: HttpResourceApi::new(http.clone()),
            bookings: HttpBookingApi::new(http.clone()),
            dashboard: DashboardApi::new(http.clone()),
            sales: SalesApi::new(http.clone()),
            http,
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn auth(&self) -> &AuthApi {
        &self.auth
    }

    pub fn leads(&self) -> &LeadsApi {
        &self.leads
    }

    pub fn vehicles(&self) -> &VehiclesApi {
        &self.vehicles
    }

    pub fn users(&self) -> &UsersApi {
        &self.users
    }

    pub fn bookings(&self) -> &HttpBookingApi {
        &self.bookings
    }

    pub fn dashboard(&self) -> &DashboardApi {
        &self.dashboard
    }

    pub fn sales(&self) -> &SalesApi {
        &self.sales
    }

    pub fn lead_list(&self) -> ListController<Lead, LeadsApi> {
        ListController::new(self.leads.clone())
    }

    pub fn vehicle_list(
        &self,
        filters: ListFilters<VehicleFilter>,
    ) -> ListController<Vehicle, VehiclesApi> {
        ListController::with_filters(self.vehicles.clone(), filters)
    }

    pub fn user_list(&self) -> ListController<User, UsersApi> {
        ListController::new(self.users.clone())
    }

    /// A fresh cart and checkout flow backed by the bookings endpoint.
    pub fn checkout(&self) -> CheckoutService<HttpBookingApi> {
        CheckoutService::new(self.bookings.clone())
    }
}
