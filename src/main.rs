use std::env;
use std::error::Error;

use dealership_client::config::Config;
use dealership_client::domain::list::ListFilters;
use dealership_client::domain::vehicle::VehicleFilter;
use dealership_client::DealershipClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;
    let client = DealershipClient::new(&config)?;
    if client.auth().restore()? {
        log::info!("Using stored session");
    }

    let make = env::args().nth(1).filter(|m| !m.trim().is_empty());
    let filters = ListFilters {
        predicates: VehicleFilter {
            make: make.clone(),
            ..VehicleFilter::default()
        },
        ..ListFilters::default()
    };

    log::info!(
        "Fetching inventory from {}{}",
        config.api_url,
        make.as_deref()
            .map(|m| format!(" (make: {m})"))
            .unwrap_or_default()
    );

    let inventory = client.vehicle_list(filters);
    inventory.fetch().await?;

    let state = inventory.snapshot();
    for vehicle in &state.items {
        log::info!(
            "{:<10} {} {} {} - ${} [{}]",
            vehicle.stock_number.as_deref().unwrap_or("-"),
            vehicle.year,
            vehicle.make,
            vehicle.model,
            vehicle.price,
            vehicle.status.as_str()
        );
    }
    log::info!(
        "Page {}/{} of {} vehicles",
        state.pagination.page,
        state.pagination.total_pages,
        state.pagination.total
    );
    Ok(())
}
