use std::sync::Arc;

use super::domain::VehicleType;
use super::repository::TariffRepository;
use super::service::FeeError;

/// Resolves the fixed fee for a (city, vehicle type) pair.
pub struct BaseFeeResolver<T> {
    repository: Arc<T>,
}

impl<T> BaseFeeResolver<T>
where
    T: TariffRepository,
{
    pub fn new(repository: Arc<T>) -> Self {
        Self { repository }
    }

    /// A stored entry without an amount is charged as `0.0`.
    pub fn resolve(&self, city_name: &str, vehicle_type: VehicleType) -> Result<f64, FeeError> {
        let entry = self
            .repository
            .base_fee(city_name, vehicle_type)?
            .ok_or_else(|| FeeError::BaseFeeNotFound {
                city: city_name.to_string(),
                vehicle_type,
            })?;

        Ok(entry.amount.unwrap_or(0.0))
    }
}
