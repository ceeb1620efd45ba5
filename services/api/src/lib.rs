mod catalog;
mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use delivery_fee::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
