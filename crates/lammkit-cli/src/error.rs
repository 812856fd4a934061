use thiserror::Error;

use lammkit::core::io::data::DataError;
use lammkit::core::io::settings::SettingsError;
use lammkit::core::models::system::LookupError;
use lammkit::core::retype::RetypeError;
use lammkit::output::OutputError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Retype(#[from] RetypeError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
