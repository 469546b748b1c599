//! The process-wide registry (`C9`) binding logger names to logger handles
//! and owning the pool and periodic flush driver (`C10`).

mod error;
mod periodic_driver;
mod registry;

pub use error::RegistryError;
pub use periodic_driver::PeriodicDriver;
pub use registry::Registry;
