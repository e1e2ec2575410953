/// Routes that run the analyzer on one contract or on a batch of contracts.
pub mod analyze;

/// Health check route that returns a 200 OK status code if the server is running.
pub mod health_check;

pub use analyze::*;
pub use health_check::*;
