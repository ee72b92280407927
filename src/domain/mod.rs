mod metrics;
mod repository;
mod user;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose the user directory abstractions
pub use repository::{RepositoryPtr, StoreError, UserRepository};
pub use user::{ProfileFields, User};
