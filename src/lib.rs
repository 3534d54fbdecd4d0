//! voyage: query distribution and multi-provider search aggregation.
//!
//! Two halves that meet at [`dispatch`]:
//!
//! - [`distribution`] assigns a batch of generated [`Query`]s to
//!   capacity-bounded worker classes from the [`CapabilityRegistry`], picking
//!   one of four strategies by batch shape.
//! - [`voyage_search`] runs search-typed queries across independent providers
//!   and returns deduplicated, ranked results.

pub mod capability;
pub mod config;
pub mod dispatch;
pub mod distribution;
pub mod error;
pub mod query;

pub use capability::{CapabilityRegistry, WorkerCapability};
pub use config::{ProviderConfig, VoyageConfig};
pub use dispatch::{DispatchConfig, QueryOutcome, dispatch_assignment, dispatch_queries};
pub use distribution::{
    Assignment, Distribution, DistributionConfig, Distributor, Strategy, ValidationReport,
    ValidationWarning,
};
pub use error::{Result, VoyageError};
pub use query::{Priority, Query, QueryBatch, QueryContext};

pub use voyage_search;
