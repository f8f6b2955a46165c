//! Registry module
//!
//! Descriptors, the ordered collection that holds them, and the capability
//! interfaces the resolution engine implements.

pub mod collection;
pub mod descriptor;
pub mod lifetime;
pub mod provider;

// Re-export primary types
pub use collection::ServiceCollection;
pub use descriptor::{
    Construction, ConstructionKind, DescriptorId, DescriptorSummary, Implementation,
    ServiceDescriptor, ServiceFactory, ServiceKey,
};
pub use lifetime::ServiceLifetime;
pub use provider::{Activate, Arguments, Implements, Instance, ResolverExt, ServiceResolver};
