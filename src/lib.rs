pub mod config;
pub mod container;
pub mod errors;
pub mod extensions;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ConfigLoader, DuplicateKeyPolicy, RewriteOptions};
pub use container::{
    Activate, Arguments, Construction, ConstructionKind, DescriptorId, DescriptorSummary,
    Implementation, Implements, Instance, ResolverExt, ServiceCollection, ServiceDescriptor,
    ServiceFactory, ServiceKey, ServiceLifetime, ServiceResolver,
};
pub use errors::{ConfigError, DiError, RegistryError, ResolveError};
pub use logging::{init_logging, LogFormat, LoggingConfig};
