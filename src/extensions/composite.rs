//! 组合改写
//!
//! 把一个服务的全部注册合并为单个组合注册。组合对象按原注册顺序收到每个原始实例。

use std::sync::Arc;

use crate::container::{
    Activate, Arguments, Construction, Implementation, Implements, Instance, ServiceCollection,
    ServiceDescriptor, ServiceFactory, ServiceKey, ServiceLifetime, ServiceResolver,
};
use crate::errors::{RegistryError, ResolveError};

impl ServiceCollection {
    /// Replaces all registrations of `S` with a single `C` built from them.
    ///
    /// `C` receives the originals through [`Arguments::components`], first
    /// registered first. The composite takes the narrowest lifetime of the
    /// registrations it replaces and is appended at the end of the collection.
    pub fn compose<S, C>(&mut self) -> Result<&mut Self, RegistryError>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Activate + Implements<S>,
    {
        self.compose_with(ServiceKey::of::<S>(), Implementation::of::<S, C>(), typed_components::<S>)
    }

    /// Key-based form of [`compose`](Self::compose).
    ///
    /// The composite receives the originals as a `Vec<Instance>`.
    pub fn compose_implementation(
        &mut self,
        service: ServiceKey,
        composite: Implementation,
    ) -> Result<&mut Self, RegistryError> {
        if composite.service() != service {
            let err = RegistryError::invalid_argument(format!(
                "composite {} is exposed as {}, not {}",
                composite.name(),
                composite.service(),
                service
            ));
            err.log("compose");
            return Err(err);
        }

        self.compose_with(service, composite, |components, resolver| {
            let instances = components
                .iter()
                .map(|construction| construction.get_or_create(resolver))
                .collect::<Result<Vec<Instance>, _>>()?;
            Ok(Arguments::new().with(instances))
        })
    }

    fn compose_with<W>(
        &mut self,
        service: ServiceKey,
        composite: Implementation,
        component_arguments: W,
    ) -> Result<&mut Self, RegistryError>
    where
        W: Fn(&[Construction], &dyn ServiceResolver) -> Result<Arguments, ResolveError>
            + Send
            + Sync
            + 'static,
    {
        let _span = tracing::debug_span!("compose", service = service.name()).entered();

        let collected = self.descriptors_for(&service);
        if collected.is_empty() {
            let err = RegistryError::not_found(service.name());
            err.log("compose");
            return Err(err);
        }

        // 先算生命周期，失败时注册表保持不变
        let lifetime = ServiceLifetime::most_specific(collected.iter().map(|d| d.lifetime()))
            .map_err(|err| {
                err.log("compose");
                err
            })?;

        for descriptor in &collected {
            self.remove(descriptor);
        }

        let components: Vec<Construction> = collected
            .iter()
            .map(|descriptor| descriptor.construction().clone())
            .collect();
        let count = components.len();

        let factory: ServiceFactory = Arc::new(move |resolver: &dyn ServiceResolver| {
            let arguments = component_arguments(&components, resolver)?;
            resolver.activate(&composite, arguments)
        });
        self.add(ServiceDescriptor::erased_factory(service, factory, lifetime));

        tracing::debug!(count, lifetime = %lifetime, "Composed registrations of {}", service);
        self.trace_snapshot("compose");
        Ok(self)
    }
}

// 每个原始注册解析一次，保持注册顺序
fn typed_components<S>(
    components: &[Construction],
    resolver: &dyn ServiceResolver,
) -> Result<Arguments, ResolveError>
where
    S: ?Sized + Send + Sync + 'static,
{
    let instances = components
        .iter()
        .map(|construction| {
            construction
                .get_or_create(resolver)
                .and_then(|instance| instance.require::<S>())
        })
        .collect::<Result<Vec<Arc<S>>, _>>()?;
    Ok(Arguments::new().with(instances))
}
