//! 装饰器改写
//!
//! 原地替换每个匹配的注册：位置、服务键与生命周期不变，只换构造策略。

use std::sync::Arc;

use crate::container::{
    Activate, Arguments, Construction, Implementation, Implements, ServiceCollection,
    ServiceFactory, ServiceKey, ServiceResolver,
};
use crate::errors::{RegistryError, ResolveError};

impl ServiceCollection {
    /// Wraps every registration of `S` in decorator `D`.
    ///
    /// `D` receives the original instance through [`Arguments::decorated`]. Each
    /// registration is wrapped on its own, so three bindings yield three
    /// decorators. Calling this twice wraps twice.
    pub fn decorate<S, D>(&mut self) -> Result<&mut Self, RegistryError>
    where
        S: ?Sized + Send + Sync + 'static,
        D: Activate + Implements<S>,
    {
        self.decorate_with(ServiceKey::of::<S>(), Implementation::of::<S, D>(), typed_inner::<S>)
    }

    /// Key-based form of [`decorate`](Self::decorate).
    ///
    /// The original instance reaches the decorator as an untyped
    /// [`Instance`](crate::container::Instance) argument.
    pub fn decorate_implementation(
        &mut self,
        service: ServiceKey,
        decorator: Implementation,
    ) -> Result<&mut Self, RegistryError> {
        if decorator.service() != service {
            let err = RegistryError::invalid_argument(format!(
                "decorator {} is exposed as {}, not {}",
                decorator.name(),
                decorator.service(),
                service
            ));
            err.log("decorate");
            return Err(err);
        }

        self.decorate_with(service, decorator, |original, resolver| {
            Ok(Arguments::new().with(original.get_or_create(resolver)?))
        })
    }

    fn decorate_with<W>(
        &mut self,
        service: ServiceKey,
        decorator: Implementation,
        inner_arguments: W,
    ) -> Result<&mut Self, RegistryError>
    where
        W: Fn(&Construction, &dyn ServiceResolver) -> Result<Arguments, ResolveError>
            + Copy
            + Send
            + Sync
            + 'static,
    {
        let _span = tracing::debug_span!("decorate", service = service.name()).entered();

        let positions = self.positions_of(&service);
        if positions.is_empty() {
            let err = RegistryError::not_found(service.name());
            err.log("decorate");
            return Err(err);
        }

        for &index in &positions {
            let original = self.all()[index].clone();
            let inner = original.construction().clone();
            let activated = decorator.clone();

            let factory: ServiceFactory = Arc::new(move |resolver: &dyn ServiceResolver| {
                let arguments = inner_arguments(&inner, resolver)?;
                resolver.activate(&activated, arguments)
            });

            let decorated = original.with_factory(factory);
            tracing::debug!(
                index,
                lifetime = %decorated.lifetime(),
                "Wrapping {} registration in {}",
                original.implementation_name().unwrap_or("factory"),
                decorator.name()
            );
            self.replace_at(index, decorated);
        }

        tracing::debug!("Decorated {} registrations of {}", positions.len(), service);
        self.trace_snapshot("decorate");
        Ok(self)
    }
}

// 先构建原始实例，再以 Arc<S> 交给装饰器
fn typed_inner<S>(
    original: &Construction,
    resolver: &dyn ServiceResolver,
) -> Result<Arguments, ResolveError>
where
    S: ?Sized + Send + Sync + 'static,
{
    let inner = original.get_or_create(resolver)?.require::<S>()?;
    Ok(Arguments::new().with(inner))
}
