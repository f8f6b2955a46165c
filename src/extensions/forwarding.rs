//! 多接口转发
//!
//! 实现类型以自身类型注册一次，两个服务键都注册为解析该实现的工厂，
//! 因此单例与作用域生命周期下两个键得到同一个对象。

use std::sync::Arc;

use crate::config::DuplicateKeyPolicy;
use crate::container::{
    Activate, Implements, Instance, ResolverExt, ServiceCollection, ServiceDescriptor,
    ServiceFactory, ServiceKey, ServiceLifetime, ServiceResolver,
};
use crate::errors::{RegistryError, ResolveError};

impl ServiceCollection {
    /// Exposes one `T` as both `K1` and `K2`.
    ///
    /// `T` itself is registered under its own type with `lifetime`; the two
    /// keys are factories with the same lifetime that resolve it. With
    /// `Transient` every resolution builds a new `T`.
    ///
    /// Fails with `InvalidArgument` when `T` is one of the keys, or when
    /// `K1 == K2` under [`DuplicateKeyPolicy::Reject`].
    pub fn forward<K1, K2, T>(&mut self, lifetime: ServiceLifetime) -> Result<&mut Self, RegistryError>
    where
        K1: ?Sized + Send + Sync + 'static,
        K2: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<K1> + Implements<K2>,
    {
        let first = ServiceKey::of::<K1>();
        let second = ServiceKey::of::<K2>();
        let implementation = ServiceKey::of::<T>();
        let _span = tracing::debug_span!(
            "forward",
            first = first.name(),
            second = second.name(),
            implementation = implementation.name()
        )
        .entered();

        if implementation == first || implementation == second {
            let err = RegistryError::invalid_argument(format!(
                "{} cannot be forwarded to itself",
                implementation
            ));
            err.log("forward");
            return Err(err);
        }

        let collapse = first == second;
        if collapse && self.options().forwarding.duplicate_keys == DuplicateKeyPolicy::Reject {
            let err = RegistryError::invalid_argument(format!(
                "both forwarded keys are {}",
                first
            ));
            err.log("forward");
            return Err(err);
        }

        self.add(ServiceDescriptor::concrete::<T>(lifetime));
        self.add(ServiceDescriptor::erased_factory(
            first,
            forwarding_factory::<K1, T>(),
            lifetime,
        ));
        if collapse {
            tracing::debug!("Both keys are {}, registering a single forwarded key", first);
        } else {
            self.add(ServiceDescriptor::erased_factory(
                second,
                forwarding_factory::<K2, T>(),
                lifetime,
            ));
        }

        tracing::debug!(lifetime = %lifetime, "Forwarded {} to {} and {}", implementation, first, second);
        self.trace_snapshot("forward");
        Ok(self)
    }

    pub fn add_singleton_forwarded<K1, K2, T>(&mut self) -> Result<&mut Self, RegistryError>
    where
        K1: ?Sized + Send + Sync + 'static,
        K2: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<K1> + Implements<K2>,
    {
        self.forward::<K1, K2, T>(ServiceLifetime::Singleton)
    }

    pub fn add_scoped_forwarded<K1, K2, T>(&mut self) -> Result<&mut Self, RegistryError>
    where
        K1: ?Sized + Send + Sync + 'static,
        K2: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<K1> + Implements<K2>,
    {
        self.forward::<K1, K2, T>(ServiceLifetime::Scoped)
    }

    pub fn add_transient_forwarded<K1, K2, T>(&mut self) -> Result<&mut Self, RegistryError>
    where
        K1: ?Sized + Send + Sync + 'static,
        K2: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<K1> + Implements<K2>,
    {
        self.forward::<K1, K2, T>(ServiceLifetime::Transient)
    }
}

/// 解析实现类型并以服务 `K` 的视图返回
fn forwarding_factory<K, T>() -> ServiceFactory
where
    K: ?Sized + Send + Sync + 'static,
    T: Implements<K>,
{
    Arc::new(|resolver: &dyn ServiceResolver| -> Result<Instance, ResolveError> {
        let implementation = resolver.get::<T>()?;
        Ok(Instance::new(<T as Implements<K>>::upcast(implementation)))
    })
}
