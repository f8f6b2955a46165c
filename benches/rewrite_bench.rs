#![allow(clippy::uninlined_format_args)]
//! 注册表改写的性能基准测试

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use diplus::{
    implements, Activate, Arguments, Implementation, Instance, ResolveError, ResolverExt,
    ServiceCollection, ServiceDescriptor, ServiceKey, ServiceLifetime, ServiceResolver,
};
use std::sync::Arc;

trait Handler: Send + Sync {
    fn handle(&self, input: u64) -> u64;
}

struct Doubler;

impl Handler for Doubler {
    fn handle(&self, input: u64) -> u64 {
        input * 2
    }
}

impl Activate for Doubler {
    fn activate(_: &mut Arguments, _: &dyn ServiceResolver) -> Result<Self, ResolveError> {
        Ok(Doubler)
    }
}

struct PlusOne {
    inner: Arc<dyn Handler>,
}

impl Handler for PlusOne {
    fn handle(&self, input: u64) -> u64 {
        self.inner.handle(input) + 1
    }
}

impl Activate for PlusOne {
    fn activate(arguments: &mut Arguments, _: &dyn ServiceResolver) -> Result<Self, ResolveError> {
        Ok(PlusOne {
            inner: arguments.decorated::<dyn Handler>()?,
        })
    }
}

struct Chain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Handler for Chain {
    fn handle(&self, input: u64) -> u64 {
        self.handlers.iter().fold(input, |value, handler| handler.handle(value))
    }
}

impl Activate for Chain {
    fn activate(arguments: &mut Arguments, _: &dyn ServiceResolver) -> Result<Self, ResolveError> {
        Ok(Chain {
            handlers: arguments.components::<dyn Handler>()?,
        })
    }
}

implements!(Doubler: dyn Handler);
implements!(PlusOne: dyn Handler);
implements!(Chain: dyn Handler);

/// 只支持瞬态的最小解析器，足以驱动改写后的工厂
struct TransientResolver {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceResolver for TransientResolver {
    fn resolve(&self, service: &ServiceKey) -> Result<Instance, ResolveError> {
        let descriptor = self
            .descriptors
            .iter()
            .rev()
            .find(|descriptor| descriptor.service() == *service)
            .ok_or(ResolveError::NotRegistered {
                service: service.name(),
            })?;
        descriptor.construction().resolve(self)
    }

    fn activate(
        &self,
        implementation: &Implementation,
        arguments: Arguments,
    ) -> Result<Instance, ResolveError> {
        implementation.construct(arguments, self)
    }
}

fn registry(bindings: usize) -> ServiceCollection {
    let mut services = ServiceCollection::new();
    for _ in 0..bindings {
        services.add_type::<dyn Handler, Doubler>(ServiceLifetime::Transient);
    }
    services
}

/// 基准测试：装饰全部注册
fn bench_decorate(c: &mut Criterion) {
    let mut group = c.benchmark_group("decorate");

    for bindings in [1, 10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(bindings), bindings, |b, &bindings| {
            b.iter_batched(
                || registry(bindings),
                |mut services| {
                    services.decorate::<dyn Handler, PlusOne>().unwrap();
                    black_box(services.len())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// 基准测试：组合全部注册
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    for bindings in [1, 10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(bindings), bindings, |b, &bindings| {
            b.iter_batched(
                || registry(bindings),
                |mut services| {
                    services.compose::<dyn Handler, Chain>().unwrap();
                    black_box(services.len())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// 基准测试：解析多层装饰
fn bench_resolve_decorated(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_decorated");

    for layers in [1, 4, 16].iter() {
        let mut services = registry(1);
        for _ in 0..*layers {
            services.decorate::<dyn Handler, PlusOne>().unwrap();
        }
        let resolver = TransientResolver {
            descriptors: services.into_descriptors(),
        };

        group.bench_with_input(BenchmarkId::from_parameter(layers), layers, |b, _| {
            b.iter(|| {
                let handler = resolver.get::<dyn Handler>().unwrap();
                black_box(handler.handle(black_box(3)))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decorate, bench_compose, bench_resolve_decorated);
criterion_main!(benches);
