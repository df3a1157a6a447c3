//! Benchmarks for event dispatch and queue coalescing

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_core::event::{ConfigureEvent, Event, ExposeEvent, MotionEvent, ViewStyle};
use tessera_core::geometry::Rect;
use tessera_core::platform::{Platform, WorldFlags, WorldType};
use tessera_core::queue::EventQueue;
use tessera_core::view::ViewCtx;
use tessera_core::{HandlerResult, Result, World};

struct BenchPlatform;

impl Platform for BenchPlatform {
    type WorldInternals = ();
    type ViewInternals = ();

    fn init_world_internals(_: WorldType, _: WorldFlags) -> Result<()> {
        Ok(())
    }

    fn init_view_internals(_: &mut ()) -> Result<()> {
        Ok(())
    }

    fn enter(_: &mut (), _: Option<&ExposeEvent>) -> Result<()> {
        Ok(())
    }

    fn leave(_: &mut (), _: Option<&ExposeEvent>) -> Result<()> {
        Ok(())
    }
}

fn sink(_: &mut ViewCtx<'_>, event: &Event) -> HandlerResult {
    black_box(event);
    Ok(())
}

fn resize_burst(len: u32) -> impl Iterator<Item = Event> {
    (0..len).flat_map(|i| {
        [
            Event::Configure(ConfigureEvent::new(
                Rect::new(0, 0, 640 + i, 480 + i),
                ViewStyle::MAPPED | ViewStyle::RESIZING,
            )),
            Event::Motion(MotionEvent {
                x: f64::from(i),
                ..Default::default()
            }),
            Event::Expose(ExposeEvent::new(Rect::new(0, 0, 640 + i, 480 + i))),
        ]
    })
}

fn bench_dispatch(c: &mut Criterion) {
    let mut world = World::<BenchPlatform>::new(WorldType::Program, WorldFlags::empty())
        .expect("world");
    let view = world.create_view(sink).expect("view");

    let configure = Event::Configure(ConfigureEvent::new(Rect::new(0, 0, 800, 600), ViewStyle::MAPPED));
    let expose = Event::Expose(ExposeEvent::new(Rect::new(0, 0, 800, 600)));

    c.bench_function("dispatch_expose", |b| {
        b.iter(|| world.dispatch_event(view, black_box(&expose)))
    });
    c.bench_function("dispatch_configure", |b| {
        b.iter(|| world.dispatch_event(view, black_box(&configure)))
    });
    c.bench_function("dispatch_close", |b| {
        b.iter(|| world.dispatch_event(view, black_box(&Event::Close)))
    });
}

fn bench_coalescing(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_coalescing");

    for burst in [10u32, 100, 1000] {
        group.throughput(Throughput::Elements(u64::from(burst) * 3));
        group.bench_with_input(BenchmarkId::from_parameter(burst), &burst, |b, &burst| {
            let mut queue = EventQueue::new();
            b.iter(|| {
                for event in resize_burst(burst) {
                    queue.push(event);
                }
                queue.drain()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_coalescing);
criterion_main!(benches);
