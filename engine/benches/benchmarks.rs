//! Performance benchmarks for fleet-engine

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fleet_engine::{
    AllocationDate, AllocationEngine, DocumentStore, EngineConfig, EntityRegistry, Filter,
    FixedClock, MemoryStore, NewAllocation, NewEmployee, NewVehicle,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

async fn seeded_engine(allocations: i64) -> (AllocationEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    let registry = EntityRegistry::new(store.clone());

    registry
        .create_employee(NewEmployee {
            name: "Bench".into(),
            department: "Ops".into(),
        })
        .await
        .unwrap();
    registry
        .create_vehicle(NewVehicle {
            model: "Van".into(),
            driver_id: 1,
            driver_name: "Driver".into(),
        })
        .await
        .unwrap();

    let engine = AllocationEngine::new(store.clone(), Arc::new(clock), EngineConfig::default());
    let base = Utc.with_ymd_and_hms(2030, 2, 1, 0, 0, 0).unwrap();
    for i in 0..allocations {
        engine
            .create_allocation(NewAllocation {
                employee_id: 1,
                vehicle_id: 1,
                allocation_date: AllocationDate::from(base + Duration::minutes(i)),
            })
            .await
            .unwrap();
    }

    (engine, store)
}

fn bench_allocations(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("allocations");

    for size in [10i64, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("create_with_conflict_check", size),
            &size,
            |b, &size| {
                let (engine, _) = rt.block_on(seeded_engine(size));
                let base = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
                let mut i = 0i64;

                b.iter(|| {
                    i += 1;
                    let request = NewAllocation {
                        employee_id: 1,
                        vehicle_id: 1,
                        allocation_date: AllocationDate::from(base + Duration::minutes(i)),
                    };
                    rt.block_on(engine.create_allocation(black_box(request)))
                })
            },
        );

        group.bench_with_input(BenchmarkId::new("list", size), &size, |b, &size| {
            let (engine, _) = rt.block_on(seeded_engine(size));
            b.iter(|| rt.block_on(engine.list_allocations()))
        });
    }

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("memory_store");

    group.bench_function("filtered_count_1000", |b| {
        let (_, store) = rt.block_on(seeded_engine(1000));
        let filter = Filter::new().eq("vehicle_id", 1);
        b.iter(|| {
            rt.block_on(store.count(fleet_engine::Collection::Allocations, black_box(&filter)))
        })
    });

    group.finish();
}

fn bench_dates(c: &mut Criterion) {
    let mut group = c.benchmark_group("dates");

    group.bench_function("parse_rfc3339", |b| {
        b.iter(|| AllocationDate::parse(black_box("2030-05-01T09:30:00+02:00")))
    });

    group.bench_function("parse_naive", |b| {
        b.iter(|| AllocationDate::parse(black_box("2030-05-01 09:30")))
    });

    group.finish();
}

criterion_group!(benches, bench_allocations, bench_store, bench_dates);
criterion_main!(benches);
