use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flight_booking_desk::{
    AircraftType, Airport, BookingLedger, FlightCatalog, Gender, PassengerId,
};
use rand::{seq::SliceRandom, thread_rng};

// Catalog with `flights` flights of 300 seats each, numbered from 100000
fn seeded(flights: usize) -> (FlightCatalog, Vec<String>) {
    let mut catalog = FlightCatalog::new();
    let mut numbers = Vec::with_capacity(flights);
    for i in 0..flights {
        let number = format!("{}", 100000 + i);
        let departure = Airport::ALL[i % Airport::ALL.len()];
        let destination = Airport::ALL[(i + 1) % Airport::ALL.len()];
        catalog
            .create_flight(
                &number,
                departure,
                destination,
                "2025-06-01 08:30",
                AircraftType::ALL[i % AircraftType::ALL.len()],
                300,
            )
            .unwrap();
        numbers.push(number);
    }
    (catalog, numbers)
}

fn register(ledger: &mut BookingLedger, count: usize) -> Vec<PassengerId> {
    (0..count)
        .map(|i| {
            ledger
                .register_passenger(&format!("passenger{}", i), Gender::Female, (i % 40) as u32, "13800000000")
                .unwrap()
                .id
        })
        .collect()
}

// Book, move and cancel a batch of passengers across flights of different sizes
pub fn booking_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("booking_ledger");

    for flights in [10usize, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(flights), flights, |b, &flights| {
            b.iter(|| {
                let mut rng = thread_rng();
                let (mut catalog, numbers) = seeded(flights);
                let mut ledger = BookingLedger::new();
                let ids = register(&mut ledger, 200);

                for id in &ids {
                    let number = numbers.choose(&mut rng).unwrap();
                    black_box(ledger.book(&mut catalog, *id, number).ok());
                }
                for id in &ids {
                    let number = numbers.choose(&mut rng).unwrap();
                    black_box(ledger.rebook(&mut catalog, *id, number).ok());
                }
                for id in &ids {
                    black_box(ledger.cancel(&mut catalog, *id).ok());
                }
            });
        });
    }

    group.finish();
}

fn search_benchmark(c: &mut Criterion) {
    let (catalog, _) = seeded(500);
    c.bench_function("search_route", |b| {
        b.iter(|| black_box(catalog.search(Airport::BeijingCapital, Airport::ShanghaiPudong).len()))
    });
}

criterion_group!(benches, booking_benchmark, search_benchmark);
criterion_main!(benches);
