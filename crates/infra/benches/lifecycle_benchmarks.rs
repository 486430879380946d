use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pantry_auth::Actor;
use pantry_billing::GenerateBilling;
use pantry_core::{OrderId, UserId};
use pantry_events::{EventEnvelope, InMemoryEventBus};
use pantry_infra::{BillingAggregator, InMemoryDirectory, InMemoryPantryStore, OrderLifecycleManager};
use pantry_inventory::{NewPantryItem, PantryCategory, PantryItem};
use pantry_orders::{ApproveOrder, IssueOrder, Order, RequestItem};
use rust_decimal_macros::dec;
use std::sync::Arc;

type Bus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;
type Store = Arc<InMemoryPantryStore>;
type Directory = Arc<InMemoryDirectory>;

struct Fixture {
    orders: OrderLifecycleManager<Store, Bus, Directory>,
    billing: BillingAggregator<Store, Bus, Directory>,
    staff: Actor,
    member: Actor,
    item: PantryItem,
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, 12, 0, 0).unwrap()
}

fn setup(stock: i64) -> Fixture {
    let store: Store = Arc::new(InMemoryPantryStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let directory: Directory = Arc::new(InMemoryDirectory::new());
    let orders = OrderLifecycleManager::new(store.clone(), bus.clone(), directory.clone());
    let billing = BillingAggregator::new(store, bus, directory);
    let staff = Actor::staff(UserId::new());
    let item = orders
        .add_item(
            &staff,
            NewPantryItem {
                name: "Tea".to_string(),
                category: PantryCategory::Tea,
                unit_price: dec!(10),
                quantity: stock,
                expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            },
        )
        .unwrap();

    Fixture {
        orders,
        billing,
        staff,
        member: Actor::member(UserId::new()),
        item,
    }
}

impl Fixture {
    fn fulfil(&self, quantity: i64, day: u32) -> Order {
        let order = self
            .orders
            .request(
                &self.member,
                RequestItem {
                    order_id: OrderId::new(),
                    user_id: self.member.user_id,
                    item_id: self.item.id(),
                    quantity,
                    occurred_at: at(day),
                },
            )
            .unwrap();
        self.orders
            .approve(
                &self.staff,
                ApproveOrder {
                    order_id: order.id_typed(),
                    occurred_at: at(day),
                },
            )
            .unwrap();
        self.orders
            .issue(
                &self.staff,
                IssueOrder {
                    order_id: order.id_typed(),
                    occurred_at: at(day),
                },
            )
            .unwrap()
    }

    fn generate(&self) -> GenerateBilling {
        GenerateBilling {
            user_id: self.member.user_id,
            month_label: "Sep-2025".to_string(),
            occurred_at: at(30),
        }
    }
}

fn bench_order_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_lifecycle");

    // Request → approve → issue for a single order.
    group.bench_function("request_approve_issue", |b| {
        let fixture = setup(i64::MAX / 2);
        b.iter(|| black_box(fixture.fulfil(black_box(1), 10)));
    });

    group.finish();
}

fn bench_billing_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("billing_generation");

    for order_count in [10u64, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*order_count));
        group.bench_with_input(
            BenchmarkId::new("issued_orders", order_count),
            order_count,
            |b, &count| {
                let fixture = setup(count as i64 * 2);
                for n in 0..count {
                    fixture.fulfil(1, (n % 28) as u32 + 1);
                }

                b.iter(|| {
                    black_box(
                        fixture
                            .billing
                            .generate_for_user_month(&fixture.staff, fixture.generate())
                            .unwrap(),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_order_lifecycle, bench_billing_generation);
criterion_main!(benches);
