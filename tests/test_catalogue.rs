mod common;

use chrono::{TimeDelta, Weekday};
use common::{periodic_slot, time};
use train_path_allocation::domain::catalogue::slot::{PeriodicSlot, SlotNameCounter};
use train_path_allocation::domain::catalogue::slot_catalogue::SlotCatalogue;
use train_path_allocation::domain::time::cyclic_time_frame::CyclicTimeFrame;
use train_path_allocation::domain::time::periodicity::Periodicity;
use train_path_allocation::domain::utils::id::{LinkName, PeriodicSlotName, SlotName, SystemNodeId};
use train_path_allocation::error::Error;

fn node(name: &str) -> SystemNodeId {
    SystemNodeId::new(name)
}

fn monday_slot(name: &str, start: (u32, u32), end: (u32, u32)) -> PeriodicSlot {
    PeriodicSlot::new(
        LinkName::new("test_link"),
        PeriodicSlotName::new(name),
        time(start.0, start.1),
        time(end.0, end.1),
        node("test_node"),
        node("test_successor"),
        Periodicity::parse("1000000").unwrap(),
    )
}

#[test]
fn test_generate_uniform() {
    let topology = common::large_topology();
    let catalogue = SlotCatalogue::generate_uniform(&topology, 2, 20).unwrap();

    // Links are directed, every one of them gets two slots per hour.
    assert_eq!(catalogue.nb_periodic_slots(), topology.nb_links() * 2 * 24);
    assert_eq!(catalogue.nb_slots(), topology.nb_links() * 2 * 24 * 7);

    let slot = catalogue.get_slot(&SlotName::new("A1_A2_005_001_1")).expect("Monday 05:30 slot on A1_A2");
    assert_eq!(slot.start, CyclicTimeFrame::new(Weekday::Mon, 5, 30));
    assert_eq!(slot.end, CyclicTimeFrame::new(Weekday::Mon, 5, 50));
    assert_eq!(slot.duration(), TimeDelta::minutes(20));

    assert!(matches!(SlotCatalogue::generate_uniform(&topology, 0, 20), Err(Error::InvalidInput(_))));
}

#[test]
fn test_get_next_slot_within_24() {
    let topology = common::large_topology();
    let catalogue = SlotCatalogue::generate_uniform(&topology, 2, 45).unwrap();

    // Slots at :00 and :30.
    let slot = catalogue.get_next_slot_within_24(&node("A2"), &node("A3"), &CyclicTimeFrame::new(Weekday::Mon, 5, 10)).unwrap().unwrap();
    assert_eq!(slot.start, CyclicTimeFrame::new(Weekday::Mon, 5, 30));

    // Across the end of the week.
    let slot = catalogue.get_next_slot_within_24(&node("M10"), &node("D4"), &CyclicTimeFrame::new(Weekday::Sun, 23, 45)).unwrap().unwrap();
    assert_eq!(slot.start, CyclicTimeFrame::new(Weekday::Mon, 0, 0));

    let result = catalogue.get_next_slot_within_24(&node("M4"), &node("D1"), &CyclicTimeFrame::new(Weekday::Sun, 23, 45));
    assert!(matches!(result, Err(Error::NoSuchLink { .. })), "M4 and D1 are not linked, got {:?}", result);
}

#[test]
fn test_get_next_slot_within_24_none() {
    let mut catalogue = SlotCatalogue::new();
    catalogue.add(monday_slot("monday_only", (5, 0), (5, 10))).unwrap();

    let from_tuesday = catalogue.get_next_slot_within_24(&node("test_node"), &node("test_successor"), &CyclicTimeFrame::new(Weekday::Tue, 5, 0)).unwrap();
    assert!(from_tuesday.is_none(), "The next Monday is more than 24 hours away");

    // Beyond 24 hours the catalogue still knows the next slot.
    let slot = catalogue.get_next_slot(&node("test_node"), &node("test_successor"), &CyclicTimeFrame::new(Weekday::Tue, 5, 0)).unwrap();
    assert_eq!(slot.name.as_str(), "monday_only_1");
}

#[test]
fn test_get_next_and_quickest_slot() {
    let topology = common::large_topology();
    let catalogue = SlotCatalogue::generate_uniform(&topology, 2, 45).unwrap();

    let earliest = CyclicTimeFrame::new(Weekday::Mon, 5, 10);
    let quickest = catalogue.get_quickest_slot(&node("A2"), &node("A3"), &earliest).unwrap();
    let next = catalogue.get_next_slot(&node("A2"), &node("A3"), &earliest).unwrap();
    assert_eq!(quickest.start, CyclicTimeFrame::new(Weekday::Mon, 5, 30));
    assert_eq!(next.start, CyclicTimeFrame::new(Weekday::Mon, 5, 30));

    let earliest = CyclicTimeFrame::new(Weekday::Sun, 23, 45);
    let quickest = catalogue.get_quickest_slot(&node("M10"), &node("D4"), &earliest).unwrap();
    assert_eq!(quickest.start, CyclicTimeFrame::new(Weekday::Mon, 0, 0));
    assert_eq!(quickest.end, CyclicTimeFrame::new(Weekday::Mon, 0, 45));

    let result = catalogue.get_quickest_slot(&node("M4"), &node("D1"), &earliest);
    assert!(matches!(result, Err(Error::NoSuchLink { .. })));
}

#[test]
fn test_quickest_differs_from_next() {
    let mut catalogue = SlotCatalogue::new();
    catalogue.add(monday_slot("slow", (5, 0), (5, 15))).unwrap();
    catalogue.add(monday_slot("fast", (5, 2), (5, 8))).unwrap();

    let earliest = CyclicTimeFrame::new(Weekday::Mon, 5, 0);
    let next = catalogue.get_next_slot(&node("test_node"), &node("test_successor"), &earliest).unwrap();
    let quickest = catalogue.get_quickest_slot(&node("test_node"), &node("test_successor"), &earliest).unwrap();

    assert_eq!(next.name.as_str(), "slow_1", "slow departs first");
    assert_eq!(quickest.name.as_str(), "fast_1", "fast arrives first");
}

#[test]
fn test_get_sorted_slots() {
    let mut catalogue = SlotCatalogue::new();
    let (from, to) = (node("test_node"), node("test_successor"));
    let earliest = CyclicTimeFrame::new(Weekday::Mon, 0, 6);
    let latest = CyclicTimeFrame::new(Weekday::Mon, 0, 10);

    assert!(catalogue.get_sorted_slots(&from, &to, &earliest, &latest).is_empty());

    catalogue.add(monday_slot("tp0", (0, 5), (0, 10))).unwrap();
    assert!(catalogue.get_sorted_slots(&from, &to, &earliest, &latest).is_empty(), "tp0 departs before the window");

    catalogue.add(monday_slot("tp1", (0, 7), (0, 10))).unwrap();
    catalogue.add(monday_slot("tp2", (0, 6), (0, 10))).unwrap();
    catalogue.add(monday_slot("tp3", (0, 10), (0, 10))).unwrap();

    let names: Vec<String> = catalogue.get_sorted_slots(&from, &to, &earliest, &latest).iter().map(|slot| slot.name.to_string()).collect();
    assert_eq!(names, vec!["tp2_1", "tp1_1", "tp3_1"], "Both bounds are inclusive and the result is sorted by start");

    let whole_day = catalogue.get_sorted_slots(&from, &to, &CyclicTimeFrame::new(Weekday::Sun, 23, 0), &CyclicTimeFrame::new(Weekday::Mon, 1, 0));
    assert_eq!(whole_day.len(), 4, "The window may wrap around the end of the week");

    assert!(catalogue.get_sorted_slots(&to, &from, &earliest, &latest).is_empty(), "Unknown links have no slots");
}

#[test]
fn test_add_rejects_duplicates_and_inconsistent_durations() {
    let mut catalogue = SlotCatalogue::new();
    catalogue.add(monday_slot("tp0", (0, 5), (0, 10))).unwrap();

    let result = catalogue.add(monday_slot("tp0", (1, 5), (1, 10)));
    assert!(matches!(result, Err(Error::DuplicateSlot(_))), "Expected DuplicateSlot, got {:?}", result);

    // 60 minutes against a 5 minute reference.
    let result = catalogue.add(monday_slot("tp4", (15, 10), (16, 10)));
    assert!(matches!(result, Err(Error::InconsistentDuration(_))), "Expected InconsistentDuration, got {:?}", result);

    assert_eq!(catalogue.nb_periodic_slots(), 1, "Failed additions leave the catalogue unchanged");
    assert_eq!(catalogue.nb_slots(), 1);
    assert!(catalogue.get_slot(&SlotName::new("tp4_1")).is_none());
}

#[test]
fn test_periodicity_instances() {
    let topology = common::single_link_topology();
    let mut catalogue = SlotCatalogue::new();

    let mut slot = periodic_slot(&topology, "XY", "p", (6, 0), (6, 30));
    slot.periodicity = Periodicity::parse("1010001").unwrap();
    catalogue.add(slot).unwrap();

    assert_eq!(catalogue.nb_slots(), 3);
    let instances: Vec<String> = catalogue.get_instances(&PeriodicSlotName::new("p")).iter().map(|slot| slot.name.to_string()).collect();
    assert_eq!(instances, vec!["p_1", "p_3", "p_7"]);
    assert!(catalogue.get_slot(&SlotName::new("p_2")).is_none());

    let wednesday = catalogue.get_slot(&SlotName::new("p_3")).unwrap();
    assert_eq!(wednesday.start, CyclicTimeFrame::new(Weekday::Wed, 6, 0));
}

#[test]
fn test_slot_over_midnight() {
    let topology = common::single_link_topology();
    let mut catalogue = SlotCatalogue::new();
    catalogue.add(periodic_slot(&topology, "XY", "night", (23, 50), (0, 10))).unwrap();

    let sunday = catalogue.get_slot(&SlotName::new("night_7")).unwrap();
    assert_eq!(sunday.end, CyclicTimeFrame::new(Weekday::Mon, 0, 10), "Sunday's instance arrives on Monday");
    assert_eq!(sunday.duration(), TimeDelta::minutes(20));

    let next = catalogue.get_next_slot(&node("X"), &node("Y"), &CyclicTimeFrame::new(Weekday::Sun, 23, 45)).unwrap();
    assert_eq!(next.name.as_str(), "night_7");
}

#[test]
fn test_slot_name_counter() {
    let mut counter = SlotNameCounter::new();
    let section = LinkName::new("XY");
    assert_eq!(counter.next_name(&section).as_str(), "XY_auto_00000");
    assert_eq!(counter.next_name(&section).as_str(), "XY_auto_00001");

    let mut other = SlotNameCounter::new();
    assert_eq!(other.next_name(&section).as_str(), "XY_auto_00000", "Counters do not share state");
}
