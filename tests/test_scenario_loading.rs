mod common;

use std::fs;
use std::path::PathBuf;

use common::ExhaustiveSolver;
use train_path_allocation::domain::allocation::allocation_problem::AllocationProblem;
use train_path_allocation::domain::allocation::path_based::PathBasedFormulation;
use train_path_allocation::domain::utils::id::{PeriodicSlotName, RequestName, SlotName, SystemNodeId};
use train_path_allocation::error::{Error, ErrorKind};
use train_path_allocation::load_scenario;

const LINE_SCENARIO: &str = r#"{
    "nodes": ["X", "Y", "Z"],
    "links": [
        { "name": "XY", "from": "X", "to": "Y" },
        { "name": "YZ", "from": "Y", "to": "Z" }
    ],
    "endpoints": ["X", "Z"],
    "routes": [["X", "Y"]],
    "slots": [
        { "section": "XY", "name": "xy_morning", "startTime": "05:00", "endTime": "05:20", "periodicity": "1111100" },
        { "section": "YZ", "startTime": "06:00", "endTime": "06:20", "periodicity": "1000000" },
        { "section": "YZ", "startTime": "07:00", "endTime": "07:20", "periodicity": "0100000" }
    ],
    "applications": [
        { "name": "app", "from": "X", "to": "Z", "startTime": "05:00", "endTime": "06:20", "periodicity": "1000000" }
    ]
}"#;

fn write_scenario(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("scenario_{}_{}.json", name, std::process::id()));
    fs::write(&path, content).expect("Failed to write scenario file");
    path
}

#[test]
fn test_load_line_scenario() {
    let path = write_scenario("line", LINE_SCENARIO);
    let scenario = load_scenario(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(scenario.topology.system_nodes().len(), 3);
    assert_eq!(scenario.topology.nb_links(), 2);
    assert_eq!(scenario.topology.routes().len(), 2, "X -> Z precomputed, X -> Y given explicitly");
    assert_eq!(scenario.topology.get_routes(&SystemNodeId::new("X"), &SystemNodeId::new("Z")).len(), 1);

    assert_eq!(scenario.catalogue.nb_periodic_slots(), 3);
    assert_eq!(scenario.catalogue.nb_slots(), 7, "Five weekdays plus one Monday plus one Tuesday");
    assert_eq!(scenario.catalogue.get_instances(&PeriodicSlotName::new("YZ_auto_00000")).len(), 1);
    assert!(scenario.catalogue.get_slot(&SlotName::new("YZ_auto_00001_2")).is_some(), "Unnamed slots are numbered per catalogue");

    assert_eq!(scenario.applications.len(), 1);
    let children: Vec<&str> = scenario.applications[0].children().map(|request| request.name.as_str()).collect();
    assert_eq!(children, vec!["app_1"]);
}

#[test]
fn test_loaded_scenario_allocates() {
    let path = write_scenario("allocate", LINE_SCENARIO);
    let scenario = load_scenario(&path).unwrap();
    fs::remove_file(&path).ok();

    let mut problem = AllocationProblem::from_applications(&scenario.topology, &scenario.catalogue, scenario.applications.clone());
    let allocations = problem.solve(&mut PathBasedFormulation::new(), &ExhaustiveSolver, false).unwrap();

    let candidate = allocations.allocation(&RequestName::new("app_1")).expect("app_1 is allocated");
    let slots: Vec<&str> = candidate.path().iter().map(|slot| slot.name.as_str()).collect();
    assert_eq!(slots, vec!["xy_morning_1", "YZ_auto_00000_1"]);
}

#[test]
fn test_uniform_slots() {
    let content = r#"{
        "nodes": ["X", "Y"],
        "links": [{ "name": "XY", "from": "X", "to": "Y" }],
        "uniformSlots": { "trainsPerHour": 2, "durationMinutes": 20 }
    }"#;
    let path = write_scenario("uniform", content);
    let scenario = load_scenario(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(scenario.catalogue.nb_periodic_slots(), 48);
    assert_eq!(scenario.catalogue.nb_slots(), 48 * 7);
    assert!(scenario.applications.is_empty());
}

#[test]
fn test_slot_on_unknown_link() {
    let content = r#"{
        "nodes": ["X", "Y"],
        "links": [{ "name": "XY", "from": "X", "to": "Y" }],
        "slots": [{ "section": "YX", "startTime": "05:00", "endTime": "05:20", "periodicity": "1111111" }]
    }"#;
    let path = write_scenario("unknown_link", content);
    let result = load_scenario(&path);
    fs::remove_file(&path).ok();

    assert!(matches!(result, Err(Error::InvalidSlot(_))), "Expected InvalidSlot, got {:?}", result.map(|_| ()));
}

#[test]
fn test_link_to_undeclared_node() {
    let content = r#"{
        "nodes": ["X"],
        "links": [{ "name": "XY", "from": "X", "to": "Y" }]
    }"#;
    let path = write_scenario("undeclared_node", content);
    let result = load_scenario(&path);
    fs::remove_file(&path).ok();

    assert!(matches!(result, Err(Error::UnknownNode(_))), "Expected UnknownNode, got {:?}", result.map(|_| ()));
}

#[test]
fn test_invalid_time_and_periodicity() {
    let bad_time = LINE_SCENARIO.replace("\"05:20\"", "\"5h20\"");
    let path = write_scenario("bad_time", &bad_time);
    let error = load_scenario(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert_eq!(error.kind(), ErrorKind::InvalidInput);

    let bad_periodicity = LINE_SCENARIO.replace("\"1111100\"", "\"11111\"");
    let path = write_scenario("bad_periodicity", &bad_periodicity);
    let error = load_scenario(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(matches!(error, Error::InvalidPattern(_)), "Expected InvalidPattern, got {:?}", error);
}

#[test]
fn test_malformed_and_missing_files() {
    let path = write_scenario("malformed", "{ \"nodes\": [\"X\"], ");
    let result = load_scenario(&path);
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(Error::DeserializationError(_))));

    let missing = std::env::temp_dir().join("scenario_that_does_not_exist.json");
    let error = load_scenario(&missing).unwrap_err();
    assert!(matches!(error, Error::IoError(_)));
    assert_eq!(error.kind(), ErrorKind::Io);
}
