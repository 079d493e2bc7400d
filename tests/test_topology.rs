mod common;

use train_path_allocation::domain::topology::topology::{Route, Topology};
use train_path_allocation::domain::utils::id::SystemNodeId;
use train_path_allocation::error::Error;

fn node(name: &str) -> SystemNodeId {
    SystemNodeId::new(name)
}

fn route(names: &[&str]) -> Route {
    Route::new(names.iter().map(|name| node(name)).collect())
}

/// 1 -> 2 -> {3, 3bis} -> 4
fn forked_topology() -> Topology {
    let mut topology = Topology::new();
    topology.link("link_1_2", "n1", "n2").unwrap();
    topology.link("link_2_3", "n2", "n3").unwrap();
    topology.link("link_2_3bis", "n2", "n3bis").unwrap();
    topology.link("link_3_4", "n3", "n4").unwrap();
    topology.link("link_3bis_4", "n3bis", "n4").unwrap();
    topology
}

#[test]
fn test_is_linked() {
    let mut topology = Topology::new();
    topology.link("link1", "node", "successor1").unwrap();
    topology.link("link2", "node", "successor2").unwrap();

    assert!(topology.is_linked(&node("node"), &node("successor1")));
    assert!(topology.is_linked(&node("node"), &node("successor2")));
    assert!(!topology.is_linked(&node("successor1"), &node("node")));
    assert!(!topology.is_linked(&node("successor2"), &node("node")));
    assert!(!topology.is_linked(&node("successor1"), &node("successor2")));
    assert!(!topology.is_linked(&node("node"), &node("node")));

    let result = topology.link("self", "node", "node");
    assert!(matches!(result, Err(Error::InvalidLink(_))), "A self loop must be rejected, got {:?}", result);
}

#[test]
fn test_link_creates_nodes_once() {
    let mut topology = Topology::new();
    topology.link("a_b", "a", "b").unwrap();
    topology.link("b_c", "b", "c").unwrap();

    assert_eq!(topology.system_nodes().len(), 3, "Nodes a, b and c should exist exactly once");
    assert_eq!(topology.nb_links(), 2);
    assert!(topology.get_system_node("c").is_ok());
    assert!(matches!(topology.get_system_node("d"), Err(Error::UnknownNode(_))));
}

#[test]
fn test_duplicate_link_names() {
    let mut topology = Topology::new();
    topology.link("ab", "a", "b").unwrap();

    // Same name, same pair.
    topology.link("ab", "a", "b").unwrap();
    assert_eq!(topology.nb_links(), 1);

    // Same name, other pair.
    let result = topology.link("ab", "b", "a");
    assert!(matches!(result, Err(Error::DuplicateLinkName { .. })), "Expected DuplicateLinkName, got {:?}", result);
    assert!(!topology.is_linked(&node("b"), &node("a")));

    // Same pair, other name: kept under the first name.
    topology.link("ab_again", "a", "b").unwrap();
    assert_eq!(topology.nb_links(), 1);
    assert_eq!(topology.get_link_between(&node("a"), &node("b")).unwrap().name.as_str(), "ab");
}

#[test]
fn test_routes_on_single_route() {
    let mut topology = Topology::new();
    topology.link("link1", "n1", "n2").unwrap();
    topology.link("link2", "n2", "n3").unwrap();
    topology.link("link3", "n3", "n4").unwrap();
    topology.add_route(route(&["n1", "n2", "n3", "n4"])).unwrap();

    let names = ["n1", "n2", "n3", "n4"];
    for (i, from) in names.iter().enumerate() {
        for (j, to) in names.iter().enumerate() {
            let expected = if j > i { 1 } else { 0 };
            assert_eq!(topology.get_routes(&node(from), &node(to)).len(), expected, "Routes from {} to {}", from, to);
        }
    }

    let sub_routes = topology.get_routes(&node("n2"), &node("n4"));
    assert_eq!(sub_routes[0], route(&["n2", "n3", "n4"]));
}

#[test]
fn test_routes_on_forked_routes() {
    let mut topology = forked_topology();
    topology.add_route(route(&["n1", "n2", "n3", "n4"])).unwrap();
    topology.add_route(route(&["n1", "n2", "n3bis", "n4"])).unwrap();

    assert_eq!(topology.get_routes(&node("n1"), &node("n1")).len(), 0);
    assert_eq!(topology.get_routes(&node("n1"), &node("n2")).len(), 1, "The common prefix is reported once");
    assert_eq!(topology.get_routes(&node("n1"), &node("n3")).len(), 1);
    assert_eq!(topology.get_routes(&node("n1"), &node("n3bis")).len(), 1);
    assert_eq!(topology.get_routes(&node("n1"), &node("n4")).len(), 2);
    assert_eq!(topology.get_routes(&node("n2"), &node("n4")).len(), 2);
    assert_eq!(topology.get_routes(&node("n3"), &node("n3bis")).len(), 0);
    assert_eq!(topology.get_routes(&node("n3bis"), &node("n4")).len(), 1);
    assert_eq!(topology.get_routes(&node("n4"), &node("n1")).len(), 0);
}

#[test]
fn test_add_route_rejects_invalid_routes() {
    let mut topology = forked_topology();

    assert!(matches!(topology.add_route(route(&["n1"])), Err(Error::InvalidRoute(_))), "A route needs two nodes");
    assert!(matches!(topology.add_route(route(&["n1", "n3"])), Err(Error::InvalidRoute(_))), "n1 and n3 are not linked");
    assert!(topology.routes().is_empty());
}

#[test]
fn test_get_successors() {
    let mut topology = forked_topology();
    let nb_routes = topology.precompute_routes(&[node("n1"), node("n4")]).unwrap();
    assert_eq!(nb_routes, 2, "Two routes lead from n1 to n4, none back");

    assert_eq!(topology.get_successors(&node("n1"), &node("n1"), &node("n2")).len(), 1);
    assert_eq!(topology.get_successors(&node("n1"), &node("n1"), &node("n1")).len(), 0);
    assert_eq!(topology.get_successors(&node("n1"), &node("n1"), &node("n4")).len(), 1);
    assert_eq!(topology.get_successors(&node("n2"), &node("n1"), &node("n4")).len(), 2);
    assert_eq!(topology.get_successors(&node("n2"), &node("n4"), &node("n1")).len(), 0);
}

#[test]
fn test_find_routes() {
    let topology = forked_topology();

    let routes = topology.find_routes(&node("n1"), &node("n4"));
    assert_eq!(routes.len(), 2);
    assert!(routes.contains(&route(&["n1", "n2", "n3", "n4"])));
    assert!(routes.contains(&route(&["n1", "n2", "n3bis", "n4"])));

    assert!(topology.find_routes(&node("n4"), &node("n1")).is_empty());
    assert!(topology.find_routes(&node("n1"), &node("n1")).is_empty());
}

#[test]
fn test_diamond() {
    let topology = common::diamond_topology();

    assert_eq!(topology.get_routes(&node("A"), &node("D")).len(), 2);

    let successors = topology.get_successors(&node("B"), &node("A"), &node("D"));
    assert_eq!(successors, vec![node("C"), node("C'")]);
}

#[test]
fn test_large_topology_routes() {
    let topology = common::large_topology();

    assert_eq!(topology.nb_links(), 50);
    assert_eq!(topology.system_nodes().len(), 26);

    // Every ordered pair of distinct end points is connected by exactly one simple route.
    assert_eq!(topology.routes().len(), 12);

    let routes = topology.get_routes(&node("A1"), &node("D1"));
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].len(), 18, "A1 - A4, M1 - M10 and D4 - D1");

    assert_eq!(topology.get_successors(&node("M1"), &node("A1"), &node("D1")), vec![node("M2")]);
    assert_eq!(topology.get_successors(&node("M10"), &node("D1"), &node("A1")), vec![node("M9")]);
}

#[test]
fn test_tiny_topology_routes() {
    let topology = common::tiny_topology();

    assert_eq!(topology.routes().len(), 12);
    assert_eq!(topology.get_routes(&node("A1"), &node("B1"))[0], route(&["A1", "M1", "B1"]));
    assert_eq!(topology.get_routes(&node("A1"), &node("C1"))[0], route(&["A1", "M1", "M2", "C1"]));
}
