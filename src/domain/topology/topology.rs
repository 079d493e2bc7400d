use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::utils::id::{LinkName, SystemNodeId};
use crate::error::{Error, Result};

/// A directed section of the network between two system nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: LinkName,
    pub from: SystemNodeId,
    pub to: SystemNodeId,
}

/// A simple path through the topology, consisting of the system nodes visited in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub nodes: Vec<SystemNodeId>,
}

impl Route {
    pub fn new(nodes: Vec<SystemNodeId>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&SystemNodeId> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&SystemNodeId> {
        self.nodes.last()
    }

    pub fn position(&self, node: &SystemNodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n == node)
    }

    pub fn contains(&self, node: &SystemNodeId) -> bool {
        self.nodes.contains(node)
    }
}

/// The macroscopic network: named system nodes, named directed links and the simple routes
/// between terminal nodes along which train paths may run.
///
/// Nodes, links and routes keep their insertion order, every query that returns a list
/// returns it in that order.
#[derive(Debug, Default)]
pub struct Topology {
    /// All system nodes in insertion order.
    nodes: Vec<SystemNodeId>,

    node_set: HashSet<SystemNodeId>,

    /// All links, indexed by their unique name.
    links: HashMap<LinkName, Link>,

    /// Link names in insertion order.
    link_order: Vec<LinkName>,

    /// Lookup of the link name for a (from, to) pair. Every pair is linked at most once.
    pair_index: HashMap<(SystemNodeId, SystemNodeId), LinkName>,

    /// Outgoing neighbours per node, in link insertion order.
    adjacency: HashMap<SystemNodeId, Vec<SystemNodeId>>,

    /// The stored routes the search is restricted to.
    routes: Vec<Route>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_system_node_if_not_exists(&mut self, name: &str) -> SystemNodeId {
        let id = SystemNodeId::new(name);
        if self.node_set.insert(id.clone()) {
            self.nodes.push(id.clone());
        }
        id
    }

    pub fn get_system_node(&self, name: &str) -> Result<SystemNodeId> {
        let id = SystemNodeId::new(name);
        if !self.node_set.contains(&id) {
            return Err(Error::UnknownNode(name.to_string()));
        }
        Ok(id)
    }

    pub fn contains_node(&self, node: &SystemNodeId) -> bool {
        self.node_set.contains(node)
    }

    pub fn system_nodes(&self) -> &[SystemNodeId] {
        &self.nodes
    }

    /// Adds the directed link `name` from `from` to `to`, creating missing nodes.
    ///
    /// Adding the identical link twice is a no-op. A second name for an already linked pair is
    /// logged and ignored.
    ///
    /// # Returns
    /// `Error::DuplicateLinkName` if `name` already denotes a different pair,
    /// `Error::InvalidLink` for a blank name or a self loop.
    pub fn link(&mut self, name: &str, from: &str, to: &str) -> Result<()> {
        let link_name = LinkName::new(name);
        let from_id = SystemNodeId::new(from);
        let to_id = SystemNodeId::new(to);

        if let Some(existing) = self.links.get(&link_name) {
            if existing.from == from_id && existing.to == to_id {
                return Ok(());
            }
            return Err(Error::DuplicateLinkName { name: name.to_string(), from: existing.from.to_string(), to: existing.to.to_string() });
        }

        if let Some(existing_name) = self.pair_index.get(&(from_id.clone(), to_id.clone())) {
            log::warn!("Link ({}, {}) already exists under the name {}, skipping {}", from, to, existing_name, name);
            return Ok(());
        }

        if name.trim().is_empty() {
            return Err(Error::InvalidLink(format!("Link ({}, {}) must have a non blank name", from, to)));
        }
        if from_id == to_id {
            return Err(Error::InvalidLink(format!("Link {} connects node {} to itself", name, from)));
        }

        self.add_system_node_if_not_exists(from);
        self.add_system_node_if_not_exists(to);

        self.pair_index.insert((from_id.clone(), to_id.clone()), link_name.clone());
        self.adjacency.entry(from_id.clone()).or_default().push(to_id.clone());
        self.link_order.push(link_name.clone());
        self.links.insert(link_name.clone(), Link { name: link_name, from: from_id, to: to_id });

        Ok(())
    }

    pub fn is_linked(&self, from: &SystemNodeId, to: &SystemNodeId) -> bool {
        self.pair_index.contains_key(&(from.clone(), to.clone()))
    }

    pub fn get_link(&self, name: &LinkName) -> Option<&Link> {
        self.links.get(name)
    }

    pub fn get_link_between(&self, from: &SystemNodeId, to: &SystemNodeId) -> Option<&Link> {
        self.pair_index.get(&(from.clone(), to.clone())).and_then(|name| self.links.get(name))
    }

    /// # Returns
    /// All link names in insertion order.
    pub fn link_names(&self) -> &[LinkName] {
        &self.link_order
    }

    /// Iterates all links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.link_order.iter().filter_map(|name| self.links.get(name))
    }

    pub fn nb_links(&self) -> usize {
        self.link_order.len()
    }

    /// Finds all simple routes from `from` to `to` using a breadth-first search over the links.
    ///
    /// A successor that is already part of the growing route is skipped. Routes are returned in
    /// order of increasing length, and a route consisting of `from` alone is never returned.
    pub fn find_routes(&self, from: &SystemNodeId, to: &SystemNodeId) -> Vec<Route> {
        let mut found_routes: Vec<Route> = Vec::new();
        let mut queue: VecDeque<Route> = VecDeque::new();
        queue.push_back(Route::new(vec![from.clone()]));

        while let Some(current_route) = queue.pop_front() {
            let Some(last) = current_route.last() else {
                continue;
            };

            if last == to {
                if current_route.len() >= 2 {
                    found_routes.push(current_route);
                }
                continue;
            }

            if let Some(successors) = self.adjacency.get(last) {
                for successor in successors {
                    if current_route.contains(successor) {
                        continue;
                    }
                    let mut next_route = current_route.clone();
                    next_route.nodes.push(successor.clone());
                    queue.push_back(next_route);
                }
            }
        }

        if found_routes.is_empty() {
            log::debug!("NoRouteFound: {} => {}", from, to);
        }

        remove_duplicate_routes(found_routes)
    }

    /// Finds the routes between every ordered pair of `end_points`.
    pub fn find_routes_by_end_points(&self, end_points: &[SystemNodeId]) -> Vec<Route> {
        let mut routes = Vec::new();
        for from in end_points {
            for to in end_points {
                routes.extend(self.find_routes(from, to));
            }
        }
        routes
    }

    /// Stores `route` for later route-restricted queries.
    ///
    /// # Returns
    /// `Error::InvalidRoute` if the route has fewer than two nodes, contains an unlinked
    /// consecutive pair or visits a node twice.
    pub fn add_route(&mut self, route: Route) -> Result<()> {
        if route.len() < 2 {
            return Err(Error::InvalidRoute(format!("A route must contain at least two nodes, got {:?}", route.nodes)));
        }

        for i in 0..route.len() - 1 {
            let node = &route.nodes[i];
            let next = &route.nodes[i + 1];
            if !self.is_linked(node, next) {
                return Err(Error::InvalidRoute(format!("{} and {} are not linked", node, next)));
            }
            if route.nodes[..=i].contains(next) {
                return Err(Error::InvalidRoute(format!("Route revisits node {}", next)));
            }
        }

        self.routes.push(route);
        Ok(())
    }

    pub fn add_routes(&mut self, routes: Vec<Route>) -> Result<()> {
        for route in routes {
            self.add_route(route)?;
        }
        Ok(())
    }

    /// Computes and stores all routes between the given terminal nodes.
    ///
    /// # Returns
    /// The number of routes stored.
    pub fn precompute_routes(&mut self, end_points: &[SystemNodeId]) -> Result<usize> {
        let routes = self.find_routes_by_end_points(end_points);
        let nb_routes = routes.len();
        self.add_routes(routes)?;
        log::debug!("Stored {} routes between {} end points", nb_routes, end_points.len());
        Ok(nb_routes)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// # Returns
    /// The parts of all stored routes that lead from `from` to `to`, without duplicates.
    pub fn get_routes(&self, from: &SystemNodeId, to: &SystemNodeId) -> Vec<Route> {
        let mut routes_found = Vec::new();
        for route in &self.routes {
            if let (Some(from_index), Some(to_index)) = (route.position(from), route.position(to)) {
                if to_index > from_index {
                    routes_found.push(Route::new(route.nodes[from_index..=to_index].to_vec()));
                }
            }
        }
        remove_duplicate_routes(routes_found)
    }

    /// # Returns
    /// The nodes directly following `node` on any stored route from `route_from` to `route_to`,
    /// without duplicates and in route order.
    pub fn get_successors(&self, node: &SystemNodeId, route_from: &SystemNodeId, route_to: &SystemNodeId) -> Vec<SystemNodeId> {
        let mut successors: Vec<SystemNodeId> = Vec::new();
        for route in self.get_routes(route_from, route_to) {
            if let Some(index) = route.position(node) {
                if let Some(successor) = route.nodes.get(index + 1) {
                    if !successors.contains(successor) {
                        successors.push(successor.clone());
                    }
                }
            }
        }
        successors
    }
}

fn remove_duplicate_routes(routes: Vec<Route>) -> Vec<Route> {
    let mut seen: HashSet<Route> = HashSet::new();
    routes.into_iter().filter(|route| seen.insert(route.clone())).collect()
}
