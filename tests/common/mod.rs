#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveTime, Weekday};
use train_path_allocation::domain::allocation::linear_model::{LinearModel, Solver, SolverOutcome};
use train_path_allocation::domain::application::simple_application::SimpleApplication;
use train_path_allocation::domain::catalogue::slot::{PeriodicSlot, Slot};
use train_path_allocation::domain::catalogue::slot_catalogue::SlotCatalogue;
use train_path_allocation::domain::search::solution_candidate::SolutionCandidate;
use train_path_allocation::domain::time::cyclic_time_frame::CyclicTimeFrame;
use train_path_allocation::domain::time::periodicity::Periodicity;
use train_path_allocation::domain::topology::topology::Topology;
use train_path_allocation::domain::utils::id::{LinkName, PeriodicSlotName, RequestName, SlotName, SystemNodeId};
use train_path_allocation::error::Result;

/// Four branches A, B, C and D of four nodes each, joined by the main line M1 - M10. Every link
/// exists in both directions; routes are stored between A1, B1, C1 and D1.
pub fn large_topology() -> Topology {
    let forward = [
        ("A1", "A2"),
        ("A2", "A3"),
        ("A3", "A4"),
        ("A4", "M1"),
        ("B1", "B2"),
        ("B2", "B3"),
        ("B3", "B4"),
        ("B4", "M1"),
        ("C1", "C2"),
        ("C2", "C3"),
        ("C3", "C4"),
        ("C4", "M10"),
        ("D1", "D2"),
        ("D2", "D3"),
        ("D3", "D4"),
        ("D4", "M10"),
        ("M1", "M2"),
        ("M2", "M3"),
        ("M3", "M4"),
        ("M4", "M5"),
        ("M5", "M6"),
        ("M6", "M7"),
        ("M7", "M8"),
        ("M8", "M9"),
        ("M9", "M10"),
    ];
    topology_with_end_points(&forward, &["A1", "B1", "C1", "D1"])
}

/// Branches A1 and B1 joined at M1, branches C1 and D1 joined at M2, M1 - M2 in between.
pub fn tiny_topology() -> Topology {
    let forward = [("A1", "M1"), ("B1", "M1"), ("M1", "M2"), ("C1", "M2"), ("D1", "M2")];
    topology_with_end_points(&forward, &["A1", "B1", "C1", "D1"])
}

fn topology_with_end_points(forward: &[(&str, &str)], end_points: &[&str]) -> Topology {
    let mut topology = Topology::new();
    for (from, to) in forward {
        topology.link(&format!("{}_{}", from, to), from, to).expect("link");
    }
    for (from, to) in forward {
        topology.link(&format!("{}_{}", to, from), to, from).expect("link");
    }

    let end_points: Vec<SystemNodeId> = end_points.iter().map(|name| SystemNodeId::new(*name)).collect();
    topology.precompute_routes(&end_points).expect("routes");
    topology
}

/// A -> B -> {C, C'} -> D with routes between A and D.
pub fn diamond_topology() -> Topology {
    let mut topology = Topology::new();
    topology.link("A_B", "A", "B").expect("link");
    topology.link("B_C", "B", "C").expect("link");
    topology.link("B_C'", "B", "C'").expect("link");
    topology.link("C_D", "C", "D").expect("link");
    topology.link("C'_D", "C'", "D").expect("link");
    topology.precompute_routes(&[SystemNodeId::new("A"), SystemNodeId::new("D")]).expect("routes");
    topology
}

/// The single link X -> Y named "XY".
pub fn single_link_topology() -> Topology {
    let mut topology = Topology::new();
    topology.link("XY", "X", "Y").expect("link");
    topology.precompute_routes(&[SystemNodeId::new("X"), SystemNodeId::new("Y")]).expect("routes");
    topology
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub fn monday(hour: u32, minute: u32) -> CyclicTimeFrame {
    CyclicTimeFrame::new(Weekday::Mon, hour, minute)
}

/// A whole-week periodic slot on the link `section` of `topology`.
pub fn periodic_slot(topology: &Topology, section: &str, name: &str, start: (u32, u32), end: (u32, u32)) -> PeriodicSlot {
    let link = topology.get_link(&LinkName::new(section)).expect("known link");
    PeriodicSlot::new(LinkName::new(section), PeriodicSlotName::new(name), time(start.0, start.1), time(end.0, end.1), link.from.clone(), link.to.clone(), Periodicity::whole_week())
}

/// The catalogue of `single_link_topology` with one whole-week slot per `(name, start, end)`.
pub fn single_link_catalogue(topology: &Topology, slots: &[(&str, (u32, u32), (u32, u32))]) -> SlotCatalogue {
    let mut catalogue = SlotCatalogue::new();
    for (name, start, end) in slots {
        catalogue.add(periodic_slot(topology, "XY", name, *start, *end)).expect("add slot");
    }
    catalogue
}

/// A Monday request with hard bounds (earlier departure, min dwell, later arrival) in minutes.
pub fn request(name: &str, from: &str, to: &str, start: (u32, u32), end: (u32, u32), hard_bounds: (i64, i64, i64)) -> SimpleApplication {
    SimpleApplication::new(RequestName::new(name), SystemNodeId::new(from), SystemNodeId::new(to), monday(start.0, start.1), monday(end.0, end.1), hard_bounds).expect("valid request")
}

/// A Monday slot `slot{i}` from `N{i}` to `N{i+1}`, departing 30 minutes after its predecessor
/// and taking 20 minutes.
pub fn chained_slot(i: u32) -> Arc<Slot> {
    let start = monday(5, 0).plus(chrono::TimeDelta::minutes(30 * (i as i64 - 1)));
    Arc::new(Slot {
        name: SlotName::new(format!("slot{}", i)),
        periodic_slot: PeriodicSlotName::new(format!("periodic{}", i)),
        section: LinkName::new(format!("N{}_N{}", i, i + 1)),
        start,
        end: start.plus(chrono::TimeDelta::minutes(20)),
        from: SystemNodeId::new(format!("N{}", i)),
        to: SystemNodeId::new(format!("N{}", i + 1)),
    })
}

/// A candidate running exactly over `slots`, for a request spanning them.
pub fn candidate(slots: &[u32]) -> SolutionCandidate {
    let path: Vec<Arc<Slot>> = slots.iter().map(|i| chained_slot(*i)).collect();
    let (first, last) = (path[0].clone(), path[path.len() - 1].clone());
    let request = SimpleApplication::new(RequestName::new("r"), first.from.clone(), last.to.clone(), first.start, last.end, (0, 0, 0)).expect("valid request");
    SolutionCandidate::new(path, &request).expect("valid candidate")
}

/// Brute force 0-1 solver for small models. An infeasible model is answered with an
/// irreducible infeasible subsystem found by the deletion filter.
pub struct ExhaustiveSolver;

impl ExhaustiveSolver {
    fn best_assignment(model: &LinearModel, active: &[bool]) -> Option<Vec<bool>> {
        let n = model.nb_variables();
        assert!(n <= 20, "model too large for the exhaustive solver");

        let mut best: Option<(f64, Vec<bool>)> = None;
        for mask in 0u32..(1 << n) {
            let assignment: Vec<bool> = (0..n).map(|i| mask & (1 << i) != 0).collect();
            let feasible = model.constraints().iter().zip(active).filter(|(_, on)| **on).all(|(constraint, _)| constraint.is_satisfied(&assignment));
            if !feasible {
                continue;
            }
            let value = model.objective_value(&assignment);
            if best.as_ref().is_none_or(|(best_value, _)| value < *best_value) {
                best = Some((value, assignment));
            }
        }
        best.map(|(_, assignment)| assignment)
    }
}

impl Solver for ExhaustiveSolver {
    fn optimize(&self, model: &LinearModel) -> Result<SolverOutcome> {
        let mut active = vec![true; model.nb_constraints()];
        if let Some(assignment) = Self::best_assignment(model, &active) {
            return Ok(SolverOutcome::Optimal(assignment));
        }

        for i in 0..active.len() {
            active[i] = false;
            if Self::best_assignment(model, &active).is_some() {
                active[i] = true;
            }
        }

        let iis = model.constraints().iter().zip(&active).filter(|(_, on)| **on).map(|(constraint, _)| constraint.name.clone()).collect();
        Ok(SolverOutcome::Infeasible(iis))
    }
}
