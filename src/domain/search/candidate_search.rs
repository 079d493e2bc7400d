use std::sync::Arc;

use chrono::TimeDelta;
use rand::Rng;

use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::catalogue::slot::Slot;
use crate::domain::catalogue::slot_catalogue::SlotCatalogue;
use crate::domain::dag::enumeration::EnumerationResult;
use crate::domain::dag::feasibility_dag::FeasibilityDag;
use crate::domain::search::solution_candidate::SolutionCandidate;
use crate::domain::time::cyclic_time_frame::CyclicTimeFrame;
use crate::domain::topology::topology::Topology;
use crate::domain::utils::id::SystemNodeId;
use crate::error::{Error, Result};

/// Finds pruning parameters under which the DAG of `request` reaches its destination.
///
/// The request is first tried with default pruning. If that DAG misses the target, the greedy
/// earliest path within the requested window (or else within the hard window) is used to derive
/// tighter parameters that admit at least that path. The parameters of `request` are left in the
/// state the returned DAG was built with.
///
/// # Returns
/// The DAG with default pruning if no path exists at all, `Error::InternalConsistency` if the
/// greedy search and the fully relaxed DAG disagree or if the derived parameters still miss the
/// target.
pub fn find_feasible_dag(topology: &Topology, catalogue: &SlotCatalogue, request: &mut SimpleApplication) -> Result<FeasibilityDag> {
    sanity_check(topology, catalogue, request)?;

    request.params_mut().set_default_pruning();
    let dag = FeasibilityDag::construct(topology, catalogue, request)?;
    if dag.is_target_node_reached() {
        log::info!("Request {}: feasible with default pruning, {} paths", request.name, dag.nb_paths());
        return Ok(dag);
    }

    let mut earliest = earliest_path_within_requested_bounds(topology, catalogue, request)?;
    if earliest.is_none() {
        log::warn!("No path found for {} within requested bounds, trying hard bounds", request.name);
        earliest = earliest_path_within_hard_bounds(topology, catalogue, request)?;
    }

    let Some(path) = earliest else {
        log::warn!("No path found for {}, giving up", request.name);
        dag.log_infeasibilities();
        return Ok(dag);
    };

    derive_pruning_params_from_earliest_path(request, &path)?;
    let dag = FeasibilityDag::construct(topology, catalogue, request)?;
    if !dag.is_target_node_reached() {
        return Err(Error::InternalConsistency(format!("Found a path for {}, but the DAG does not reach the target", request.name)));
    }

    log::info!("Request {}: feasible with derived pruning, {} paths", request.name, dag.nb_paths());
    Ok(dag)
}

/// Checks that the fully relaxed DAG reaches the target exactly if a greedy path exists within
/// the hard bounds.
fn sanity_check(topology: &Topology, catalogue: &SlotCatalogue, request: &mut SimpleApplication) -> Result<()> {
    request.params_mut().relax_to_max();
    let max_dag = FeasibilityDag::construct(topology, catalogue, request)?;
    let earliest = earliest_path_within_hard_bounds(topology, catalogue, request)?;

    if max_dag.is_target_node_reached() != earliest.is_some() {
        return Err(Error::InternalConsistency(format!(
            "Sanity check failed for {}: relaxed DAG reaches target: {}, earliest path found: {}",
            request.name,
            max_dag.is_target_node_reached(),
            earliest.is_some()
        )));
    }
    Ok(())
}

/// Sets the soft bounds of `request` so that exactly the slack used by `path` is admitted.
fn derive_pruning_params_from_earliest_path(request: &mut SimpleApplication, path: &[Arc<Slot>]) -> Result<()> {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return Err(Error::InternalConsistency(format!("Empty earliest path for {}", request.name)));
    };
    let (start, end) = (request.start, request.end);
    let path_start = first.start;
    let path_end = last.end;

    let (max_earlier_arrival, max_later_arrival) =
        if path_end.is_within_bounds(&start, &end) { (end.distance_after(&path_end), TimeDelta::zero()) } else { (TimeDelta::zero(), path_end.distance_after(&end)) };

    let (max_later_departure, max_earlier_departure) =
        if path_start.is_within_bounds(&start, &end) { (path_start.distance_after(&start), TimeDelta::zero()) } else { (TimeDelta::zero(), start.distance_after(&path_start)) };

    let params = request.params_mut();
    params.set_max_earlier_arrival(max_earlier_arrival)?;
    params.set_max_later_arrival(max_later_arrival)?;
    params.set_max_later_departure(max_later_departure)?;
    params.set_max_earlier_departure(max_earlier_departure)?;

    let hard_min_dwell_time = params.hard_min_dwell_time();
    params.set_min_dwell_time(hard_min_dwell_time)?;

    for pair in path.windows(2) {
        let (from_slot, to_slot) = (&pair[0], &pair[1]);
        let additional = to_slot.start.distance_after(&from_slot.end) - hard_min_dwell_time;
        params.set_max_additional_dwell_time_at(to_slot.from.clone(), additional)?;
    }

    log::debug!("Derived pruning for {} from earliest path:\n{}", request.name, request.debug_info());
    Ok(())
}

/// The earliest path departing and arriving within the requested window, if any.
pub fn earliest_path_within_requested_bounds(topology: &Topology, catalogue: &SlotCatalogue, request: &SimpleApplication) -> Result<Option<Vec<Arc<Slot>>>> {
    let dwell = request.params().hard_min_dwell_time();
    let path = earliest_path(topology, catalogue, &request.from, &request.to, &request.start, dwell, &request.end)?;
    validate_earliest_path(path, request, "request")
}

/// The earliest path departing and arriving within the hard window, if any.
pub fn earliest_path_within_hard_bounds(topology: &Topology, catalogue: &SlotCatalogue, request: &SimpleApplication) -> Result<Option<Vec<Arc<Slot>>>> {
    let params = request.params();
    let path = earliest_path(topology, catalogue, &request.from, &request.to, &params.departure_hard_lower_bound(), params.hard_min_dwell_time(), &params.arrival_hard_upper_bound())?;
    validate_earliest_path(path, request, "hard")
}

fn validate_earliest_path(path: Option<Vec<Arc<Slot>>>, request: &SimpleApplication, bounds: &str) -> Result<Option<Vec<Arc<Slot>>>> {
    if let Some(path) = &path {
        let candidate = SolutionCandidate::new(path.clone(), request)?;
        log::debug!("Found earliest path within {} bounds: {}", bounds, candidate.describe_full_path());
    }
    Ok(path)
}

/// Greedy search for the path from `from` to `to` that departs no earlier than `lb` and arrives
/// by `ub`, taking the quickest slot on every hop and waiting at least `dwell` between slots.
///
/// # Returns
/// Among all paths found, the one whose arrival lies closest before `lb` in the cyclic sense;
/// the first found wins ties. `None` if no path arrives within `[lb, ub]`.
pub fn earliest_path(topology: &Topology, catalogue: &SlotCatalogue, from: &SystemNodeId, to: &SystemNodeId, lb: &CyclicTimeFrame, dwell: TimeDelta, ub: &CyclicTimeFrame) -> Result<Option<Vec<Arc<Slot>>>> {
    let mut paths: Vec<Vec<Arc<Slot>>> = Vec::new();
    let mut path: Vec<Arc<Slot>> = Vec::new();
    earliest_path_iter(topology, catalogue, from, to, lb, dwell, ub, from, &mut path, &mut paths)?;

    let mut best: Option<(TimeDelta, Vec<Arc<Slot>>)> = None;
    for path in paths {
        let Some(last) = path.last() else {
            continue;
        };
        let distance = lb.distance_after(&last.end);
        if best.as_ref().is_none_or(|(best_distance, _)| distance < *best_distance) {
            best = Some((distance, path));
        }
    }

    Ok(best.map(|(_, path)| path))
}

#[allow(clippy::too_many_arguments)]
fn earliest_path_iter(
    topology: &Topology,
    catalogue: &SlotCatalogue,
    from: &SystemNodeId,
    to: &SystemNodeId,
    lb: &CyclicTimeFrame,
    dwell: TimeDelta,
    ub: &CyclicTimeFrame,
    current: &SystemNodeId,
    path: &mut Vec<Arc<Slot>>,
    paths: &mut Vec<Vec<Arc<Slot>>>,
) -> Result<()> {
    if current == to {
        if let Some(last) = path.last() {
            if last.end.is_within_bounds(lb, ub) {
                paths.push(path.clone());
            }
        }
        return Ok(());
    }

    let earliest = match path.last() {
        Some(last) => last.end.plus(dwell),
        None => *lb,
    };

    for next in topology.get_successors(current, from, to) {
        // Successors of different routes may lead back to a node already on the path.
        if &next == from || path.iter().any(|slot| slot.to == next) {
            continue;
        }

        let slot = catalogue
            .get_quickest_slot(current, &next, &earliest)
            .map_err(|_| Error::InternalConsistency(format!("No next slot found in catalogue between {} and {}", current, next)))?;

        path.push(slot);
        earliest_path_iter(topology, catalogue, from, to, lb, dwell, ub, &next, path, paths)?;
        path.pop();
    }

    Ok(())
}

/// Enumerates all candidates of `dag`.
///
/// # Returns
/// `Error::InternalConsistency` if the DAG reaches the target but no candidate was found.
pub fn enumerate_all(dag: &FeasibilityDag) -> Result<Vec<SolutionCandidate>> {
    let result = dag.enumerate(1.0)?;
    if dag.is_target_node_reached() && result.candidates.is_empty() {
        return Err(Error::InternalConsistency(format!("DAG of {} is feasible but enumeration found nothing", dag.request().name)));
    }
    Ok(result.candidates)
}

/// Enumerates candidates of `dag`, sampling with ratios 0.1 to 0.9 if the full enumeration was
/// truncated, and keeps the enumeration whose candidates span the most complex graph.
pub fn enumerate_with_sampling(dag: &FeasibilityDag) -> Result<Vec<SolutionCandidate>> {
    let mut rng = rand::rng();
    enumerate_with_sampling_rng(dag, &mut rng)
}

/// Like [`enumerate_with_sampling`], drawing from `rng`.
pub fn enumerate_with_sampling_rng<R: Rng + ?Sized>(dag: &FeasibilityDag, rng: &mut R) -> Result<Vec<SolutionCandidate>> {
    let max_cc = dag.cyclomatic_complexity();

    let mut best_ratio = 1.0;
    let mut best: EnumerationResult = dag.enumerate_with_rng(best_ratio, rng)?;
    let mut best_cc = FeasibilityDag::cyclomatic_complexity_from_candidates(&best.candidates);
    sanity_check_cc(dag, max_cc, best_cc)?;

    if !best.everything_enumerated() {
        for i in 1..10 {
            let ratio = i as f64 / 10.0;
            let current = dag.enumerate_with_rng(ratio, rng)?;
            let current_cc = FeasibilityDag::cyclomatic_complexity_from_candidates(&current.candidates);
            log::debug!("Request {}: enumeration with ratio {} => cc {}/{}, nb {}", dag.request().name, ratio, current_cc, max_cc, current.candidates.len());
            sanity_check_cc(dag, max_cc, current_cc)?;

            if current_cc > best_cc || (current_cc == best_cc && current.candidates.len() > best.candidates.len()) {
                best_cc = current_cc;
                best_ratio = ratio;
                best = current;
            }
        }
    }

    if dag.is_target_node_reached() && best_cc == 0 {
        return Err(Error::InternalConsistency(format!("DAG of {} is feasible but enumeration found nothing", dag.request().name)));
    }

    log::info!("Request {}: best enumeration with ratio {} => cc {}/{}, nb {}", dag.request().name, best_ratio, best_cc, max_cc, best.candidates.len());
    Ok(best.candidates)
}

/// # Returns
/// `Error::InternalConsistency` unless `0 <= cc <= max_cc`.
pub fn sanity_check_cc(dag: &FeasibilityDag, max_cc: i64, cc: i64) -> Result<()> {
    if cc < 0 || cc > max_cc {
        return Err(Error::InternalConsistency(format!("Candidate cyclomatic complexity {} of {} is not within [0, {}]", cc, dag.request().name, max_cc)));
    }
    Ok(())
}
