use chrono::NaiveTime;

use crate::api::scenario_dto::{ApplicationDto, ScenarioDto, SlotDto};
use crate::domain::application::application::Application;
use crate::domain::catalogue::slot::{PeriodicSlot, SlotNameCounter};
use crate::domain::catalogue::slot_catalogue::SlotCatalogue;
use crate::domain::time::periodicity::Periodicity;
use crate::domain::topology::topology::{Route, Topology};
use crate::domain::utils::id::{ApplicationName, LinkName, PeriodicSlotName};
use crate::error::{Error, Result};

/// Everything an allocation run needs: the network, its slots and the applications competing
/// for them.
#[derive(Debug)]
pub struct Scenario {
    pub topology: Topology,
    pub catalogue: SlotCatalogue,
    pub applications: Vec<Application>,
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| Error::InvalidInput(format!("Invalid time of day '{}': {}", value, e)))
}

// Helpers for the impl TryFrom<ScenarioDto> for Scenario
impl Scenario {
    fn build_topology(dto: &ScenarioDto) -> Result<Topology> {
        let mut topology = Topology::new();
        for node in &dto.nodes {
            topology.add_system_node_if_not_exists(node);
        }
        for link in &dto.links {
            topology.get_system_node(&link.from)?;
            topology.get_system_node(&link.to)?;
            topology.link(&link.name, &link.from, &link.to)?;
        }

        if !dto.endpoints.is_empty() {
            let endpoints = dto.endpoints.iter().map(|name| topology.get_system_node(name)).collect::<Result<Vec<_>>>()?;
            let nb_routes = topology.precompute_routes(&endpoints)?;
            log::debug!("Precomputed {} routes between {} endpoints", nb_routes, endpoints.len());
        }
        for route in &dto.routes {
            let nodes = route.iter().map(|name| topology.get_system_node(name)).collect::<Result<Vec<_>>>()?;
            topology.add_route(Route::new(nodes))?;
        }

        Ok(topology)
    }

    fn build_periodic_slot(topology: &Topology, dto: &SlotDto, counter: &mut SlotNameCounter) -> Result<PeriodicSlot> {
        let section = LinkName::new(dto.section.as_str());
        let Some(link) = topology.get_link(&section) else {
            return Err(Error::InvalidSlot(format!("Slot {:?} runs on unknown link {}", dto.name, dto.section)));
        };

        let name = match &dto.name {
            Some(name) => PeriodicSlotName::new(name.as_str()),
            None => counter.next_name(&section),
        };

        Ok(PeriodicSlot::new(
            section,
            name,
            parse_time_of_day(&dto.start_time)?,
            parse_time_of_day(&dto.end_time)?,
            link.from.clone(),
            link.to.clone(),
            Periodicity::parse(&dto.periodicity)?,
        ))
    }

    fn build_application(topology: &Topology, dto: &ApplicationDto) -> Result<Application> {
        Application::new(
            ApplicationName::new(dto.name.as_str()),
            topology.get_system_node(&dto.from)?,
            topology.get_system_node(&dto.to)?,
            parse_time_of_day(&dto.start_time)?,
            parse_time_of_day(&dto.end_time)?,
            Periodicity::parse(&dto.periodicity)?,
            (dto.hard_max_earlier_departure, dto.hard_min_dwell_time, dto.hard_max_later_arrival),
        )
    }
}

/// Constructs the domain model of a scenario file.
impl TryFrom<ScenarioDto> for Scenario {
    type Error = Error;

    fn try_from(dto: ScenarioDto) -> std::result::Result<Self, Self::Error> {
        // Phase 1: nodes, links and routes
        let topology = Scenario::build_topology(&dto)?;

        // Phase 2: slots
        let mut catalogue = match &dto.uniform_slots {
            Some(uniform) => SlotCatalogue::generate_uniform(&topology, uniform.trains_per_hour, uniform.duration_minutes)?,
            None => SlotCatalogue::new(),
        };
        let mut counter = SlotNameCounter::new();
        for slot_dto in &dto.slots {
            catalogue.add(Scenario::build_periodic_slot(&topology, slot_dto, &mut counter)?)?;
        }

        // Phase 3: applications
        let applications = dto.applications.iter().map(|app_dto| Scenario::build_application(&topology, app_dto)).collect::<Result<Vec<_>>>()?;

        Ok(Scenario { topology, catalogue, applications })
    }
}
