use std::path::Path;

use crate::api::scenario_dto::ScenarioDto;
use crate::domain::scenario::Scenario;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a scenario file into its topology, slot catalogue and applications.
pub fn load_scenario(file_path: impl AsRef<Path>) -> Result<Scenario> {
    logger::init();
    log::info!("Logger initialized. Starting scenario construction.");

    let dto: ScenarioDto = parse_json_file::<ScenarioDto>(file_path)?;
    log::info!("JSON file parsed successfully.");

    let scenario = Scenario::try_from(dto)?;
    log::info!(
        "Scenario constructed: {} nodes, {} links, {} routes, {} slots, {} applications",
        scenario.topology.system_nodes().len(),
        scenario.topology.nb_links(),
        scenario.topology.routes().len(),
        scenario.catalogue.nb_slots(),
        scenario.applications.len()
    );

    Ok(scenario)
}
