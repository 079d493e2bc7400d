use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::allocation::linear_model::{LinearModel, Sense};
use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::catalogue::slot::Slot;
use crate::domain::dag::feasibility_dag::FeasibilityDag;
use crate::domain::utils::id::{RequestName, SlotName};
use crate::error::Result;

pub const UNIT_CAPACITY_PREFIX: &str = "ucc|";
pub const FLOW_CONSTRAINT_PREFIX: &str = "fc|";

/// Translates feasible requests into a [`LinearModel`] and solver results back into slots.
pub trait Formulation {
    fn name(&self) -> &str;

    /// Adds variables, objective and per-request constraints for a request whose DAG reaches
    /// the target.
    fn add_request(&mut self, model: &mut LinearModel, request: &SimpleApplication, dag: &FeasibilityDag) -> Result<()>;

    /// Adds the constraints spanning requests, once every request was added.
    fn finalize(&mut self, model: &mut LinearModel) -> Result<()>;

    /// The request a constraint belongs to, if it is a request constraint.
    fn request_from_constraint_name<'a>(&self, name: &'a str) -> Option<&'a str>;

    /// The slots chosen per request by `assignment`, in no particular order.
    fn extract_slots(&self, model: &LinearModel, assignment: &[bool]) -> Result<HashMap<RequestName, Vec<Arc<Slot>>>>;
}

/// `ucc|{slot}`
pub fn unit_capacity_constraint_name(slot: &SlotName) -> String {
    format!("{}{}", UNIT_CAPACITY_PREFIX, slot)
}

/// The slot name of a `ucc|{slot}` constraint.
pub fn slot_from_constraint_name(name: &str) -> Option<&str> {
    name.strip_prefix(UNIT_CAPACITY_PREFIX)
}

/// Collects, per slot, the variables whose choice occupies it.
#[derive(Debug, Clone, Default)]
pub struct SlotUsage {
    order: Vec<SlotName>,
    terms: HashMap<SlotName, Vec<usize>>,
}

impl SlotUsage {
    pub fn add(&mut self, slot: &SlotName, variable: usize) {
        if !self.terms.contains_key(slot) {
            self.order.push(slot.clone());
        }
        let terms = self.terms.entry(slot.clone()).or_default();
        if !terms.contains(&variable) {
            terms.push(variable);
        }
    }

    /// Adds one `ucc|{slot} <= 1` constraint for every slot used by at least `min_terms` variables.
    ///
    /// # Returns
    /// The number of constraints added.
    pub fn add_unit_capacity_constraints(&self, model: &mut LinearModel, min_terms: usize) -> Result<usize> {
        let mut added = 0;
        for slot in &self.order {
            let Some(vars) = self.terms.get(slot) else {
                continue;
            };
            if vars.len() < min_terms {
                continue;
            }
            let terms = vars.iter().map(|var| (*var, 1.0)).collect();
            model.add_constraint(&unit_capacity_constraint_name(slot), terms, Sense::Le, 1.0)?;
            added += 1;
        }
        Ok(added)
    }
}
