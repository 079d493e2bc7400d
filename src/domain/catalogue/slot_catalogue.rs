use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveTime, TimeDelta};
use slotmap::{SlotMap, new_key_type};

use crate::domain::catalogue::slot::{PeriodicSlot, Slot};
use crate::domain::time::cyclic_time_frame::{CyclicTimeFrame, format_duration};
use crate::domain::time::periodicity::Periodicity;
use crate::domain::topology::topology::Topology;
use crate::domain::utils::id::{PeriodicSlotName, SlotName, SystemNodeId};
use crate::error::{Error, Result};

new_key_type! {
    pub struct SlotKey;
}

/// Maximum deviation between the durations of two slots on the same link.
const MAX_DURATION_DEVIATION_MINUTES: i64 = 10;

/// The slots offered on every link, indexed by link and by name.
///
/// Periodic slots keep their insertion order per link. Concrete slots are stored once in the
/// arena and handed out as shared `Arc<Slot>`.
#[derive(Debug, Default)]
pub struct SlotCatalogue {
    /// Concrete slot storage.
    slots: SlotMap<SlotKey, Arc<Slot>>,

    /// Index lookup of the internal key using the concrete slot name.
    name_index: HashMap<SlotName, SlotKey>,

    periodic_slots: Vec<PeriodicSlot>,

    /// Index of every periodic slot in `periodic_slots`.
    periodic_index: HashMap<PeriodicSlotName, usize>,

    /// The concrete instances of every periodic slot, Monday first, parallel to `periodic_slots`.
    instances: Vec<Vec<SlotKey>>,

    /// Positions in `periodic_slots` per (from, to) pair, in insertion order.
    link_map: HashMap<(SystemNodeId, SystemNodeId), Vec<usize>>,
}

impl SlotCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a catalogue with `trains_per_hour` whole-week slots per hour on every link of
    /// the topology, each taking `duration_minutes`.
    pub fn generate_uniform(topology: &Topology, trains_per_hour: u32, duration_minutes: u32) -> Result<Self> {
        if trains_per_hour == 0 || trains_per_hour > 60 {
            return Err(Error::InvalidInput(format!("Trains per hour must be within [1, 60], got {}", trains_per_hour)));
        }

        let mut catalogue = SlotCatalogue::new();

        for link in topology.links() {
            for hour in 0..24 {
                for j in 0..trains_per_hour {
                    let minutes = j * (60 / trains_per_hour);
                    let arrival = hour * 60 + minutes + duration_minutes;

                    let start_time = time_of_day(hour, minutes)?;
                    let end_time = time_of_day((arrival / 60) % 24, arrival % 60)?;
                    let name = PeriodicSlotName::new(format!("{}_{:03}_{:03}", link.name, hour, j));

                    catalogue.add(PeriodicSlot::new(link.name.clone(), name, start_time, end_time, link.from.clone(), link.to.clone(), Periodicity::whole_week()))?;
                }
            }
        }

        log::debug!("Generated {} periodic slots on {} links", catalogue.nb_periodic_slots(), topology.nb_links());
        Ok(catalogue)
    }

    /// Adds a periodic slot and all its concrete instances.
    ///
    /// The catalogue is left unchanged if any check fails.
    ///
    /// # Returns
    /// * `Error::DuplicateSlot` if the periodic slot name or one of the concrete names is taken.
    /// * `Error::InconsistentDuration` if the slot takes more than 10 minutes longer or shorter
    ///   than another slot on the same link.
    /// * `Error::InvalidSlot` if an instance does not end within 24 hours of its start.
    pub fn add(&mut self, periodic_slot: PeriodicSlot) -> Result<PeriodicSlotName> {
        if self.periodic_index.contains_key(&periodic_slot.name) {
            return Err(Error::DuplicateSlot(format!("There is already a periodic slot {} in the catalogue, found for {}", periodic_slot.name, periodic_slot.section)));
        }

        let concrete_slots = periodic_slot.instantiate()?;
        let link = (periodic_slot.from.clone(), periodic_slot.to.clone());

        if let (Some(this_slot), Some(siblings)) = (concrete_slots.first(), self.link_map.get(&link)) {
            let tolerance = TimeDelta::minutes(MAX_DURATION_DEVIATION_MINUTES);

            for sibling in siblings {
                let Some(reference_key) = self.instances[*sibling].first() else {
                    continue;
                };
                let reference_slot = &self.slots[*reference_key];
                let reference_duration = reference_slot.duration();

                if this_slot.duration() < reference_duration - tolerance || this_slot.duration() > reference_duration + tolerance {
                    return Err(Error::InconsistentDuration(format!(
                        "Slot {} ({}) is more than {} minutes shorter/longer than reference slot {} ({})",
                        this_slot.name,
                        format_duration(this_slot.duration()),
                        MAX_DURATION_DEVIATION_MINUTES,
                        reference_slot.name,
                        format_duration(reference_duration)
                    )));
                }
            }
        }

        for slot in &concrete_slots {
            if self.name_index.contains_key(&slot.name) {
                return Err(Error::DuplicateSlot(format!("There is already a slot {} in the catalogue", slot.name)));
            }
        }

        let position = self.periodic_slots.len();
        let mut keys = Vec::with_capacity(concrete_slots.len());
        for slot in concrete_slots {
            let name = slot.name.clone();
            let key = self.slots.insert(Arc::new(slot));
            self.name_index.insert(name, key);
            keys.push(key);
        }

        let name = periodic_slot.name.clone();
        self.instances.push(keys);
        self.periodic_index.insert(name.clone(), position);
        self.link_map.entry(link).or_default().push(position);
        self.periodic_slots.push(periodic_slot);

        Ok(name)
    }

    pub fn get_slot(&self, name: &SlotName) -> Option<Arc<Slot>> {
        let key = self.name_index.get(name)?;
        self.slots.get(*key).cloned()
    }

    pub fn get_periodic_slot(&self, name: &PeriodicSlotName) -> Option<&PeriodicSlot> {
        self.periodic_index.get(name).map(|position| &self.periodic_slots[*position])
    }

    /// # Returns
    /// The concrete instances of the periodic slot `name`, Monday first.
    pub fn get_instances(&self, name: &PeriodicSlotName) -> Vec<Arc<Slot>> {
        match self.periodic_index.get(name) {
            Some(position) => self.instances_at(*position).collect(),
            None => Vec::new(),
        }
    }

    pub fn periodic_slots(&self) -> &[PeriodicSlot] {
        &self.periodic_slots
    }

    pub fn nb_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn nb_periodic_slots(&self) -> usize {
        self.periodic_slots.len()
    }

    pub fn log_info(&self) {
        log::info!("Catalogue holds {} periodic slots ({} slots)", self.nb_periodic_slots(), self.nb_slots());
        for periodic_slot in &self.periodic_slots {
            log::debug!("... slot {} on {} ({})", periodic_slot.name, periodic_slot.section, periodic_slot.periodicity);
        }
    }

    /// # Returns
    /// All slots on the link `from -> to` whose start lies within `[earliest, latest]`, sorted by
    /// start time. Slots with equal start keep their catalogue order. An unknown link yields an
    /// empty list.
    pub fn get_sorted_slots(&self, from: &SystemNodeId, to: &SystemNodeId, earliest: &CyclicTimeFrame, latest: &CyclicTimeFrame) -> Vec<Arc<Slot>> {
        let mut slots: Vec<Arc<Slot>> = Vec::new();
        if let Some(positions) = self.link_map.get(&(from.clone(), to.clone())) {
            for position in positions {
                slots.extend(self.instances_at(*position).filter(|slot| slot.is_start_time_contained_inclusive(earliest, latest)));
            }
        }
        slots.sort_by_key(|slot| slot.start);
        slots
    }

    /// # Returns
    /// The slot on `from -> to` departing first at or after `earliest`.
    pub fn get_next_slot(&self, from: &SystemNodeId, to: &SystemNodeId, earliest: &CyclicTimeFrame) -> Result<Arc<Slot>> {
        self.get_next_or_quickest_slot(from, to, earliest, true)
    }

    /// # Returns
    /// The slot on `from -> to` arriving first when departing at or after `earliest`.
    pub fn get_quickest_slot(&self, from: &SystemNodeId, to: &SystemNodeId, earliest: &CyclicTimeFrame) -> Result<Arc<Slot>> {
        self.get_next_or_quickest_slot(from, to, earliest, false)
    }

    /// Finds the slot on `from -> to` departing first within the 24 hours after `earliest`.
    ///
    /// # Returns
    /// `Ok(None)` if no slot departs within 24 hours, `Error::NoSuchLink` for an unknown link.
    pub fn get_next_slot_within_24(&self, from: &SystemNodeId, to: &SystemNodeId, earliest: &CyclicTimeFrame) -> Result<Option<Arc<Slot>>> {
        if !self.link_map.contains_key(&(from.clone(), to.clone())) {
            return Err(Error::NoSuchLink { from: from.to_string(), to: to.to_string() });
        }

        let mut min_distance = TimeDelta::hours(24);
        let mut best = None;
        for slot in self.get_sorted_slots(from, to, earliest, &earliest.plus_hours(24)) {
            let distance = slot.start.distance_after(earliest);
            if distance < min_distance {
                min_distance = distance;
                best = Some(slot);
            }
        }

        Ok(best)
    }

    fn get_next_or_quickest_slot(&self, from: &SystemNodeId, to: &SystemNodeId, earliest: &CyclicTimeFrame, take_start_time: bool) -> Result<Arc<Slot>> {
        let positions = self
            .link_map
            .get(&(from.clone(), to.clone()))
            .filter(|positions| !positions.is_empty())
            .ok_or_else(|| Error::NoSuchLink { from: from.to_string(), to: to.to_string() })?;

        let mut best: Option<(Arc<Slot>, TimeDelta)> = None;

        for position in positions {
            // The weekday instance departing next.
            let mut next_instance: Option<(Arc<Slot>, TimeDelta)> = None;
            for slot in self.instances_at(*position) {
                let distance = slot.start.distance_after(earliest);
                if next_instance.as_ref().is_none_or(|(_, shortest)| distance < *shortest) {
                    next_instance = Some((slot, distance));
                }
            }

            let Some((candidate, start_distance)) = next_instance else {
                log::warn!("Periodic slot {} has no week days, skipping it", self.periodic_slots[*position].name);
                continue;
            };

            let distance = if take_start_time { start_distance } else { start_distance + candidate.duration() };

            if best.as_ref().is_none_or(|(_, best_distance)| distance < *best_distance) {
                best = Some((candidate, distance));
            }
        }

        best.map(|(slot, _)| slot).ok_or_else(|| Error::NoSuchLink { from: from.to_string(), to: to.to_string() })
    }

    fn instances_at(&self, position: usize) -> impl Iterator<Item = Arc<Slot>> + '_ {
        self.instances[position].iter().filter_map(|key| self.slots.get(*key).cloned())
    }
}

fn time_of_day(hour: u32, minute: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| Error::InvalidInput(format!("Invalid time of day {:02}:{:02}", hour, minute)))
}
