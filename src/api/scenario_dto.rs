use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub nodes: Vec<String>,
    pub links: Vec<LinkDto>,

    /// Terminal nodes between which routes are precomputed.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Explicit routes, added on top of the precomputed ones.
    #[serde(default)]
    pub routes: Vec<Vec<String>>,

    #[serde(default)]
    pub slots: Vec<SlotDto>,

    /// Generates a uniform catalogue on every link instead of (or before) `slots`.
    pub uniform_slots: Option<UniformSlotsDto>,

    #[serde(default)]
    pub applications: Vec<ApplicationDto>,
}

#[derive(Debug, Deserialize)]
pub struct LinkDto {
    pub name: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    /// The link the slot runs on.
    pub section: String,

    /// Generated as `{section}_auto_{n}` if absent.
    pub name: Option<String>,

    /// `"HH:MM"`
    pub start_time: String,
    pub end_time: String,

    /// `"1111100"`, Monday first.
    pub periodicity: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformSlotsDto {
    pub trains_per_hour: u32,
    pub duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDto {
    pub name: String,
    pub from: String,
    pub to: String,
    pub start_time: String,
    pub end_time: String,
    pub periodicity: String,

    /// Minutes.
    #[serde(default)]
    pub hard_max_earlier_departure: i64,
    #[serde(default)]
    pub hard_min_dwell_time: i64,
    #[serde(default)]
    pub hard_max_later_arrival: i64,
}
