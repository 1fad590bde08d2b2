// Egg type domain model - incubation profiles and the in-memory registry
use serde::{Deserialize, Serialize};

pub const FALLBACK_EGG_TYPE_ID: &str = "chicken";

const UNKNOWN_PROFILE_INCUBATION_DAYS: u32 = 21;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggTypeProfile {
    pub id: String,
    pub name: String,
    pub target_temperature: f64,
    pub target_humidity: f64,
    pub incubation_days: u32,
    pub rotation_interval_minutes: u32,
    pub description: String,
}

impl EggTypeProfile {
    pub fn new(
        id: &str,
        name: &str,
        target_temperature: f64,
        target_humidity: f64,
        incubation_days: u32,
        rotation_interval_minutes: u32,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target_temperature,
            target_humidity,
            incubation_days,
            rotation_interval_minutes,
            description: description.to_string(),
        }
    }

    /// Profile for a store row whose id is not in the catalog yet
    fn from_unknown_row(row: &ProfileRow) -> Self {
        let mut profile = Self {
            id: row.egg_type.clone(),
            name: Self::format_name(&row.egg_type),
            target_temperature: 0.0,
            target_humidity: 0.0,
            incubation_days: UNKNOWN_PROFILE_INCUBATION_DAYS,
            rotation_interval_minutes: 0,
            description: String::new(),
        };
        profile.merge_row(row);
        profile
    }

    fn format_name(id: &str) -> String {
        // Convert "guinea_fowl" to "Guinea fowl"
        let spaced = id.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn merge(&mut self, update: &EggTypeUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(temperature) = update.target_temperature {
            self.target_temperature = temperature;
        }
        if let Some(humidity) = update.target_humidity {
            self.target_humidity = humidity;
        }
        if let Some(days) = update.incubation_days {
            self.incubation_days = days;
        }
        if let Some(interval) = update.rotation_interval_minutes {
            self.rotation_interval_minutes = interval;
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
    }

    /// Remote values win for every column the row carries
    fn merge_row(&mut self, row: &ProfileRow) {
        if let Some(temperature) = row.target_temp {
            self.target_temperature = temperature;
        }
        if let Some(humidity) = row.target_hum {
            self.target_humidity = humidity;
        }
        if let Some(interval) = row.rotation_interval {
            if interval >= 0.0 {
                self.rotation_interval_minutes = interval.round() as u32;
            }
        }
    }
}

/// Partial field update for a profile; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggTypeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_temperature: Option<f64>,
    #[serde(default)]
    pub target_humidity: Option<f64>,
    #[serde(default)]
    pub incubation_days: Option<u32>,
    #[serde(default)]
    pub rotation_interval_minutes: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One row of the profile store table, keyed by `egg_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub egg_type: String,
    #[serde(default)]
    pub min_temp: Option<f64>,
    #[serde(default)]
    pub max_temp: Option<f64>,
    #[serde(default)]
    pub min_hum: Option<f64>,
    #[serde(default)]
    pub max_hum: Option<f64>,
    #[serde(default)]
    pub target_hum: Option<f64>,
    #[serde(default)]
    pub target_temp: Option<f64>,
    #[serde(default)]
    pub rotation_interval: Option<f64>,
}

impl ProfileRow {
    fn seed(
        egg_type: &str,
        temp: (f64, f64, f64),
        hum: (f64, f64, f64),
        rotation_interval: f64,
    ) -> Self {
        Self {
            egg_type: egg_type.to_string(),
            min_temp: Some(temp.0),
            max_temp: Some(temp.1),
            target_temp: Some(temp.2),
            min_hum: Some(hum.0),
            max_hum: Some(hum.1),
            target_hum: Some(hum.2),
            rotation_interval: Some(rotation_interval),
        }
    }
}

pub fn default_profiles() -> Vec<EggTypeProfile> {
    vec![
        EggTypeProfile::new(
            "chicken",
            "Chicken",
            37.5,
            60.0,
            21,
            120,
            "Standard chicken eggs with 21-day incubation period",
        ),
        EggTypeProfile::new(
            "quail",
            "Quail",
            37.8,
            65.0,
            18,
            60,
            "Small quail eggs requiring higher humidity",
        ),
        EggTypeProfile::new(
            "duck",
            "Duck",
            37.2,
            70.0,
            28,
            180,
            "Duck eggs with extended incubation period",
        ),
        EggTypeProfile::new(
            "turkey",
            "Turkey",
            37.5,
            65.0,
            28,
            120,
            "Large turkey eggs requiring careful temperature control",
        ),
    ]
}

/// Seed rows inserted into an empty profile store: (min, max, target)
pub fn default_rows() -> Vec<ProfileRow> {
    vec![
        ProfileRow::seed("chicken", (36.5, 38.5, 37.5), (55.0, 75.0, 60.0), 120.0),
        ProfileRow::seed("quail", (37.0, 38.8, 37.8), (60.0, 80.0, 65.0), 60.0),
        ProfileRow::seed("duck", (36.8, 38.2, 37.2), (65.0, 85.0, 70.0), 180.0),
        ProfileRow::seed("turkey", (36.5, 38.5, 37.5), (60.0, 75.0, 65.0), 120.0),
    ]
}

/// Catalog of incubation profiles plus the selection pointer.
///
/// Never empty: constructing from an empty list falls back to the defaults.
#[derive(Debug, Clone)]
pub struct EggTypeRegistry {
    profiles: Vec<EggTypeProfile>,
    selected_id: String,
    /// Bumped on every change of the selection pointer
    selection_generation: u64,
}

impl Default for EggTypeRegistry {
    fn default() -> Self {
        Self::new(default_profiles())
    }
}

impl EggTypeRegistry {
    pub fn new(profiles: Vec<EggTypeProfile>) -> Self {
        let mut registry = Self {
            profiles: Vec::new(),
            selected_id: FALLBACK_EGG_TYPE_ID.to_string(),
            selection_generation: 0,
        };
        for profile in profiles {
            registry.insert_or_replace(profile);
        }
        if registry.profiles.is_empty() {
            registry.profiles = default_profiles();
        }
        registry
    }

    /// Profiles in insertion order
    pub fn profiles(&self) -> &[EggTypeProfile] {
        &self.profiles
    }

    pub fn selected_id(&self) -> &str {
        &self.selected_id
    }

    /// The profile behind the selection pointer, or the first profile when
    /// the pointer is stale
    pub fn selected(&self) -> &EggTypeProfile {
        let index = self.selected_index();
        &self.profiles[index]
    }

    pub fn get(&self, id: &str) -> Option<&EggTypeProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Unknown ids are accepted; reads then fall back per `selected`
    pub fn select(&mut self, id: &str) {
        if self.selected_id != id {
            self.selected_id = id.to_string();
            self.selection_generation += 1;
        }
    }

    /// Distinguishes selections of the same id made at different times
    pub fn selection_generation(&self) -> u64 {
        self.selection_generation
    }

    pub fn update_selected(&mut self, update: &EggTypeUpdate) {
        let index = self.selected_index();
        self.profiles[index].merge(update);
    }

    /// Returns false when no profile has this id
    pub fn update_by_id(&mut self, id: &str, update: &EggTypeUpdate) -> bool {
        match self.profiles.iter_mut().find(|p| p.id == id) {
            Some(profile) => {
                profile.merge(update);
                true
            }
            None => false,
        }
    }

    /// Overlay profile store rows onto the catalog
    pub fn apply_rows(&mut self, rows: &[ProfileRow]) {
        for row in rows {
            match self.profiles.iter_mut().find(|p| p.id == row.egg_type) {
                Some(profile) => profile.merge_row(row),
                None => self.profiles.push(EggTypeProfile::from_unknown_row(row)),
            }
        }
    }

    fn selected_index(&self) -> usize {
        self.profiles
            .iter()
            .position(|p| p.id == self.selected_id)
            .unwrap_or(0)
    }

    fn insert_or_replace(&mut self, profile: EggTypeProfile) {
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }
}
