use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub route_id: Option<String>,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(default)]
    pub days_of_week: Vec<String>,
}

/// A route as served by the route catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl Route {
    pub fn origin(&self) -> Option<&Stop> {
        self.stops.first()
    }

    pub fn destination(&self) -> Option<&Stop> {
        self.stops.last()
    }

    pub fn schedule(&self, schedule_id: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == schedule_id)
    }

    /// Preselected schedule when the user has not picked one.
    pub fn default_schedule(&self) -> Option<&Schedule> {
        self.schedules.first()
    }

    /// Case-insensitive match on the route name or any stop name.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .stops
                .iter()
                .any(|stop| stop.name.to_lowercase().contains(&needle))
    }
}
