//! Service Catalog Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entry::Partition;

/// Smallest accepted party
pub const MIN_PARTY_SIZE: u32 = 1;

/// Largest accepted party, regardless of service type
pub const MAX_PARTY_SIZE: u32 = 20;

/// Service type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    DineIn,
    Takeout,
    Delivery,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::DineIn,
        ServiceType::Takeout,
        ServiceType::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::DineIn => "dine-in",
            ServiceType::Takeout => "takeout",
            ServiceType::Delivery => "delivery",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine-in" => Ok(ServiceType::DineIn),
            "takeout" => Ok(ServiceType::Takeout),
            "delivery" => Ok(ServiceType::Delivery),
            other => Err(format!("unknown service type: {}", other)),
        }
    }
}

/// A location served by a service type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDefinition {
    pub name: String,
    /// Concurrent service slots (tables, counters, drivers)
    pub capacity: i64,
}

/// Service type configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub service_type: ServiceType,
    /// Display name
    pub name: String,
    pub max_party_size: u32,
    /// Default service duration (minutes) used until history exists
    pub average_service_time: f64,
    pub locations: Vec<LocationDefinition>,
}

impl ServiceDefinition {
    pub fn location(&self, name: &str) -> Option<&LocationDefinition> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn default_location(&self) -> Option<&LocationDefinition> {
        self.locations.first()
    }
}

/// Service catalog - allowed service types, locations and slot capacities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    pub services: Vec<ServiceDefinition>,
}

impl ServiceCatalog {
    /// Built-in restaurant layout
    pub fn standard() -> Self {
        fn loc(name: &str, capacity: i64) -> LocationDefinition {
            LocationDefinition {
                name: name.to_string(),
                capacity,
            }
        }

        Self {
            services: vec![
                ServiceDefinition {
                    service_type: ServiceType::DineIn,
                    name: "Dine-in".to_string(),
                    max_party_size: 20,
                    average_service_time: 45.0,
                    locations: vec![
                        loc("Main Dining", 6),
                        loc("Outdoor", 3),
                        loc("Private Room", 1),
                    ],
                },
                ServiceDefinition {
                    service_type: ServiceType::Takeout,
                    name: "Takeout".to_string(),
                    max_party_size: 10,
                    average_service_time: 15.0,
                    locations: vec![loc("Takeout Counter", 2)],
                },
                ServiceDefinition {
                    service_type: ServiceType::Delivery,
                    name: "Delivery".to_string(),
                    max_party_size: 10,
                    average_service_time: 30.0,
                    locations: vec![loc("Delivery Station", 3)],
                },
            ],
        }
    }

    pub fn get(&self, service_type: ServiceType) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.service_type == service_type)
    }

    pub fn allows(&self, service_type: ServiceType, location: &str) -> bool {
        self.get(service_type)
            .is_some_and(|s| s.location(location).is_some())
    }

    /// Raw configured capacity; callers clamp it
    pub fn capacity(&self, partition: &Partition) -> i64 {
        self.get(partition.service_type)
            .and_then(|s| s.location(&partition.location))
            .map(|l| l.capacity)
            .unwrap_or(1)
    }

    /// Sum of all slots, each clamped to at least one
    pub fn total_capacity(&self) -> i64 {
        self.services
            .iter()
            .flat_map(|s| s.locations.iter())
            .map(|l| l.capacity.max(1))
            .sum()
    }

    pub fn default_service_time(&self, service_type: ServiceType) -> Option<f64> {
        self.get(service_type).map(|s| s.average_service_time)
    }

    pub fn partitions(&self) -> Vec<Partition> {
        self.services
            .iter()
            .flat_map(|s| {
                s.locations
                    .iter()
                    .map(move |l| Partition::new(s.service_type, l.name.clone()))
            })
            .collect()
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
