//! Serializable snapshots of the service table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FlavorError, FlavorResult};
use crate::scheduler::{ServiceState, ServiceTable};

/// One service as it appears in a [`ServiceReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub type_name: String,
    pub priority: i32,
    pub state: ServiceState,
    pub configure_ms: Option<u64>,
    pub close_ms: Option<u64>,
    pub registered_at: DateTime<Utc>,
}

/// Point-in-time view of every registered service, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceReport {
    pub generated_at: DateTime<Utc>,
    pub package: String,
    pub services: Vec<ServiceEntry>,
}

impl ServiceReport {
    pub fn from_table(package: &str, table: &ServiceTable) -> Self {
        let services = table
            .records()
            .iter()
            .map(|record| ServiceEntry {
                name: record.name().to_string(),
                type_name: record.key().display_name().to_string(),
                priority: record.priority(),
                state: record.state(),
                configure_ms: record.configure_time().map(|d| d.as_millis() as u64),
                close_ms: record.close_time().map(|d| d.as_millis() as u64),
                registered_at: DateTime::<Utc>::from(record.registered_at()),
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            package: package.to_string(),
            services,
        }
    }

    /// Services that failed to configure or close.
    pub fn failures(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.services.iter().filter(|s| {
            matches!(s.state, ServiceState::ConfigureFailed | ServiceState::CloseFailed)
        })
    }

    pub fn to_json(&self) -> FlavorResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FlavorError::Config(e.to_string()))
    }

    pub fn from_json(json: &str) -> FlavorResult<Self> {
        serde_json::from_str(json).map_err(|e| FlavorError::Config(e.to_string()))
    }
}
