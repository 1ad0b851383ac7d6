//! Types used by the lead database.

use serde::{Deserialize, Serialize};

/// A lead record as delivered by a lead source, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl NewLead {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            phone: None,
            website: None,
        }
    }
}

/// One row of a "top N by volume" report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeEntry {
    pub key: String,
    pub leads: i64,
}

/// Column a volume report groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VolumeAxis {
    Industry,
    Country,
}

impl VolumeAxis {
    pub(crate) fn column(self) -> &'static str {
        match self {
            VolumeAxis::Industry => "industry",
            VolumeAxis::Country => "country",
        }
    }
}
