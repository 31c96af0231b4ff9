//! Device profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Phone model whose rear LED layout the timeline targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceModel {
    /// Phone (1), coarse 5-zone layout.
    #[default]
    #[serde(rename = "NP1")]
    Np1,
    /// Phone (1), 15-zone layout.
    #[serde(rename = "NP1_15")]
    Np1Fine,
    /// Phone (2), 33-zone layout.
    #[serde(rename = "NP2_33", alias = "NP2")]
    Np2,
    /// Phone (2a), 26-zone layout.
    #[serde(rename = "NP2a")]
    Np2a,
}

impl DeviceModel {
    pub fn zone_count(self) -> usize {
        match self {
            DeviceModel::Np1 => 5,
            DeviceModel::Np1Fine => 15,
            DeviceModel::Np2 => 33,
            DeviceModel::Np2a => 26,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeviceModel::Np1 => "NP1",
            DeviceModel::Np1Fine => "NP1_15",
            DeviceModel::Np2 => "NP2_33",
            DeviceModel::Np2a => "NP2a",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            DeviceModel::Np1,
            DeviceModel::Np1Fine,
            DeviceModel::Np2,
            DeviceModel::Np2a,
        ]
    }

    /// Profile whose zone count matches a matrix of `columns` columns.
    pub fn from_zone_count(columns: usize) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|model| model.zone_count() == columns)
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown device model: {0}")]
pub struct UnknownDeviceModel(pub String);

impl FromStr for DeviceModel {
    type Err = UnknownDeviceModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NP1" => Ok(DeviceModel::Np1),
            "NP1_15" => Ok(DeviceModel::Np1Fine),
            "NP2" | "NP2_33" => Ok(DeviceModel::Np2),
            "NP2A" => Ok(DeviceModel::Np2a),
            _ => Err(UnknownDeviceModel(s.to_string())),
        }
    }
}
