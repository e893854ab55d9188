use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Project identifier a plugin can be enabled for.
pub type EntityId = u64;

/// Optional per-project feature. The set is closed; declaration order is the
/// order plugins appear in the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PluginId {
    #[serde(rename = "graduation")]
    Graduation,
    #[serde(rename = "github")]
    Github,
    #[serde(rename = "parts")]
    Parts,
    #[serde(rename = "video-playback")]
    VideoPlayback,
}

impl PluginId {
    pub const ALL: [PluginId; 4] = [
        PluginId::Graduation,
        PluginId::Github,
        PluginId::Parts,
        PluginId::VideoPlayback,
    ];

    /// Identifier used on the wire and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            PluginId::Graduation => "graduation",
            PluginId::Github => "github",
            PluginId::Parts => "parts",
            PluginId::VideoPlayback => "video-playback",
        }
    }

    /// Human-readable name for listings.
    pub fn label(self) -> &'static str {
        match self {
            PluginId::Graduation => "Graduation documents",
            PluginId::Github => "GitHub commit sync",
            PluginId::Parts => "Parts list",
            PluginId::VideoPlayback => "Video playback",
        }
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluginId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| StoreError::UnknownPlugin(s.to_string()))
    }
}
