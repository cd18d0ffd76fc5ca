//! Named starting points for `DsaConfig`

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Fixpoint only, no post-condition re-scan
    Fast,

    /// Fixpoint plus post-condition check
    Balanced,

    /// Every call site re-examined, checked, detailed node report
    Thorough,

    /// Base for YAML overrides; same defaults as `Balanced`
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Self::Fast, Self::Balanced, Self::Thorough, Self::Custom];

    /// Name used in YAML files
    pub fn name(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for preset in Preset::ALL {
            assert_eq!(preset.to_string().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!(" Thorough ".parse::<Preset>().unwrap(), Preset::Thorough);
    }

    #[test]
    fn test_unknown_name() {
        match "paranoid".parse::<Preset>() {
            Err(ConfigError::UnknownPreset(name)) => assert_eq!(name, "paranoid"),
            other => panic!("expected UnknownPreset, got {other:?}"),
        }
    }
}
