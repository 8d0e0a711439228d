use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle stage of a treasury vault as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultStage {
    PreIco,
    Ico,
    Pending,
    Prelaunch,
    Active,
    Endgame,
    WinnerConfirmation,
    Refund,
}

impl VaultStage {
    pub const ALL: [VaultStage; 8] = [
        VaultStage::PreIco,
        VaultStage::Ico,
        VaultStage::Pending,
        VaultStage::Prelaunch,
        VaultStage::Active,
        VaultStage::Endgame,
        VaultStage::WinnerConfirmation,
        VaultStage::Refund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VaultStage::PreIco => "pre_ico",
            VaultStage::Ico => "ico",
            VaultStage::Pending => "pending",
            VaultStage::Prelaunch => "prelaunch",
            VaultStage::Active => "active",
            VaultStage::Endgame => "endgame",
            VaultStage::WinnerConfirmation => "winner_confirmation",
            VaultStage::Refund => "refund",
        }
    }
}

impl fmt::Display for VaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown vault stage '{0}'")]
pub struct UnknownStage(pub String);

impl FromStr for VaultStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        VaultStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_lenient_about_separators() {
        assert_eq!("pre-ico".parse::<VaultStage>(), Ok(VaultStage::PreIco));
        assert_eq!(
            "Winner Confirmation".parse::<VaultStage>(),
            Ok(VaultStage::WinnerConfirmation)
        );
        assert!("launched".parse::<VaultStage>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&VaultStage::WinnerConfirmation).unwrap();
        assert_eq!(json, "\"winner_confirmation\"");
        for stage in VaultStage::ALL {
            assert_eq!(stage.to_string().parse::<VaultStage>(), Ok(stage));
        }
    }
}
