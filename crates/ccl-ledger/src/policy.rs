//! # Mint Policy
//!
//! Deployment configuration for carbon accounting at mint time. The
//! issuance circuit proves a claim against a factor and threshold; the
//! policy here is what the *ledger* requires, and the two must agree —
//! a proof generated against someone else's policy does not mint here.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Mint-time carbon accounting rules.
///
/// Loadable from a JSON artifact alongside the verification keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintPolicy {
    /// Grams of CO2 displaced per kWh of verified production.
    pub carbon_factor_g_per_kwh: u64,
    /// Minimum energy claim accepted for issuance, in watt-hours.
    pub min_energy_wh: u64,
    /// Default deadline for proof verification, in seconds.
    pub verify_timeout_secs: u64,
}

impl MintPolicy {
    /// Parse a policy from its JSON artifact text.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a policy from a JSON artifact on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).map_err(std::io::Error::other)
    }

    /// The carbon amount implied by an energy claim:
    /// `energy_wh * factor / 1000`, integer division.
    ///
    /// Matches the integer semantics of the issuance circuit. Returns
    /// `None` when the product exceeds the representable range.
    pub fn expected_carbon_g(&self, energy_wh: u64) -> Option<u64> {
        let product = (energy_wh as u128) * (self.carbon_factor_g_per_kwh as u128);
        u64::try_from(product / 1000).ok()
    }

    /// The configured verification deadline as a `Duration`.
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }
}

impl Default for MintPolicy {
    fn default() -> Self {
        Self {
            carbon_factor_g_per_kwh: 400,
            min_energy_wh: 0,
            verify_timeout_secs: 30,
        }
    }
}
