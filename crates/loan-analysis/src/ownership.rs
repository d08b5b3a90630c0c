//! Ownership eligibility checks
//!
//! Two independent rules are evaluated on every run:
//! - risky ownership: an ineligible current owner, or an ineligible former
//!   owner who left recently and is still tied to the business
//! - total ownership: current owners must add up to 100%

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::constants;
use crate::parse::lenient_number;

/// Citizenship status as recorded on the ownership form.
///
/// Statuses other than the three standard ones are kept verbatim and count
/// as eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitizenshipStatus {
    UsCitizen,
    LawfulPermanentResident,
    Ineligible,
    Other(String),
}

impl CitizenshipStatus {
    pub fn is_ineligible(&self) -> bool {
        matches!(self, CitizenshipStatus::Ineligible)
    }
}

impl std::str::FromStr for CitizenshipStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "U.S. Citizen" => CitizenshipStatus::UsCitizen,
            "Lawful Permanent Resident" => CitizenshipStatus::LawfulPermanentResident,
            constants::INELIGIBLE_CITIZENSHIP => CitizenshipStatus::Ineligible,
            other => CitizenshipStatus::Other(other.to_string()),
        })
    }
}

impl std::fmt::Display for CitizenshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CitizenshipStatus::UsCitizen => write!(f, "U.S. Citizen"),
            CitizenshipStatus::LawfulPermanentResident => write!(f, "Lawful Permanent Resident"),
            CitizenshipStatus::Ineligible => write!(f, "{}", constants::INELIGIBLE_CITIZENSHIP),
            CitizenshipStatus::Other(status) => write!(f, "{}", status),
        }
    }
}

impl Serialize for CitizenshipStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CitizenshipStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let status = match raw.parse::<CitizenshipStatus>() {
            Ok(status) => status,
            Err(never) => match never {},
        };
        if let CitizenshipStatus::Other(other) = &status {
            debug!(status = %other, "Non-standard citizenship status treated as eligible");
        }
        Ok(status)
    }
}

/// Current owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipEntry {
    pub name: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub address: String,
    /// 0-100
    #[serde(deserialize_with = "lenient_number")]
    pub ownership_percentage: f64,
    pub citizenship_status: CitizenshipStatus,
}

/// Owner who has sold or given up their stake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormerOwner {
    #[serde(flatten)]
    pub owner: OwnershipEntry,
    #[serde(default)]
    pub date_ownership_ceased: Option<NaiveDate>,
    #[serde(default)]
    pub is_still_associate: bool,
    #[serde(default)]
    pub is_still_employed: bool,
}

impl FormerOwner {
    /// Unknown cease dates never count as recent
    fn ceased_after(&self, cutoff: NaiveDate) -> bool {
        self.date_ownership_ceased.is_some_and(|ceased| ceased > cutoff)
    }

    fn still_involved(&self) -> bool {
        self.is_still_associate || self.is_still_employed
    }
}

/// Result of the total-ownership rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OwnershipTotal {
    pub total: f64,
    /// `100 - total`: positive is a shortfall, negative an excess
    pub difference: f64,
    pub mismatch: bool,
}

/// Both rule results, always computed together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipReport {
    pub has_risky_ownership: bool,
    /// Names of the owners that triggered the risky rule
    pub risky_owners: Vec<String>,
    pub total: OwnershipTotal,
    /// Owners whose percentage lies outside 0-100
    pub out_of_range: Vec<String>,
}

/// Owners of the applicant business
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ownership {
    #[serde(default)]
    pub current_owners: Vec<OwnershipEntry>,
    #[serde(default)]
    pub former_owners: Vec<FormerOwner>,
}

/// Earliest cease date (exclusive) that still counts as recent
pub fn lookback_cutoff(today: NaiveDate, lookback_months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(lookback_months))
        .unwrap_or(NaiveDate::MIN)
}

impl Ownership {
    /// Owners who make the structure ineligible
    pub fn risky_owners(&self, today: NaiveDate, lookback_months: u32) -> Vec<String> {
        let cutoff = lookback_cutoff(today, lookback_months);

        let current = self
            .current_owners
            .iter()
            .filter(|o| o.citizenship_status.is_ineligible())
            .map(|o| o.name.clone());

        let former = self
            .former_owners
            .iter()
            .filter(|f| {
                f.owner.citizenship_status.is_ineligible() && f.ceased_after(cutoff) && f.still_involved()
            })
            .map(|f| f.owner.name.clone());

        current.chain(former).collect()
    }

    pub fn has_risky_ownership(&self, today: NaiveDate, lookback_months: u32) -> bool {
        !self.risky_owners(today, lookback_months).is_empty()
    }

    pub fn total_ownership(&self) -> OwnershipTotal {
        let total: f64 = self
            .current_owners
            .iter()
            .map(|o| o.ownership_percentage)
            .sum();
        let difference = constants::FULL_OWNERSHIP_PERCENT - total;
        OwnershipTotal {
            total,
            difference,
            mismatch: difference.abs() > constants::OWNERSHIP_TOLERANCE,
        }
    }

    /// Run both rules
    pub fn validate(&self, today: NaiveDate, lookback_months: u32) -> OwnershipReport {
        let risky_owners = self.risky_owners(today, lookback_months);
        let total = self.total_ownership();
        let out_of_range = self
            .current_owners
            .iter()
            .filter(|o| !(0.0..=100.0).contains(&o.ownership_percentage))
            .map(|o| o.name.clone())
            .collect();

        debug!(
            risky = risky_owners.len(),
            total = total.total,
            "Validated ownership"
        );

        OwnershipReport {
            has_risky_ownership: !risky_owners.is_empty(),
            risky_owners,
            total,
            out_of_range,
        }
    }
}

impl OwnershipReport {
    pub fn is_eligible(&self) -> bool {
        !self.has_risky_ownership && !self.total.mismatch && self.out_of_range.is_empty()
    }

    /// Messages for the loan officer, one per problem
    pub fn alerts(&self) -> Vec<String> {
        let mut alerts = Vec::new();

        for name in &self.risky_owners {
            alerts.push(format!(
                "{} is listed as {} and affects eligibility",
                name,
                constants::INELIGIBLE_CITIZENSHIP
            ));
        }

        if self.total.mismatch {
            if self.total.difference > 0.0 {
                alerts.push(format!(
                    "Ownership totals {:.2}%, {:.2}% short of 100%",
                    self.total.total, self.total.difference
                ));
            } else {
                alerts.push(format!(
                    "Ownership totals {:.2}%, {:.2}% over 100%",
                    self.total.total,
                    self.total.difference.abs()
                ));
            }
        }

        for name in &self.out_of_range {
            alerts.push(format!("{} has an ownership percentage outside 0-100%", name));
        }

        alerts
    }
}
