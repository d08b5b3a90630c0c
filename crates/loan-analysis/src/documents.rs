//! Required documents by ownership range
//!
//! Each range maps an inclusive ownership-percentage window to the document
//! templates an owner in that window must provide.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::ownership::OwnershipEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRange {
    pub min: f64,
    pub max: f64,
    pub templates: Vec<String>,
}

impl OwnershipRange {
    pub fn contains(&self, percentage: f64) -> bool {
        percentage >= self.min && percentage <= self.max
    }

    fn validate(&self) -> Result<()> {
        let valid = self.min.is_finite()
            && self.max.is_finite()
            && 0.0 <= self.min
            && self.min <= self.max
            && self.max <= 100.0;
        if valid {
            Ok(())
        } else {
            Err(AnalysisError::InvalidOwnershipRange {
                min: self.min,
                max: self.max,
            })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentRequirements {
    ranges: Vec<OwnershipRange>,
}

impl DocumentRequirements {
    pub fn new(ranges: Vec<OwnershipRange>) -> Result<Self> {
        for range in &ranges {
            range.validate()?;
        }
        Ok(Self { ranges })
    }

    /// Standard set: every owner signs the borrower forms, 20%+ owners also
    /// guarantee and file a personal financial statement
    pub fn standard() -> Self {
        Self {
            ranges: vec![
                OwnershipRange {
                    min: 0.0,
                    max: 100.0,
                    templates: vec!["Borrower Information Form".to_string()],
                },
                OwnershipRange {
                    min: 20.0,
                    max: 100.0,
                    templates: vec![
                        "Personal Financial Statement".to_string(),
                        "Personal Guarantee".to_string(),
                        "Personal Tax Returns (3 years)".to_string(),
                    ],
                },
            ],
        }
    }

    pub fn ranges(&self) -> &[OwnershipRange] {
        &self.ranges
    }

    /// Templates for an owner, in configuration order, without duplicates
    pub fn documents_for(&self, percentage: f64) -> Vec<String> {
        let mut documents: Vec<String> = Vec::new();
        for range in self.ranges.iter().filter(|r| r.contains(percentage)) {
            for template in &range.templates {
                if !documents.contains(template) {
                    documents.push(template.clone());
                }
            }
        }
        documents
    }

    /// Required documents per current owner
    pub fn for_owners(&self, owners: &[OwnershipEntry]) -> Vec<(String, Vec<String>)> {
        owners
            .iter()
            .map(|o| (o.name.clone(), self.documents_for(o.ownership_percentage)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64, templates: &[&str]) -> OwnershipRange {
        OwnershipRange {
            min,
            max,
            templates: templates.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        assert!(DocumentRequirements::new(vec![range(30.0, 20.0, &[])]).is_err());
        assert!(DocumentRequirements::new(vec![range(-1.0, 20.0, &[])]).is_err());
        assert_eq!(
            DocumentRequirements::new(vec![range(0.0, 120.0, &[])]),
            Err(AnalysisError::InvalidOwnershipRange { min: 0.0, max: 120.0 })
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let reqs = DocumentRequirements::new(vec![range(20.0, 50.0, &["PFS"])]).unwrap();
        assert_eq!(reqs.documents_for(20.0), vec!["PFS"]);
        assert_eq!(reqs.documents_for(50.0), vec!["PFS"]);
        assert!(reqs.documents_for(19.99).is_empty());
    }

    #[test]
    fn test_overlapping_ranges_deduplicated_in_order() {
        let reqs = DocumentRequirements::new(vec![
            range(0.0, 100.0, &["Form 1919", "Resume"]),
            range(20.0, 100.0, &["PFS", "Resume"]),
        ])
        .unwrap();
        assert_eq!(reqs.documents_for(25.0), vec!["Form 1919", "Resume", "PFS"]);
        assert_eq!(reqs.documents_for(10.0), vec!["Form 1919", "Resume"]);
    }

    #[test]
    fn test_standard_requirements() {
        let reqs = DocumentRequirements::standard();
        assert_eq!(reqs.documents_for(10.0).len(), 1);
        assert_eq!(reqs.documents_for(51.0).len(), 4);
    }
}
