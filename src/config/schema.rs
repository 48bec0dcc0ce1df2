use crate::advice::{Advice, AdviceSet, Coordinates};
use serde::Deserialize;
use std::fmt;

/// An advice file: metadata plus the advice entries to apply. Produced by
/// dependency-analysis tooling as a JSON report.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AdviceConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub advice: Vec<AdviceEntry>,
}

impl AdviceConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.advice.is_empty() {
            issues.push(ValidationIssue::EmptyAdviceList);
        }

        for (index, entry) in self.advice.iter().enumerate() {
            if entry.coordinates().trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    index,
                    field: "coordinates",
                });
            }

            match entry {
                AdviceEntry::Add { to, .. } => {
                    if to.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField { index, field: "to" });
                    }
                }
                AdviceEntry::Remove { from, .. } => {
                    if from.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "from",
                        });
                    }
                }
                AdviceEntry::Change {
                    from,
                    to,
                    to_coordinates,
                    ..
                } => {
                    if from.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "from",
                        });
                    }
                    if to.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField { index, field: "to" });
                    }
                    if from == to && to_coordinates.is_none() {
                        issues.push(ValidationIssue::InvalidCombo {
                            index,
                            message: "change advice with identical configurations and no new coordinates changes nothing".to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The deduplicated advice set this file describes.
    pub fn advice_set(&self) -> AdviceSet {
        self.advice.iter().map(AdviceEntry::to_advice).collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One advice entry as it appears on the wire.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AdviceEntry {
    Add {
        coordinates: String,
        to: String,
    },
    Remove {
        coordinates: String,
        from: String,
    },
    Change {
        coordinates: String,
        from: String,
        to: String,
        #[serde(default)]
        to_coordinates: Option<String>,
    },
}

impl AdviceEntry {
    pub fn coordinates(&self) -> &str {
        match self {
            AdviceEntry::Add { coordinates, .. }
            | AdviceEntry::Remove { coordinates, .. }
            | AdviceEntry::Change { coordinates, .. } => coordinates,
        }
    }

    pub fn to_advice(&self) -> Advice {
        match self {
            AdviceEntry::Add { coordinates, to } => Advice::Add {
                coordinates: Coordinates::parse(coordinates),
                to_configuration: to.clone(),
            },
            AdviceEntry::Remove { coordinates, from } => Advice::Remove {
                coordinates: Coordinates::parse(coordinates),
                from_configuration: from.clone(),
            },
            AdviceEntry::Change {
                coordinates,
                from,
                to,
                to_coordinates,
            } => Advice::Change {
                coordinates: Coordinates::parse(coordinates),
                from_configuration: from.clone(),
                to_configuration: to.clone(),
                to_coordinates: to_coordinates.as_deref().map(Coordinates::parse),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyAdviceList,
    MissingField { index: usize, field: &'static str },
    InvalidCombo { index: usize, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyAdviceList => write!(f, "advice file contains no advice"),
            ValidationIssue::MissingField { index, field } => {
                write!(f, "advice entry {index} missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { index, message } => {
                write!(f, "advice entry {index} is invalid: {message}")
            }
        }
    }
}
