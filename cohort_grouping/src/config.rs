// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The smallest group size accepted by the rules.
pub const MIN_GROUP_SIZE: u32 = 2;
/// The largest group size accepted by the rules.
pub const MAX_GROUP_SIZE: u32 = 15;
/// The flexibility assumed when a person did not answer for an attribute.
pub const DEFAULT_FLEXIBILITY: u8 = 10;

/// A questionnaire question on which students are compared.
///
/// Every pair of selections has a predetermined compatibility score, stored in
/// a square matrix indexed in the same order as `selections`.
#[derive(PartialEq, Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub description: String,
    pub selections: Vec<String>,
    pub compatibility: Vec<Vec<f64>>,
    pub weight: f64,
}

impl Attribute {
    pub fn new(
        name: &str,
        description: &str,
        selections: &[String],
        compatibility: &[Vec<f64>],
        weight: f64,
    ) -> Result<Attribute, GroupingErrors> {
        if selections.is_empty() {
            return Err(GroupingErrors::EmptySelections {
                attribute: name.to_string(),
            });
        }
        if compatibility.len() != selections.len()
            || compatibility.iter().any(|row| row.len() != selections.len())
        {
            return Err(GroupingErrors::MatrixDimensions {
                attribute: name.to_string(),
                selections: selections.len(),
                rows: compatibility.len(),
            });
        }
        if !(0.0..=1.0).contains(&weight) {
            return Err(GroupingErrors::InvalidWeight {
                attribute: name.to_string(),
                weight,
            });
        }
        Ok(Attribute {
            name: name.to_string(),
            description: description.to_string(),
            selections: selections.to_vec(),
            compatibility: compatibility.to_vec(),
            weight,
        })
    }

    pub fn selection_index(&self, selection: &str) -> Option<usize> {
        self.selections.iter().position(|s| s == selection)
    }

    /// The compatibility score between two selections of this attribute.
    pub fn selections_score(&self, s1: &str, s2: &str) -> Result<f64, GroupingErrors> {
        let i1 = self.checked_index(s1)?;
        let i2 = self.checked_index(s2)?;
        Ok(self.compatibility[i1][i2])
    }

    pub(crate) fn checked_index(&self, selection: &str) -> Result<usize, GroupingErrors> {
        self.selection_index(selection)
            .ok_or_else(|| GroupingErrors::InvalidSelection {
                attribute: self.name.clone(),
                selection: selection.to_string(),
            })
    }
}

/// The answers of the legacy Canvas quiz: when and how a student prefers to meet.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct StudyPreferences {
    pub times: Vec<String>,
    pub mode: String,
}

/// A student of the cohort.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Person {
    pub name: String,
    pub sid: String,
    /// attribute name -> selected option
    pub selections: HashMap<String, String>,
    /// attribute name -> flexibility on a 1-10 scale
    pub flexibility: HashMap<String, u8>,
    pub preferences: Option<StudyPreferences>,
}

impl Person {
    pub fn new(name: &str, sid: &str) -> Person {
        Person {
            name: name.to_string(),
            sid: sid.to_string(),
            ..Default::default()
        }
    }

    pub fn selection(&self, attribute: &str) -> Option<&str> {
        self.selections.get(attribute).map(|s| s.as_str())
    }

    pub fn flexibility_for(&self, attribute: &str) -> u8 {
        self.flexibility
            .get(attribute)
            .cloned()
            .unwrap_or(DEFAULT_FLEXIBILITY)
    }

    pub fn update_selection(
        &mut self,
        attribute: &Attribute,
        selection: &str,
    ) -> Result<(), GroupingErrors> {
        attribute.checked_index(selection)?;
        self.selections
            .insert(attribute.name.clone(), selection.to_string());
        Ok(())
    }

    pub fn update_flexibility(
        &mut self,
        attribute: &Attribute,
        score: u8,
    ) -> Result<(), GroupingErrors> {
        if !(1..=10).contains(&score) {
            return Err(GroupingErrors::InvalidFlexibility {
                person: self.name.clone(),
                attribute: attribute.name.clone(),
                score,
            });
        }
        self.flexibility.insert(attribute.name.clone(), score);
        Ok(())
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct PairStats {
    pub first: String,
    pub second: String,
    pub score: f64,
}

/// Statistics for one formed group.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupStats {
    pub name: String,
    pub members: Vec<String>,
    pub sids: Vec<String>,
    /// Group compatibility score. Not defined for groups with less than two members.
    pub gcs: Option<f64>,
    pub pcs_variance: f64,
    pub most_compatible: Option<PairStats>,
    pub least_compatible: Option<PairStats>,
    pub dominant_time: Option<String>,
    pub dominant_mode: Option<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct GroupingResult {
    pub groups: Vec<GroupStats>,
    pub gcs_mean: f64,
    pub gcs_variance: f64,
}

/// Errors that prevent the grouping from completing successfully.
#[derive(PartialEq, Debug, Clone)]
pub enum GroupingErrors {
    EmptyCohort,
    InvalidGroupSize {
        size: u32,
    },
    InfeasibleGroupBounds {
        people: usize,
        min: u32,
        max: u32,
    },
    EmptySelections {
        attribute: String,
    },
    MatrixDimensions {
        attribute: String,
        selections: usize,
        rows: usize,
    },
    InvalidWeight {
        attribute: String,
        weight: f64,
    },
    InvalidSelection {
        attribute: String,
        selection: String,
    },
    MissingSelection {
        person: String,
        attribute: String,
    },
    InvalidFlexibility {
        person: String,
        attribute: String,
        score: u8,
    },
    DuplicateAttribute {
        attribute: String,
    },
    InvalidSchedule,
    GroupFull,
    DuplicateMember {
        person: String,
    },
    NotAMember {
        person: String,
    },
}

impl Error for GroupingErrors {}

impl Display for GroupingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupingErrors::EmptyCohort => write!(f, "the cohort does not contain any person"),
            GroupingErrors::InvalidGroupSize { size } => write!(
                f,
                "group size must be between {} and {}, got {}",
                MIN_GROUP_SIZE, MAX_GROUP_SIZE, size
            ),
            GroupingErrors::InfeasibleGroupBounds { people, min, max } => write!(
                f,
                "cannot split {} people into groups of {} to {} members",
                people, min, max
            ),
            GroupingErrors::EmptySelections { attribute } => {
                write!(f, "attribute '{}' has no selections", attribute)
            }
            GroupingErrors::MatrixDimensions {
                attribute,
                selections,
                rows,
            } => write!(
                f,
                "compatibility matrix dimensions must match the number of selections for attribute '{}'. Selections: {}, matrix rows: {}",
                attribute, selections, rows
            ),
            GroupingErrors::InvalidWeight { attribute, weight } => write!(
                f,
                "weight of attribute '{}' must be between 0 and 1, got {}",
                attribute, weight
            ),
            GroupingErrors::InvalidSelection {
                attribute,
                selection,
            } => write!(
                f,
                "invalid selection '{}' for attribute '{}'",
                selection, attribute
            ),
            GroupingErrors::MissingSelection { person, attribute } => write!(
                f,
                "{} does not have a selection for attribute '{}'",
                person, attribute
            ),
            GroupingErrors::InvalidFlexibility {
                person,
                attribute,
                score,
            } => write!(
                f,
                "flexibility of {} for '{}' must be between 1 and 10, got {}",
                person, attribute, score
            ),
            GroupingErrors::DuplicateAttribute { attribute } => {
                write!(f, "attribute '{}' is defined twice", attribute)
            }
            GroupingErrors::InvalidSchedule => {
                write!(f, "the annealing schedule must cool down towards a positive temperature")
            }
            GroupingErrors::GroupFull => write!(f, "group has reached its maximum size"),
            GroupingErrors::DuplicateMember { person } => {
                write!(f, "{} is already a member of this group", person)
            }
            GroupingErrors::NotAMember { person } => {
                write!(f, "{} is not a member of this group", person)
            }
        }
    }
}

// ********* Configuration **********

/// How people are split into groups.
///
/// - Chunk keeps the input order and cuts it into consecutive groups of
/// the desired size. The last group takes the remainder.
///
/// - Preference sorts the students by their preferred meeting times and mode
/// before cutting them into groups of the desired size or one less.
///
/// - Greedy pairs the most compatible people first, within the min/max bounds.
///
/// - Annealing starts from the greedy allocation and swaps members between
/// groups to even out the compatibility of the groups.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Strategy {
    Chunk,
    Preference,
    Greedy,
    Annealing,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct AnnealingSchedule {
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    pub min_temperature: f64,
}

impl AnnealingSchedule {
    pub const DEFAULT_SCHEDULE: AnnealingSchedule = AnnealingSchedule {
        initial_temperature: 100.0,
        cooling_rate: 0.95,
        min_temperature: 0.01,
    };
}

#[derive(PartialEq, Debug, Clone)]
pub struct GroupingRules {
    pub strategy: Strategy,
    /// Desired size, used by the chunk and preference strategies.
    pub group_size: u32,
    /// Bounds, used by the greedy and annealing strategies.
    pub min_group_size: u32,
    pub max_group_size: u32,
    /// When false, the flexibility of people is ignored and the raw
    /// compatibility scores are used.
    pub use_flexibility: bool,
    pub seed: u64,
    pub annealing: AnnealingSchedule,
}

impl GroupingRules {
    pub const DEFAULT_RULES: GroupingRules = GroupingRules {
        strategy: Strategy::Greedy,
        group_size: 5,
        min_group_size: 3,
        max_group_size: 5,
        use_flexibility: true,
        seed: 0,
        annealing: AnnealingSchedule::DEFAULT_SCHEDULE,
    };

    pub fn validate(&self) -> Result<(), GroupingErrors> {
        for size in [self.group_size, self.min_group_size, self.max_group_size] {
            if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&size) {
                return Err(GroupingErrors::InvalidGroupSize { size });
            }
        }
        if self.min_group_size > self.max_group_size {
            return Err(GroupingErrors::InvalidGroupSize {
                size: self.min_group_size,
            });
        }
        let s = &self.annealing;
        // An infinite temperature never cools down.
        if !s.initial_temperature.is_finite() || !s.min_temperature.is_finite() {
            return Err(GroupingErrors::InvalidSchedule);
        }
        if !(s.cooling_rate > 0.0 && s.cooling_rate < 1.0) || s.min_temperature <= 0.0 {
            return Err(GroupingErrors::InvalidSchedule);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_attribute() -> Attribute {
        Attribute::new(
            "Mode",
            "Preferred way of meeting",
            &["Online".to_string(), "In person".to_string()],
            &[vec![1.0, 0.2], vec![0.2, 1.0]],
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn attribute_rejects_empty_selections() {
        let res = Attribute::new("Mode", "", &[], &[], 0.5);
        assert_eq!(
            res,
            Err(GroupingErrors::EmptySelections {
                attribute: "Mode".to_string()
            })
        );
    }

    #[test]
    fn attribute_rejects_ragged_matrix() {
        let res = Attribute::new(
            "Mode",
            "",
            &["a".to_string(), "b".to_string()],
            &[vec![1.0, 0.0], vec![1.0]],
            0.5,
        );
        assert!(matches!(
            res,
            Err(GroupingErrors::MatrixDimensions {
                selections: 2,
                rows: 2,
                ..
            })
        ));
    }

    #[test]
    fn attribute_rejects_weight_out_of_range() {
        let res = Attribute::new("Mode", "", &["a".to_string()], &[vec![1.0]], 1.5);
        assert!(matches!(res, Err(GroupingErrors::InvalidWeight { .. })));
    }

    #[test]
    fn selections_score_reads_the_matrix() {
        let attr = mode_attribute();
        assert_eq!(attr.selections_score("Online", "In person"), Ok(0.2));
        assert_eq!(attr.selections_score("In person", "In person"), Ok(1.0));
        assert!(attr.selections_score("Online", "Hybrid").is_err());
    }

    #[test]
    fn person_defaults_to_full_flexibility() {
        let p = Person::new("Anna", "1");
        assert_eq!(p.flexibility_for("Mode"), DEFAULT_FLEXIBILITY);
        assert_eq!(p.selection("Mode"), None);
    }

    #[test]
    fn person_updates_are_validated() {
        let attr = mode_attribute();
        let mut p = Person::new("Anna", "1");
        assert!(p.update_selection(&attr, "Hybrid").is_err());
        p.update_selection(&attr, "Online").unwrap();
        assert_eq!(p.selection("Mode"), Some("Online"));

        assert!(p.update_flexibility(&attr, 0).is_err());
        assert!(p.update_flexibility(&attr, 11).is_err());
        p.update_flexibility(&attr, 3).unwrap();
        assert_eq!(p.flexibility_for("Mode"), 3);
    }

    #[test]
    fn rules_validation() {
        assert!(GroupingRules::DEFAULT_RULES.validate().is_ok());
        let mut rules = GroupingRules::DEFAULT_RULES;
        rules.group_size = 16;
        assert_eq!(
            rules.validate(),
            Err(GroupingErrors::InvalidGroupSize { size: 16 })
        );
        let mut rules = GroupingRules::DEFAULT_RULES;
        rules.min_group_size = 6;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn schedule_must_be_finite() {
        let mut rules = GroupingRules::DEFAULT_RULES;
        rules.annealing.initial_temperature = f64::INFINITY;
        assert_eq!(rules.validate(), Err(GroupingErrors::InvalidSchedule));
        rules.annealing.initial_temperature = f64::NAN;
        assert_eq!(rules.validate(), Err(GroupingErrors::InvalidSchedule));
        let mut rules = GroupingRules::DEFAULT_RULES;
        rules.annealing.min_temperature = f64::NAN;
        assert_eq!(rules.validate(), Err(GroupingErrors::InvalidSchedule));
        let mut rules = GroupingRules::DEFAULT_RULES;
        rules.annealing.cooling_rate = 1.0;
        assert_eq!(rules.validate(), Err(GroupingErrors::InvalidSchedule));
    }
}
