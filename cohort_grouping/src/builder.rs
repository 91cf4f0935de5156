pub use crate::config::*;

use std::collections::HashSet;

/// A builder for assembling a cohort.
///
/// ```
/// pub use cohort_grouping::builder::Builder;
/// pub use cohort_grouping::{GroupingRules, Strategy};
/// # use cohort_grouping::GroupingErrors;
///
/// let rules = GroupingRules {
///     strategy: Strategy::Chunk,
///     group_size: 2,
///     ..GroupingRules::DEFAULT_RULES
/// };
/// let mut builder = Builder::new(&rules)?;
///
/// builder.add_person_simple("Anna", "1001");
/// builder.add_person_simple("Bob", "1002");
/// builder.add_person_simple("Clara", "1003");
///
/// let result = builder.run()?;
/// assert_eq!(result.groups.len(), 2);
///
/// # Ok::<(), GroupingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: GroupingRules,
    pub(crate) _attributes: Vec<Attribute>,
    pub(crate) _people: Vec<Person>,
}

impl Builder {
    pub fn new(rules: &GroupingRules) -> Result<Builder, GroupingErrors> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _attributes: Vec::new(),
            _people: Vec::new(),
        })
    }

    /// Sets the active attributes. The names must be unique.
    pub fn attributes(self, attributes: &[Attribute]) -> Result<Builder, GroupingErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for a in attributes.iter() {
            if !seen.insert(a.name.as_str()) {
                return Err(GroupingErrors::DuplicateAttribute {
                    attribute: a.name.clone(),
                });
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _attributes: attributes.to_vec(),
            _people: self._people,
        })
    }

    /// Adds a person without any questionnaire answer.
    pub fn add_person_simple(&mut self, name: &str, sid: &str) {
        self._people.push(Person::new(name, sid));
    }

    /// Adds a person with selections for the attributes.
    ///
    /// The selections are checked against the attributes already registered.
    pub fn add_person(&mut self, person: &Person) -> Result<(), GroupingErrors> {
        for (attr_name, selection) in person.selections.iter() {
            if let Some(attr) = self._attributes.iter().find(|a| a.name == *attr_name) {
                attr.checked_index(selection)?;
            }
        }
        self._people.push(person.clone());
        Ok(())
    }

    pub fn people(&self) -> &[Person] {
        &self._people
    }

    pub fn run(&self) -> Result<GroupingResult, GroupingErrors> {
        crate::run_grouping(&self._people, &self._attributes, &self._rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_attribute() -> Attribute {
        Attribute::new(
            "Mode",
            "",
            &["Online".to_string(), "In person".to_string()],
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_rules() {
        let rules = GroupingRules {
            group_size: 1,
            ..GroupingRules::DEFAULT_RULES
        };
        assert!(Builder::new(&rules).is_err());
    }

    #[test]
    fn rejects_duplicate_attributes() {
        let b = Builder::new(&GroupingRules::DEFAULT_RULES).unwrap();
        let res = b.attributes(&[mode_attribute(), mode_attribute()]);
        assert!(res.is_err());
    }

    #[test]
    fn add_person_checks_selections() {
        let mut b = Builder::new(&GroupingRules::DEFAULT_RULES)
            .unwrap()
            .attributes(&[mode_attribute()])
            .unwrap();
        let mut p = Person::new("Anna", "1");
        p.selections
            .insert("Mode".to_string(), "Hybrid".to_string());
        assert!(b.add_person(&p).is_err());
        p.selections
            .insert("Mode".to_string(), "Online".to_string());
        b.add_person(&p).unwrap();
        assert_eq!(b.people().len(), 1);
    }
}
