//! Ordered, unique name lists.
//!
//! A model definition owns one `NameList` per vector role (states, inputs,
//! outputs, predicted outputs). The position of a name is the index of the
//! matching slot in every vector of that role, so the list is never reordered
//! after construction.

use core::fmt;

use crate::error::{PfError, PfResult};

#[derive(Clone, PartialEq, Eq, Default)]
pub struct NameList {
    names: Vec<String>,
}

impl NameList {
    /// Build a name list, rejecting duplicates.
    ///
    /// `what` names the list in error messages (e.g. "inputs").
    pub fn new<I, S>(names: I, what: &str) -> PfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(PfError::Construction {
                    what: format!("duplicate name '{name}' in {what}"),
                });
            }
        }
        Ok(Self { names })
    }

    /// An empty list (valid for predicted outputs).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of `name`, which is also its vector index.
    pub fn index_of(&self, name: &str) -> PfResult<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PfError::UnknownName {
                name: name.to_string(),
                context: format!("[{}]", self.names.join(", ")),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Debug for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names.iter()).finish()
    }
}

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_follows_construction_order() {
        let names = NameList::new(["capacity", "resistance"], "predicted outputs").unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.index_of("capacity").unwrap(), 0);
        assert_eq!(names.index_of("resistance").unwrap(), 1);
        assert_eq!(names.get(1), Some("resistance"));
        assert_eq!(names.to_string(), "[capacity, resistance]");
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = NameList::new(["a", "b", "a"], "outputs").unwrap_err();
        assert!(matches!(err, PfError::Construction { .. }));
        assert!(err.to_string().contains("outputs"));
    }

    #[test]
    fn unknown_name_is_reported() {
        let names = NameList::new(["load"], "inputs").unwrap();
        assert!(matches!(
            names.index_of("power"),
            Err(PfError::UnknownName { .. })
        ));
        assert!(!names.contains("power"));
    }

    #[test]
    fn empty_list_is_valid() {
        let names = NameList::empty();
        assert!(names.is_empty());
        assert_eq!(names.iter().count(), 0);
    }
}
