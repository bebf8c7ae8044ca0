use crate::error::{Result, TallyError};
use std::collections::HashMap;

/// Fixed-order set of label names with a name → index map.
///
/// Counters and pie slices are stored by index; the name is kept for
/// lookups from producers and for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelSet {
    /// Build a label set. Rejects an empty list, repeated names and names
    /// that cannot round-trip through a `label:count` line.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = labels.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(TallyError::EmptyLabels);
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if !is_storable(name) {
                return Err(TallyError::InvalidLabel(name.clone()));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(TallyError::DuplicateLabel(name.clone()));
            }
        }

        Ok(Self { names, index })
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn is_storable(name: &str) -> bool {
    !name.contains(&[':', '\n', '\r'][..])
}
