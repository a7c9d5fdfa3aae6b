use std::collections::HashMap;

/// Encode categorical string labels as integer indices (sorted order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
    pub class_to_idx: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder on string labels.
    pub fn fit(&mut self, labels: &[String]) {
        let mut unique: Vec<String> = labels.to_vec();
        unique.sort();
        unique.dedup();
        self.classes = unique;
        self.class_to_idx = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
    }

    /// Code of a label, `None` if it was not seen during fit.
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.class_to_idx.get(label).copied()
    }
}
