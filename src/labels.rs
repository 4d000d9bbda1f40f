use serde::{Serialize, Serializer};
use std::fmt;

pub const NUM_CLASSES: usize = 3;

/// Classes the potato leaf model was trained on, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlantClass {
    EarlyBlight,
    LateBlight,
    Healthy,
}

impl PlantClass {
    pub const ALL: [PlantClass; NUM_CLASSES] = [
        PlantClass::EarlyBlight,
        PlantClass::LateBlight,
        PlantClass::Healthy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlantClass::EarlyBlight => "Early Blight",
            PlantClass::LateBlight => "Late Blight",
            PlantClass::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for PlantClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PlantClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_table_is_total_and_ordered() {
        let labels: Vec<&str> = PlantClass::ALL.iter().map(|class| class.label()).collect();
        assert_eq!(labels, vec!["Early Blight", "Late Blight", "Healthy"]);
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels: std::collections::HashSet<&str> =
            PlantClass::ALL.iter().map(|class| class.label()).collect();
        assert_eq!(labels.len(), NUM_CLASSES);
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&PlantClass::LateBlight).unwrap();
        assert_eq!(json, "\"Late Blight\"");
        assert_eq!(PlantClass::Healthy.to_string(), "Healthy");
    }
}
