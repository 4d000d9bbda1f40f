use crate::labels::{PlantClass, NUM_CLASSES};
use serde::Serialize;

/// Per-class scores for a single image, in `PlantClass` index order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionVector(pub [f32; NUM_CLASSES]);

impl PredictionVector {
    pub fn scores(&self) -> &[f32; NUM_CLASSES] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|score| score.is_finite())
    }
}

impl TryFrom<&[f32]> for PredictionVector {
    type Error = usize;

    /// Fails with the actual length when it is not `NUM_CLASSES`.
    fn try_from(scores: &[f32]) -> Result<Self, Self::Error> {
        scores
            .try_into()
            .map(PredictionVector)
            .map_err(|_| scores.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub class: PlantClass,
    pub confidence: f32,
}

/// Picks the highest scoring class. Ties go to the lowest index.
pub fn select_class(prediction: &PredictionVector) -> PredictionResult {
    let (class, confidence) = PlantClass::ALL
        .into_iter()
        .zip(prediction.0)
        .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
        .unwrap_or((PlantClass::EarlyBlight, prediction.0[0]));

    PredictionResult { class, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_argmax() {
        let result = select_class(&PredictionVector([0.1, 0.2, 0.7]));
        assert_eq!(result.class, PlantClass::Healthy);
        assert_eq!(result.confidence, 0.7);

        let result = select_class(&PredictionVector([0.05, 0.9, 0.05]));
        assert_eq!(result.class, PlantClass::LateBlight);
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let result = select_class(&PredictionVector([0.5, 0.5, 0.0]));
        assert_eq!(result.class, PlantClass::EarlyBlight);
        assert_eq!(result.confidence, 0.5);

        let result = select_class(&PredictionVector([0.0, 0.4, 0.4]));
        assert_eq!(result.class, PlantClass::LateBlight);
    }

    #[test]
    fn test_confidence_is_max_without_renormalizing() {
        let scores = [0.3, 0.2, 0.1];
        let result = select_class(&PredictionVector(scores));
        let max = scores.iter().copied().fold(f32::MIN, f32::max);
        assert_eq!(result.confidence, max);
        assert_eq!(result.class, PlantClass::EarlyBlight);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let vector = PredictionVector([0.33, 0.34, 0.33]);
        let first = select_class(&vector);
        for _ in 0..10 {
            assert_eq!(select_class(&vector), first);
        }
    }

    #[test]
    fn test_is_finite() {
        assert!(PredictionVector([0.1, 0.2, 0.7]).is_finite());
        assert!(!PredictionVector([f32::NAN, 0.1, 0.2]).is_finite());
        assert!(!PredictionVector([0.1, f32::NEG_INFINITY, 0.2]).is_finite());
    }

    #[test]
    fn test_try_from_slice_checks_length() {
        let vector = PredictionVector::try_from(&[0.1f32, 0.2, 0.7][..]).unwrap();
        assert_eq!(vector.scores(), &[0.1, 0.2, 0.7]);

        assert_eq!(PredictionVector::try_from(&[0.5f32, 0.5][..]), Err(2));
    }

    #[test]
    fn test_result_serializes_to_response_shape() {
        let result = PredictionResult {
            class: PlantClass::Healthy,
            confidence: 0.75,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"class": "Healthy", "confidence": 0.75})
        );
    }
}
