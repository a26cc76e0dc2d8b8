//! Typed errors raised by the cut calculator and uncouple-point resolver.

use crate::consist::{CarId, End};
use thiserror::Error;

/// A cut could not be computed or acted on.
///
/// These are data and configuration errors scoped to one waypoint order;
/// retrying the same order against the same consist gives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CutError {
    /// Block is not a contiguous prefix or suffix of the consist.
    #[error("cut block spanning positions {start}..={end} of {len} is not a prefix or suffix")]
    AmbiguousCut { start: usize, end: usize, len: usize },
    /// Block references cars that are not part of the live consist.
    #[error("cut block references cars not in the consist: {}", join_ids(.0))]
    CarsNotInConsist(Vec<CarId>),
    /// Specific-car or destination lookup came up empty.
    #[error("no car matched {0}")]
    NoMatchFound(String),
    /// Zero cars resolved for a cut the order requires.
    #[error("no cars resolved for a mandatory cut")]
    EmptyCut,
    /// Physical uncouple attempted at an open end.
    #[error("no car is coupled at end {end:?} of {car}")]
    NoAdjacentCar { car: CarId, end: End },
    /// Block size rules out any valid separation.
    #[error("a cut of {block} cars cannot separate a consist of {consist}")]
    InvalidCut { block: usize, consist: usize },
}

fn join_ids(ids: &[CarId]) -> String {
    ids.iter()
        .map(CarId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_cars() {
        let err = CutError::CarsNotInConsist(vec!["15".into(), "16".into()]);
        assert_eq!(
            err.to_string(),
            "cut block references cars not in the consist: 15, 16"
        );
        let err = CutError::NoAdjacentCar {
            car: "7".into(),
            end: End::A,
        };
        assert_eq!(err.to_string(), "no car is coupled at end A of 7");
    }
}
