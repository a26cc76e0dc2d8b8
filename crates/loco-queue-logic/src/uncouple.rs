//! Uncouple-point resolver.
//!
//! Given a cut block and the full consist ordered from end `A`, find the one
//! physical joint where the block separates from the rest. A block is only
//! actionable when it is a contiguous prefix or suffix of the consist; any
//! other shape means the cut calculator produced something the host must
//! never see.

use crate::consist::{Car, CarId, Consist, End};
use crate::error::CutError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A car and the end of it to open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UncouplePoint {
    pub car: CarId,
    pub end: End,
}

/// Find the joint that separates `block` from `consist_from_a`.
///
/// - Block touching the start of the consist: open the `B` end of its last car.
/// - Block touching the end of the consist: open the `A` end of its first car.
///
/// Block order does not matter; `[9, 8, 7, 6]` and `[6, 7, 8, 9]` resolve to
/// the same joint.
pub fn find_car_to_uncouple(
    block: &[Car],
    consist_from_a: &Consist,
) -> Result<UncouplePoint, CutError> {
    if block.is_empty() || block.len() >= consist_from_a.len() {
        return Err(CutError::InvalidCut {
            block: block.len(),
            consist: consist_from_a.len(),
        });
    }

    let first = &block[0];
    let last = &block[block.len() - 1];
    let (Some(first_index), Some(last_index)) = (
        consist_from_a.index_of(&first.id),
        consist_from_a.index_of(&last.id),
    ) else {
        let mut missing: Vec<CarId> = [first, last]
            .into_iter()
            .filter(|c| !consist_from_a.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();
        missing.dedup();
        return Err(CutError::CarsNotInConsist(missing));
    };

    let start = first_index.min(last_index);
    let end = first_index.max(last_index);
    let len = consist_from_a.len();

    // Every position between the endpoints must be in the block exactly once.
    let members: HashSet<&CarId> = block.iter().map(|c| &c.id).collect();
    let span = &consist_from_a.cars()[start..=end];
    let contiguous = members.len() == block.len()
        && span.len() == block.len()
        && span.iter().all(|c| members.contains(&c.id));
    if !contiguous {
        let strays: Vec<CarId> = block
            .iter()
            .filter(|c| !consist_from_a.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();
        if !strays.is_empty() {
            return Err(CutError::CarsNotInConsist(strays));
        }
        return Err(CutError::AmbiguousCut { start, end, len });
    }

    match (start == 0, end == len - 1) {
        (true, false) => Ok(UncouplePoint {
            car: consist_from_a.cars()[end].id.clone(),
            end: End::B,
        }),
        (false, true) => Ok(UncouplePoint {
            car: consist_from_a.cars()[start].id.clone(),
            end: End::A,
        }),
        _ => Err(CutError::AmbiguousCut { start, end, len }),
    }
}

/// The two groups produced by opening `point`, in consist order: the group
/// toward end `A` first.
pub fn split_at(
    point: &UncouplePoint,
    consist_from_a: &Consist,
) -> Option<(Vec<Car>, Vec<Car>)> {
    let index = consist_from_a.index_of(&point.car)?;
    let split = match point.end {
        End::A => index,
        End::B => index + 1,
    };
    let (head, tail) = consist_from_a.cars().split_at(split);
    Some((head.to_vec(), tail.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Consist {
        (0..n).map(|i| Car::ordinary(i.to_string())).collect()
    }

    fn cars(ids: &[u32]) -> Vec<Car> {
        ids.iter().map(|i| Car::ordinary(i.to_string())).collect()
    }

    #[test]
    fn test_prefix_opens_b_end_of_last() {
        let point = find_car_to_uncouple(&cars(&[0, 1, 2]), &numbered(10)).unwrap();
        assert_eq!(point, UncouplePoint { car: "2".into(), end: End::B });
    }

    #[test]
    fn test_suffix_opens_a_end_of_first() {
        let point = find_car_to_uncouple(&cars(&[7, 8, 9]), &numbered(10)).unwrap();
        assert_eq!(point, UncouplePoint { car: "7".into(), end: End::A });
    }

    #[test]
    fn test_reversed_suffix() {
        let point = find_car_to_uncouple(&cars(&[9, 8, 7, 6]), &numbered(10)).unwrap();
        assert_eq!(point, UncouplePoint { car: "6".into(), end: End::A });
    }

    #[test]
    fn test_reversed_prefix() {
        let point = find_car_to_uncouple(&cars(&[3, 2, 1, 0]), &numbered(10)).unwrap();
        assert_eq!(point, UncouplePoint { car: "3".into(), end: End::B });
    }

    #[test]
    fn test_cars_not_in_consist() {
        let err = find_car_to_uncouple(&cars(&[15, 16]), &numbered(10)).unwrap_err();
        assert_eq!(err, CutError::CarsNotInConsist(vec!["15".into(), "16".into()]));
    }

    #[test]
    fn test_interior_block_is_ambiguous() {
        let err = find_car_to_uncouple(&cars(&[3, 4, 5]), &numbered(10)).unwrap_err();
        assert_eq!(err, CutError::AmbiguousCut { start: 3, end: 5, len: 10 });
    }

    #[test]
    fn test_hole_in_prefix_is_ambiguous() {
        let err = find_car_to_uncouple(&cars(&[0, 1, 3]), &numbered(10)).unwrap_err();
        assert!(matches!(err, CutError::AmbiguousCut { .. }));
    }

    #[test]
    fn test_both_ends_without_middle_is_ambiguous() {
        let err = find_car_to_uncouple(&cars(&[0, 9]), &numbered(10)).unwrap_err();
        assert!(matches!(err, CutError::AmbiguousCut { .. }));
    }

    #[test]
    fn test_size_preconditions() {
        let consist = numbered(3);
        assert_eq!(
            find_car_to_uncouple(&[], &consist),
            Err(CutError::InvalidCut { block: 0, consist: 3 })
        );
        assert_eq!(
            find_car_to_uncouple(&cars(&[0, 1, 2]), &consist),
            Err(CutError::InvalidCut { block: 3, consist: 3 })
        );
    }

    #[test]
    fn test_split_groups() {
        let consist = numbered(5);
        let point = UncouplePoint { car: "1".into(), end: End::B };
        let (head, tail) = split_at(&point, &consist).unwrap();
        assert_eq!(head.len(), 2);
        assert_eq!(tail.len(), 3);
        let point = UncouplePoint { car: "3".into(), end: End::A };
        let (head, tail) = split_at(&point, &consist).unwrap();
        assert_eq!(head.len(), 3);
        assert_eq!(tail[0].id, "3".into());
    }
}
