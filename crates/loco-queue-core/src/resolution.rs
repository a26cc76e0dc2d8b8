//! Turning a stopped order into physical cuts.
//!
//! Both passes take a fresh consist snapshot from the yard, compute every
//! block and joint with the pure cut engine, and only then touch the yard.
//! A failure before the first physical call leaves the consist untouched.

use crate::collaborators::Railyard;
use log::{debug, info, warn};
use loco_queue_logic::cut::{
    calculate_cut_for_dropoff_all_except_motive_power, calculate_cut_for_dropoff_by_count,
    calculate_cut_for_dropoff_by_destination, calculate_cut_for_pickup_all_except_motive_power,
    calculate_cut_for_pickup_by_count, calculate_cut_for_pickup_by_destination,
    filter_motive_pairs, find_cut_by_count, find_cut_by_specific_car,
    find_cuts_all_except_motive_power, find_matching_cars_by_destination,
};
use loco_queue_logic::{
    find_car_to_uncouple, Car, CarId, Consist, CountFrom, CutError, CutSelector, End,
    PostCouplingCut, UncoupleMode, UncouplePoint, WaypointOrder,
};

/// Which cars end up in the group left behind.
fn inactive_group<Y>(
    yard: &Y,
    consist: &Consist,
    block: &[Car],
    take_active_cut: bool,
) -> Vec<CarId>
where
    Y: Railyard + ?Sized,
{
    consist
        .iter()
        .filter(|car| block.iter().any(|c| c.id == car.id) != take_active_cut)
        .filter(|car| !yard.is_motive_power(car))
        .map(|car| car.id.clone())
        .collect()
}

fn apply_uncouple_effects<Y>(yard: &mut Y, order: &WaypointOrder, inactive: &[CarId])
where
    Y: Railyard + ?Sized,
{
    if inactive.is_empty() {
        return;
    }
    if order.apply_handbrakes_on_uncouple {
        yard.set_handbrakes(inactive, true);
    }
    if order.bleed_air_on_uncouple {
        yard.bleed_air(inactive);
    }
}

fn separate<Y>(yard: &mut Y, points: &[UncouplePoint]) -> Result<(), CutError>
where
    Y: Railyard + ?Sized,
{
    for point in points {
        debug!("uncoupling {} at end {:?}", point.car, point.end);
        yard.uncouple(&point.car, point.end)?;
    }
    Ok(())
}

/// Apply the order's coupling effects and post-coupling cut.
///
/// The driver performs the coupling itself on arrival; this checks that the
/// target is now part of the consist.
pub fn resolve_coupling<Y>(
    yard: &mut Y,
    locomotive: &CarId,
    order: &WaypointOrder,
) -> Result<(), CutError>
where
    Y: Railyard + ?Sized,
{
    let Some(target) = &order.couple_target else {
        return Ok(());
    };
    let consist = yard.enumerate_from(locomotive, End::A);
    let (Some(coupled_index), Some(loco_index)) =
        (consist.index_of(target), consist.index_of(locomotive))
    else {
        return Err(CutError::NoMatchFound(format!("couple target {target}")));
    };
    info!("{locomotive} coupled to {target}");

    let ids = consist.ids();
    if order.connect_air_on_couple {
        yard.connect_air(&ids);
    }
    if order.release_handbrakes_on_couple {
        yard.set_handbrakes(&ids, false);
    }

    let (pickup, select) = match &order.post_coupling_cut {
        PostCouplingCut::None => return Ok(()),
        PostCouplingCut::Pickup { select } => (true, select),
        PostCouplingCut::Dropoff { select } => (false, select),
    };

    // Far end of the coupled car first, locomotive last.
    let (ordered, idx) = if loco_index > coupled_index {
        (consist.clone(), coupled_index)
    } else {
        (consist.reversed(), consist.len() - 1 - coupled_index)
    };

    let block = match (pickup, select) {
        (true, CutSelector::Count { count }) => {
            calculate_cut_for_pickup_by_count(&ordered, idx, *count)
        }
        (false, CutSelector::Count { count }) => {
            calculate_cut_for_dropoff_by_count(&ordered, idx, *count, &*yard)
        }
        (true, CutSelector::Destination { target }) => {
            calculate_cut_for_pickup_by_destination(&ordered, idx, target, &*yard)
        }
        (false, CutSelector::Destination { target }) => {
            calculate_cut_for_dropoff_by_destination(&ordered, idx, target, &*yard, &*yard)
        }
        (true, CutSelector::AllExceptMotivePower) => {
            calculate_cut_for_pickup_all_except_motive_power(&ordered, idx, &*yard)
        }
        (false, CutSelector::AllExceptMotivePower) => {
            calculate_cut_for_dropoff_all_except_motive_power(&ordered, idx, &*yard)
        }
    };
    let block = filter_motive_pairs(block, &ordered, &*yard);
    if block.is_empty() {
        info!("{locomotive}: post-coupling cut at {target} selected no cars");
        return Ok(());
    }

    let point = find_car_to_uncouple(&block, &consist)?;
    let inactive = inactive_group(&*yard, &consist, &block, false);
    separate(yard, std::slice::from_ref(&point))?;
    apply_uncouple_effects(yard, order, &inactive);
    info!(
        "{locomotive}: left {} cars behind after coupling to {target}",
        block.len()
    );
    Ok(())
}

/// Apply the order's uncouple directive.
pub fn resolve_uncoupling<Y>(
    yard: &mut Y,
    locomotive: &CarId,
    order: &WaypointOrder,
) -> Result<(), CutError>
where
    Y: Railyard + ?Sized,
{
    if order.uncouple.is_none() {
        return Ok(());
    }
    let consist = yard.enumerate_from(locomotive, End::A);
    let nearest = yard.nearest_end(locomotive, &order.location);
    let front = match order.count_from {
        CountFrom::NearestToWaypoint => nearest,
        CountFrom::FurthestFromWaypoint => nearest.opposite(),
    };
    let ordered = yard.enumerate_from(locomotive, front);
    let exclude = order.exclude_matched_from_cut;

    let blocks = match &order.uncouple {
        UncoupleMode::None => return Ok(()),
        UncoupleMode::ByCount { count } => vec![find_cut_by_count(&ordered, *count)],
        UncoupleMode::ByDestination { target } => vec![find_matching_cars_by_destination(
            &ordered, target, &*yard, exclude,
        )?],
        UncoupleMode::BySpecificCar { query } => {
            vec![find_cut_by_specific_car(&ordered, query, exclude)?]
        }
        UncoupleMode::AllExceptMotivePower => {
            let blocks = find_cuts_all_except_motive_power(&ordered, &*yard);
            if blocks.is_empty() {
                info!("{locomotive}: no motive-power boundaries to cut");
                return Ok(());
            }
            blocks
        }
    };

    let all_except = matches!(order.uncouple, UncoupleMode::AllExceptMotivePower);
    let mut points = Vec::with_capacity(blocks.len());
    let mut cut_blocks = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.is_empty() {
            return Err(CutError::EmptyCut);
        }
        let block = filter_motive_pairs(block, &ordered, &*yard);
        if block.is_empty() {
            warn!("{locomotive}: cut would split a locomotive from its tender, skipping");
            continue;
        }
        points.push(find_car_to_uncouple(&block, &consist)?);
        cut_blocks.push(block);
    }
    if points.is_empty() {
        return Ok(());
    }

    let inactive: Vec<CarId> = if all_except {
        consist
            .iter()
            .filter(|car| !yard.is_motive_power(car))
            .map(|car| car.id.clone())
            .collect()
    } else {
        inactive_group(&*yard, &consist, &cut_blocks[0], order.take_active_cut)
    };

    separate(yard, &points)?;
    apply_uncouple_effects(yard, order, &inactive);
    info!("{locomotive}: made {} cut(s) for order {}", points.len(), order.id);
    Ok(())
}
