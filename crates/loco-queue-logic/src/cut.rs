//! Cut calculator.
//!
//! Pure functions that pick the ordered block of cars to separate for a
//! directive. Every function reads an immutable [`Consist`] snapshot and
//! returns a fresh block; none of them touch coupling state.
//!
//! Orderings:
//! - Plain uncouple directives take the consist ordered from the counting
//!   end (nearest or furthest from the waypoint); blocks are prefixes of it.
//! - Post-coupling cuts take the consist ordered from the far end of the
//!   just-coupled car, so the coupled string comes first and the locomotive
//!   last. `coupled_index` is the coupled car's position in that order.
//!
//! Raw by-count cuts are not clamped; an oversized block is rejected later by
//! [`crate::uncouple::find_car_to_uncouple`]. Post-coupling counts saturate.

use crate::consist::{Car, Consist, MotivePower};
use crate::destination::{DestinationMatch, DestinationResolver};
use crate::error::CutError;

/// First `count` cars of `ordered`.
pub fn find_cut_by_count(ordered: &Consist, count: usize) -> Vec<Car> {
    ordered.iter().take(count).cloned().collect()
}

/// Cut that keeps the `count` coupled cars nearest the locomotive.
///
/// `lowest = coupled_index - clamped + 1`; block = `consist[0, lowest)`.
pub fn calculate_cut_for_pickup_by_count(
    consist: &Consist,
    coupled_index: usize,
    count: usize,
) -> Vec<Car> {
    if coupled_index >= consist.len() {
        return Vec::new();
    }
    let clamped = count.min(coupled_index + 1);
    let lowest_index_to_pickup = coupled_index + 1 - clamped;
    consist.cars()[..lowest_index_to_pickup].to_vec()
}

/// Cut that leaves the coupled string plus `count` carried cars.
///
/// Block = `consist[0, coupled_index + clamped + 1)`, where `count` is
/// clamped to the carried cars ahead of the first motive-power car.
pub fn calculate_cut_for_dropoff_by_count<M>(
    consist: &Consist,
    coupled_index: usize,
    count: usize,
    motive_power: &M,
) -> Vec<Car>
where
    M: MotivePower + ?Sized,
{
    if coupled_index >= consist.len() {
        return Vec::new();
    }
    let carried = consist.cars()[coupled_index + 1..]
        .iter()
        .take_while(|car| !motive_power.is_motive_power(car))
        .count();
    let clamped = count.min(carried);
    consist.cars()[..coupled_index + clamped + 1].to_vec()
}

/// Result of a single destination scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationScan {
    pub block: Vec<Car>,
    /// Length of the first contiguous matching run (0 when nothing matched).
    pub matched: usize,
}

/// One pass over `cars`: leading non-matching cars go into the block, then
/// the first contiguous matching run (unless `exclude_matched`), and the scan
/// stops at the first non-match after that run. Later matching runs are
/// never reached.
pub fn scan_destination_block<F>(
    cars: &[Car],
    is_match: F,
    exclude_matched: bool,
) -> DestinationScan
where
    F: Fn(&Car) -> bool,
{
    let mut block = Vec::new();
    let mut matched = 0;
    for car in cars {
        if is_match(car) {
            matched += 1;
            if !exclude_matched {
                block.push(car.clone());
            }
        } else if matched > 0 {
            break;
        } else {
            block.push(car.clone());
        }
    }
    DestinationScan { block, matched }
}

/// By-destination cut for a plain uncouple directive.
///
/// Fails with [`CutError::NoMatchFound`] when no car in the consist matches.
pub fn find_matching_cars_by_destination<R>(
    ordered: &Consist,
    target: &DestinationMatch,
    resolver: &R,
    exclude_matched: bool,
) -> Result<Vec<Car>, CutError>
where
    R: DestinationResolver + ?Sized,
{
    let scan = scan_destination_block(
        ordered.cars(),
        |car| target.matches(resolver.destination_of(car).as_ref()),
        exclude_matched,
    );
    if scan.matched == 0 {
        return Err(CutError::NoMatchFound(target.to_string()));
    }
    Ok(scan.block)
}

/// Post-coupling pickup by destination.
///
/// Scans the coupled side (`consist[0..=coupled_index]`) from the far end
/// with the match inverted, so the block is the far cars up to and including
/// the first run of cars *not* bound for `target`. When every coupled car is
/// bound for `target` nothing is cut.
pub fn calculate_cut_for_pickup_by_destination<R>(
    consist: &Consist,
    coupled_index: usize,
    target: &DestinationMatch,
    resolver: &R,
) -> Vec<Car>
where
    R: DestinationResolver + ?Sized,
{
    if coupled_index >= consist.len() {
        return Vec::new();
    }
    let coupled_side = &consist.cars()[..=coupled_index];
    let scan = scan_destination_block(
        coupled_side,
        |car| !target.matches(resolver.destination_of(car).as_ref()),
        false,
    );
    if scan.matched == 0 {
        return Vec::new();
    }
    scan.block
}

/// Post-coupling dropoff by destination.
///
/// Scans the carried cars from the coupled car toward the locomotive,
/// stopping at the first motive-power car. The block is the coupled string
/// plus the scanned cars; nothing is cut when no carried car matches.
pub fn calculate_cut_for_dropoff_by_destination<R, M>(
    consist: &Consist,
    coupled_index: usize,
    target: &DestinationMatch,
    resolver: &R,
    motive_power: &M,
) -> Vec<Car>
where
    R: DestinationResolver + ?Sized,
    M: MotivePower + ?Sized,
{
    if coupled_index >= consist.len() {
        return Vec::new();
    }
    let carried: Vec<Car> = consist.cars()[coupled_index + 1..]
        .iter()
        .take_while(|car| !motive_power.is_motive_power(car))
        .cloned()
        .collect();
    let scan = scan_destination_block(
        &carried,
        |car| target.matches(resolver.destination_of(car).as_ref()),
        false,
    );
    if scan.matched == 0 {
        return Vec::new();
    }
    let mut block = consist.cars()[..=coupled_index].to_vec();
    block.extend(scan.block);
    block
}

/// Resolve a free-text car query against a consist.
///
/// Exact id first, then case-insensitive id or display name.
pub fn find_car(consist: &Consist, query: &str) -> Result<Car, CutError> {
    let query = query.trim();
    if let Some(car) = consist.iter().find(|c| c.id.as_str() == query) {
        return Ok(car.clone());
    }
    consist
        .iter()
        .find(|c| c.id.as_str().eq_ignore_ascii_case(query) || c.name.eq_ignore_ascii_case(query))
        .cloned()
        .ok_or_else(|| CutError::NoMatchFound(format!("'{query}'")))
}

/// Cars from the counting end through the queried car, which is always last.
pub fn find_cut_by_specific_car(
    ordered: &Consist,
    query: &str,
    exclude_matched: bool,
) -> Result<Vec<Car>, CutError> {
    let car = find_car(ordered, query)?;
    let Some(position) = ordered.index_of(&car.id) else {
        return Err(CutError::NoMatchFound(format!("'{query}'")));
    };
    let end = if exclude_matched { position } else { position + 1 };
    Ok(ordered.cars()[..end].to_vec())
}

/// A maximal run of cars that are all motive power or all not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerRun {
    pub motive_power: bool,
    /// Index of the run's first car in the consist.
    pub start: usize,
    pub cars: Vec<Car>,
}

impl PowerRun {
    /// One past the run's last car.
    pub fn end(&self) -> usize {
        self.start + self.cars.len()
    }
}

/// Partition `consist` into alternating motive / non-motive runs.
pub fn motive_power_runs<M>(consist: &Consist, motive_power: &M) -> Vec<PowerRun>
where
    M: MotivePower + ?Sized,
{
    let mut runs: Vec<PowerRun> = Vec::new();
    for (index, car) in consist.iter().enumerate() {
        let is_power = motive_power.is_motive_power(car);
        match runs.last_mut() {
            Some(run) if run.motive_power == is_power => run.cars.push(car.clone()),
            _ => runs.push(PowerRun {
                motive_power: is_power,
                start: index,
                cars: vec![car.clone()],
            }),
        }
    }
    runs
}

/// One prefix block per internal run boundary.
///
/// Each block is `ordered[0, boundary)`; separating at every boundary splits
/// all non-motive-power cars away from motive power. An all-power or
/// power-free consist yields no blocks.
pub fn find_cuts_all_except_motive_power<M>(ordered: &Consist, motive_power: &M) -> Vec<Vec<Car>>
where
    M: MotivePower + ?Sized,
{
    let runs = motive_power_runs(ordered, motive_power);
    if !runs.iter().any(|r| r.motive_power) {
        return Vec::new();
    }
    runs.iter()
        .take(runs.len().saturating_sub(1))
        .map(|run| ordered.cars()[..run.end()].to_vec())
        .collect()
}

/// Post-coupling pickup of every car except motive power.
///
/// Keeps the non-motive run that starts at the coupled car and cuts
/// everything beyond it on the far side.
pub fn calculate_cut_for_pickup_all_except_motive_power<M>(
    consist: &Consist,
    coupled_index: usize,
    motive_power: &M,
) -> Vec<Car>
where
    M: MotivePower + ?Sized,
{
    if coupled_index >= consist.len() {
        return Vec::new();
    }
    let mut run_start = coupled_index + 1;
    while run_start > 0 && !motive_power.is_motive_power(&consist.cars()[run_start - 1]) {
        run_start -= 1;
    }
    consist.cars()[..run_start].to_vec()
}

/// Post-coupling dropoff of every carried car except motive power.
///
/// Leaves the coupled string plus the non-motive run of carried cars next to
/// the coupled car.
pub fn calculate_cut_for_dropoff_all_except_motive_power<M>(
    consist: &Consist,
    coupled_index: usize,
    motive_power: &M,
) -> Vec<Car>
where
    M: MotivePower + ?Sized,
{
    if coupled_index >= consist.len() {
        return Vec::new();
    }
    let mut run_end = coupled_index + 1;
    while run_end < consist.len() && !motive_power.is_motive_power(&consist.cars()[run_end]) {
        run_end += 1;
    }
    consist.cars()[..run_end].to_vec()
}

/// Drop boundary cars that would split a locomotive from its tender.
///
/// If the first or last car of `block` is one half of a pair whose other
/// half is in `consist` but not in `block`, that car leaves the block. Repeats
/// until both boundaries are stable; the block may end up empty.
pub fn filter_motive_pairs<M>(mut block: Vec<Car>, consist: &Consist, motive_power: &M) -> Vec<Car>
where
    M: MotivePower + ?Sized,
{
    let splits_pair = |car: &Car, block: &[Car]| -> bool {
        motive_power
            .pair_of(car, consist)
            .is_some_and(|pair| consist.contains(&pair) && !block.iter().any(|c| c.id == pair))
    };
    loop {
        if block.first().is_some_and(|c| splits_pair(c, &block)) {
            block.remove(0);
        } else if block.last().is_some_and(|c| splits_pair(c, &block)) {
            block.pop();
        } else {
            return block;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consist::TenderPairs;
    use crate::destination::{Destination, DestinationTable};

    fn numbered(n: usize) -> Consist {
        (0..n).map(|i| Car::ordinary(i.to_string())).collect()
    }

    fn ids(block: &[Car]) -> Vec<&str> {
        block.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_count_prefix() {
        let block = find_cut_by_count(&numbered(10), 3);
        assert_eq!(ids(&block), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_count_not_clamped_to_remainder() {
        // Whole consist back; the resolver is the one that rejects it.
        assert_eq!(find_cut_by_count(&numbered(4), 9).len(), 4);
    }

    #[test]
    fn test_pickup_by_count() {
        let block = calculate_cut_for_pickup_by_count(&numbered(10), 4, 2);
        assert_eq!(ids(&block), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_pickup_by_count_saturates() {
        assert!(calculate_cut_for_pickup_by_count(&numbered(10), 4, 150).is_empty());
        let block = calculate_cut_for_pickup_by_count(&numbered(10), 9, 1);
        assert_eq!(block.len(), 9);
        assert_eq!(block[0].id.as_str(), "0");
        assert_eq!(block[8].id.as_str(), "8");
    }

    #[test]
    fn test_pickup_zero_cuts_whole_coupled_side() {
        let block = calculate_cut_for_pickup_by_count(&numbered(10), 4, 0);
        assert_eq!(block.len(), 5);
    }

    #[test]
    fn test_dropoff_by_count() {
        let mp = TenderPairs::new();
        let block = calculate_cut_for_dropoff_by_count(&numbered(10), 4, 2, &mp);
        assert_eq!(block.len(), 7);
        assert_eq!(block[0].id.as_str(), "0");
        assert_eq!(block[6].id.as_str(), "6");
        let block = calculate_cut_for_dropoff_by_count(&numbered(10), 4, 150, &mp);
        assert_eq!(block.len(), 10);
        assert_eq!(block[9].id.as_str(), "9");
    }

    #[test]
    fn test_dropoff_by_count_stops_before_locomotive() {
        // Coupled string x0..x3, carried c1 c0, locomotive last.
        let consist = Consist::new(vec![
            Car::ordinary("x0"),
            Car::ordinary("x1"),
            Car::ordinary("x2"),
            Car::ordinary("x3"),
            Car::ordinary("c1"),
            Car::ordinary("c0"),
            Car::locomotive("L1"),
        ]);
        let mp = TenderPairs::new();
        let block = calculate_cut_for_dropoff_by_count(&consist, 3, 150, &mp);
        assert_eq!(ids(&block), vec!["x0", "x1", "x2", "x3", "c1", "c0"]);
        let block = calculate_cut_for_dropoff_by_count(&consist, 3, 1, &mp);
        assert_eq!(ids(&block), vec!["x0", "x1", "x2", "x3", "c1"]);
    }

    #[test]
    fn test_counts_are_pure() {
        let consist = numbered(10);
        assert_eq!(
            calculate_cut_for_pickup_by_count(&consist, 6, 3),
            calculate_cut_for_pickup_by_count(&consist, 6, 3)
        );
    }

    fn billed(dests: &[Option<&str>]) -> (Consist, DestinationTable) {
        let consist = numbered(dests.len());
        let mut table = DestinationTable::new();
        for (i, d) in dests.iter().enumerate() {
            if let Some(track) = d {
                table.set(i.to_string().as_str(), Destination::track(*track));
            }
        }
        (consist, table)
    }

    #[test]
    fn test_destination_first_block_only() {
        let (consist, table) = billed(&[Some("x"), Some("t"), Some("t"), Some("x"), Some("t")]);
        let target = DestinationMatch::Track("t".into());
        let block = find_matching_cars_by_destination(&consist, &target, &table, false).unwrap();
        assert_eq!(ids(&block), vec!["0", "1", "2"]);
        let block = find_matching_cars_by_destination(&consist, &target, &table, true).unwrap();
        assert_eq!(ids(&block), vec!["0"]);
    }

    #[test]
    fn test_destination_no_match() {
        let (consist, table) = billed(&[Some("x"), None]);
        let err = find_matching_cars_by_destination(
            &consist,
            &DestinationMatch::Track("t".into()),
            &table,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CutError::NoMatchFound(_)));
    }

    #[test]
    fn test_destination_unbilled_cars() {
        let (consist, table) = billed(&[None, None, Some("t")]);
        let target = DestinationMatch::NoDestination;
        let block = find_matching_cars_by_destination(&consist, &target, &table, false).unwrap();
        assert_eq!(ids(&block), vec!["0", "1"]);
    }

    #[test]
    fn test_specific_car_is_last() {
        let consist: Consist = numbered(6)
            .into_cars()
            .into_iter()
            .map(|c| {
                let name = format!("GATX {}", c.id);
                c.with_name(name)
            })
            .collect();
        let block = find_cut_by_specific_car(&consist, "gatx 3", false).unwrap();
        assert_eq!(ids(&block), vec!["0", "1", "2", "3"]);
        let block = find_cut_by_specific_car(&consist, "3", true).unwrap();
        assert_eq!(ids(&block), vec!["0", "1", "2"]);
        assert!(matches!(
            find_cut_by_specific_car(&consist, "UP 9", false),
            Err(CutError::NoMatchFound(_))
        ));
    }

    fn mixed() -> Consist {
        Consist::new(vec![
            Car::locomotive("L1"),
            Car::tender("T1"),
            Car::ordinary("c1"),
            Car::ordinary("c2"),
            Car::locomotive("L2"),
            Car::ordinary("c3"),
        ])
    }

    #[test]
    fn test_runs_alternate() {
        let runs = motive_power_runs(&mixed(), &TenderPairs::new());
        let shape: Vec<(bool, usize)> = runs
            .iter()
            .map(|r| (r.motive_power, r.cars.len()))
            .collect();
        assert_eq!(shape, vec![(true, 2), (false, 2), (true, 1), (false, 1)]);
    }

    #[test]
    fn test_all_except_motive_power_boundaries() {
        let blocks = find_cuts_all_except_motive_power(&mixed(), &TenderPairs::new());
        let lens: Vec<usize> = blocks.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![2, 4, 5]);
        assert!(find_cuts_all_except_motive_power(&numbered(4), &TenderPairs::new()).is_empty());
    }

    #[test]
    fn test_post_coupling_all_except_motive_power() {
        // far end … coupled car (3) … locomotive
        let consist = Consist::new(vec![
            Car::ordinary("f0"),
            Car::locomotive("D9"),
            Car::ordinary("f2"),
            Car::ordinary("X"),
            Car::ordinary("c1"),
            Car::ordinary("c2"),
            Car::locomotive("L1"),
        ]);
        let mp = TenderPairs::new();
        let pickup = calculate_cut_for_pickup_all_except_motive_power(&consist, 3, &mp);
        assert_eq!(ids(&pickup), vec!["f0", "D9"]);
        let dropoff = calculate_cut_for_dropoff_all_except_motive_power(&consist, 3, &mp);
        assert_eq!(ids(&dropoff), vec!["f0", "D9", "f2", "X", "c1", "c2"]);
    }

    #[test]
    fn test_pair_filter_drops_split_locomotive() {
        let mut pairs = TenderPairs::new();
        pairs.pair("L1", "T1");
        let consist = Consist::new(vec![
            Car::ordinary("c0"),
            Car::locomotive("L1"),
            Car::tender("T1"),
            Car::ordinary("c3"),
        ]);
        let block = consist.cars()[..2].to_vec();
        assert_eq!(ids(&filter_motive_pairs(block, &consist, &pairs)), vec!["c0"]);
        let block = consist.cars()[..3].to_vec();
        assert_eq!(filter_motive_pairs(block, &consist, &pairs).len(), 3);
    }

    #[test]
    fn test_pair_filter_can_empty_block() {
        let mut pairs = TenderPairs::new();
        pairs.pair("L1", "T1");
        let consist = Consist::new(vec![Car::tender("T1"), Car::locomotive("L1")]);
        let block = vec![consist.cars()[0].clone()];
        assert!(filter_motive_pairs(block, &consist, &pairs).is_empty());
    }

    #[test]
    fn test_pair_filter_ignores_diesels() {
        let consist = Consist::new(vec![Car::locomotive("GP7"), Car::ordinary("c1")]);
        let block = vec![consist.cars()[0].clone()];
        assert_eq!(filter_motive_pairs(block, &consist, &TenderPairs::new()).len(), 1);
    }
}
