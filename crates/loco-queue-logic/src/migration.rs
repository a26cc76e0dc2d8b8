//! Versioned upcast of stored waypoint records.
//!
//! Version 1 records carry the directive as a bag of legacy booleans.
//! Version 2 is [`WaypointOrder`] itself. Upcasting is lossless for every
//! v1 record that was internally consistent; contradictory flag sets are
//! resolved by a fixed precedence instead of being rejected.

use crate::consist::CarId;
use crate::destination::DestinationMatch;
use crate::waypoint::{
    CountFrom, CutSelector, Location, OrderId, PostCouplingCut, RefuelDirective, UncoupleMode,
    WaitDirective, WaypointOrder,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record version written by this crate.
pub const CURRENT_RECORD_VERSION: u32 = 2;

/// Flat legacy waypoint record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointRecordV1 {
    pub id: u64,
    pub segment: String,
    pub offset: f32,
    pub do_not_stop: bool,

    pub couple_to_car: Option<String>,
    pub connect_air_on_couple: bool,
    pub release_handbrakes_on_couple: bool,
    pub is_coupling_pickup: bool,
    pub is_coupling_dropoff: bool,
    pub number_of_cars_to_pickup_or_dropoff: usize,
    pub pickup_dropoff_by_destination: bool,
    pub pickup_dropoff_all_except_locomotives: bool,

    pub uncouple_all_except_locomotives: bool,
    pub uncouple_by_specific_car: bool,
    pub specific_car_query: String,
    pub uncouple_by_destination: bool,
    /// `"track"`, `"industry"`, `"area"` or `"none"`.
    pub destination_kind: String,
    pub destination_id: String,
    pub number_of_cars_to_cut: usize,
    pub count_from_nearest: Option<bool>,
    pub exclude_matching_cars: bool,
    pub take_uncoupled_as_active_cut: bool,
    pub apply_handbrakes_on_uncouple: bool,
    pub bleed_air_on_uncouple: bool,

    pub wait_for_duration: bool,
    pub duration_minutes: f64,
    pub wait_until_time: bool,
    pub wait_hour: u8,
    pub wait_minute: u8,

    pub will_refuel: bool,
    pub refuel_load: String,
    pub refuel_capacity: f32,
    pub refuel_industry_id: String,
}

/// Upcast failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("record {id}: unknown destination kind '{kind}'")]
    UnknownDestinationKind { id: u64, kind: String },
    #[error("record {id}: destination kind '{kind}' has no id")]
    MissingDestinationId { id: u64, kind: String },
}

fn destination_target(record: &WaypointRecordV1) -> Result<DestinationMatch, MigrationError> {
    let kind = record.destination_kind.trim().to_ascii_lowercase();
    let build: fn(String) -> DestinationMatch = match kind.as_str() {
        "" | "none" => return Ok(DestinationMatch::NoDestination),
        "track" => DestinationMatch::Track,
        "industry" => DestinationMatch::Industry,
        "area" => DestinationMatch::Area,
        _ => return Err(MigrationError::UnknownDestinationKind { id: record.id, kind }),
    };
    let id = record.destination_id.trim();
    if id.is_empty() {
        return Err(MigrationError::MissingDestinationId { id: record.id, kind });
    }
    Ok(build(id.to_string()))
}

/// Map a v1 record onto the current order shape.
///
/// Uncouple precedence: all-except-locomotives, then specific car, then
/// destination, then a non-zero count. A pickup flag wins over dropoff.
pub fn upcast_v1(record: WaypointRecordV1) -> Result<WaypointOrder, MigrationError> {
    let uncouple = if record.uncouple_all_except_locomotives {
        UncoupleMode::AllExceptMotivePower
    } else if record.uncouple_by_specific_car {
        UncoupleMode::BySpecificCar {
            query: record.specific_car_query.clone(),
        }
    } else if record.uncouple_by_destination {
        UncoupleMode::ByDestination {
            target: destination_target(&record)?,
        }
    } else if record.number_of_cars_to_cut > 0 {
        UncoupleMode::ByCount {
            count: record.number_of_cars_to_cut,
        }
    } else {
        UncoupleMode::None
    };

    let select = if record.pickup_dropoff_all_except_locomotives {
        CutSelector::AllExceptMotivePower
    } else if record.pickup_dropoff_by_destination {
        CutSelector::Destination {
            target: destination_target(&record)?,
        }
    } else {
        CutSelector::Count {
            count: record.number_of_cars_to_pickup_or_dropoff,
        }
    };
    let post_coupling_cut = if record.is_coupling_pickup {
        PostCouplingCut::Pickup { select }
    } else if record.is_coupling_dropoff {
        PostCouplingCut::Dropoff { select }
    } else {
        PostCouplingCut::None
    };

    let wait = if record.wait_for_duration {
        Some(WaitDirective::Duration {
            minutes: record.duration_minutes,
        })
    } else if record.wait_until_time {
        Some(WaitDirective::UntilTime {
            hour: record.wait_hour,
            minute: record.wait_minute,
        })
    } else {
        None
    };

    let refuel = record.will_refuel.then(|| RefuelDirective {
        load: record.refuel_load.clone(),
        capacity: record.refuel_capacity,
        industry_id: record.refuel_industry_id.clone(),
    });

    let count_from = match record.count_from_nearest {
        Some(false) => CountFrom::FurthestFromWaypoint,
        _ => CountFrom::NearestToWaypoint,
    };

    Ok(WaypointOrder {
        id: OrderId(record.id),
        location: Location::new(record.segment, record.offset),
        stop_at_waypoint: !record.do_not_stop,
        couple_target: record
            .couple_to_car
            .filter(|c| !c.trim().is_empty())
            .map(CarId::from),
        connect_air_on_couple: record.connect_air_on_couple,
        release_handbrakes_on_couple: record.release_handbrakes_on_couple,
        post_coupling_cut,
        uncouple,
        count_from,
        exclude_matched_from_cut: record.exclude_matching_cars,
        take_active_cut: record.take_uncoupled_as_active_cut,
        apply_handbrakes_on_uncouple: record.apply_handbrakes_on_uncouple,
        bleed_air_on_uncouple: record.bleed_air_on_uncouple,
        wait,
        refuel,
    })
}
