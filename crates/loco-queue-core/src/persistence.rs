//! Route files: load and save named route templates as JSON.
//!
//! Each stored order carries its own record `version`. Records without one
//! predate versioning and are read as version 1. Every record is upcast to
//! the current [`WaypointOrder`] once, at load time, and validated.

use crate::routes::RouteDefinition;
use loco_queue_logic::migration::{
    upcast_v1, MigrationError, WaypointRecordV1, CURRENT_RECORD_VERSION,
};
use loco_queue_logic::waypoint::validate_order;
use loco_queue_logic::{OrderError, WaypointOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct StoredRouteFile {
    #[serde(default)]
    routes: Vec<StoredRoute>,
}

#[derive(Debug, Deserialize)]
struct StoredRoute {
    name: String,
    #[serde(default)]
    orders: Vec<Value>,
}

#[derive(Serialize)]
struct RouteFileOut<'a> {
    routes: Vec<RouteOut<'a>>,
}

#[derive(Serialize)]
struct RouteOut<'a> {
    name: &'a str,
    orders: Vec<Value>,
}

/// Errors that can occur while reading or writing route files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "route '{route}' order {index}: unsupported record version {found} (current is {current})",
        current = CURRENT_RECORD_VERSION
    )]
    UnsupportedVersion {
        route: String,
        index: usize,
        found: String,
    },
    #[error("route '{route}' order {index}: {source}")]
    Migration {
        route: String,
        index: usize,
        #[source]
        source: MigrationError,
    },
    #[error("route '{route}' order {index} is invalid: {}", join_errors(.errors))]
    InvalidOrder {
        route: String,
        index: usize,
        errors: Vec<OrderError>,
    },
}

fn join_errors(errors: &[OrderError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The record's `version`; absent means 1. Anything but an unsigned
/// integer comes back as its JSON text.
fn record_version(record: &Value) -> Result<u64, String> {
    match record.get("version") {
        None => Ok(1),
        Some(v) => v.as_u64().ok_or_else(|| v.to_string()),
    }
}

fn upcast_record(route: &str, index: usize, record: Value) -> Result<WaypointOrder, LoadError> {
    let unsupported = |found: String| LoadError::UnsupportedVersion {
        route: route.to_string(),
        index,
        found,
    };
    let version = record_version(&record).map_err(unsupported)?;
    let order = match version {
        1 => {
            let legacy: WaypointRecordV1 = serde_json::from_value(record)?;
            upcast_v1(legacy).map_err(|source| LoadError::Migration {
                route: route.to_string(),
                index,
                source,
            })?
        }
        2 => serde_json::from_value(record)?,
        found => return Err(unsupported(found.to_string())),
    };
    let errors = validate_order(&order);
    if !errors.is_empty() {
        return Err(LoadError::InvalidOrder {
            route: route.to_string(),
            index,
            errors,
        });
    }
    Ok(order)
}

/// Parse a route file from a JSON string
pub fn load_routes_str(json: &str) -> Result<Vec<RouteDefinition>, LoadError> {
    let file: StoredRouteFile = serde_json::from_str(json)?;
    from_stored(file)
}

/// Load a route file from a reader
pub fn load_routes<R: Read>(reader: R) -> Result<Vec<RouteDefinition>, LoadError> {
    let file: StoredRouteFile = serde_json::from_reader(reader)?;
    from_stored(file)
}

fn from_stored(file: StoredRouteFile) -> Result<Vec<RouteDefinition>, LoadError> {
    file.routes
        .into_iter()
        .map(|route| -> Result<RouteDefinition, LoadError> {
            let orders = route
                .orders
                .into_iter()
                .enumerate()
                .map(|(index, record)| upcast_record(&route.name, index, record))
                .collect::<Result<Vec<_>, LoadError>>()?;
            Ok(RouteDefinition::new(route.name, orders))
        })
        .collect()
}

/// Write routes at the current record version
pub fn save_routes<W: Write>(writer: W, routes: &[RouteDefinition]) -> Result<(), LoadError> {
    let mut out = RouteFileOut {
        routes: Vec::with_capacity(routes.len()),
    };
    for route in routes {
        let mut orders = Vec::with_capacity(route.orders.len());
        for order in &route.orders {
            let mut record = serde_json::to_value(order)?;
            if let Value::Object(fields) = &mut record {
                fields.insert("version".into(), Value::from(CURRENT_RECORD_VERSION));
            }
            orders.push(record);
        }
        out.routes.push(RouteOut {
            name: &route.name,
            orders,
        });
    }
    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}
