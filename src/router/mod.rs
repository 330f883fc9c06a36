//! Client-side routing: declarative route definitions, the arena form used by
//! filtering and flattening, and the live router that resolves locations.

pub mod flatten;
pub mod forest;
pub mod location;
pub mod matcher;
pub mod registry;
pub mod route;
pub mod table;

pub use flatten::flatten;
pub use forest::{RouteForest, RouteId, RouteNode};
pub use location::{RawLocation, ResolvedLocation, RouteRecord};
pub use registry::Router;
pub use route::{join_path, normalize_path, RouteDef, RouteMeta};
pub use table::{constant_routes, dynamic_routes};
