mod averages;
mod handlers;
mod types;

pub use averages::{get_day_average, get_range_average};
pub use handlers::list_stations;
pub use types::{DayAverageQuery, RangeAverageQuery, StationSummary};

// Re-export utoipa path structs for OpenAPI documentation
pub use averages::{__path_get_day_average, __path_get_range_average};
pub use handlers::__path_list_stations;
