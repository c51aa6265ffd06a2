//! Reads the GTFS tables needed to build a route graph: shapes, stops, trips, stop times, routes,
//! and the service calendar. Every loader keeps the file order of rows where it matters, and any
//! malformed value aborts loading with an error naming the file.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod calendar;
mod ids;
mod routes;
mod shapes;
mod source;
mod stop_times;
mod stops;
mod time;
mod trips;

use std::collections::BTreeMap;

use anyhow::Result;

pub use calendar::{Calendar, DaysOfWeek, Service, DATE_FORMAT};
pub use ids::{RouteID, ServiceID, ShapeID, StopID, TripID};
pub use routes::{Route, DEFAULT_ROUTE_COLOR, DEFAULT_ROUTE_TEXT_COLOR};
pub use shapes::ShapePoint;
pub use source::{DirectorySource, FeedSource, MemorySource, ZipSource};
pub use stop_times::StopTime;
pub use stops::Stop;
pub use time::ServiceTime;
pub use trips::Trip;

pub struct GTFS {
    /// In file order
    pub shape_points: Vec<ShapePoint>,
    pub stops: BTreeMap<StopID, Stop>,
    pub stops_by_name: BTreeMap<String, Vec<StopID>>,
    pub routes: BTreeMap<RouteID, Route>,
    pub trips: BTreeMap<TripID, Trip>,
    /// Per trip, the stops in visiting order
    pub stop_times: BTreeMap<TripID, Vec<StopTime>>,
    /// Per stop, `(trip, departure time)` with the time as written in GTFS
    pub departures: BTreeMap<StopID, Vec<(TripID, String)>>,
    pub calendar: Calendar,
}

impl GTFS {
    /// Loads a feed from a directory or a `.zip` file
    pub fn load_from_path(path: &str) -> Result<Self> {
        if path.ends_with(".zip") {
            let file = fs_err::File::open(path)?;
            Self::load(&mut ZipSource::new(std::io::BufReader::new(file))?)
        } else {
            Self::load(&mut DirectorySource::new(path)?)
        }
    }

    pub fn load<S: FeedSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut gtfs = Self::empty();

        gtfs.routes = load_table(source, "routes.txt", routes::load)?;
        info!("Loaded {} routes", gtfs.routes.len());

        gtfs.calendar = load_table(source, "calendar.txt", calendar::load)?;
        if source.contains("calendar_dates.txt") {
            let services = &mut gtfs.calendar;
            load_table(source, "calendar_dates.txt", |reader| {
                calendar::load_exceptions(services, reader)
            })?;
        } else {
            info!("No calendar_dates.txt, so no service exceptions");
        }
        info!("Loaded {} services", gtfs.calendar.services.len());

        gtfs.shape_points = load_table(source, "shapes.txt", shapes::load)?;
        info!("Loaded {} shape points", gtfs.shape_points.len());

        gtfs.trips = load_table(source, "trips.txt", trips::load)?;
        info!("Loaded {} trips", gtfs.trips.len());

        gtfs.stops = load_table(source, "stops.txt", stops::load)?;
        gtfs.stops_by_name = stops::by_name(&gtfs.stops);
        info!("Loaded {} stops", gtfs.stops.len());

        let trips = &gtfs.trips;
        let stop_times = load_table(source, "stop_times.txt", |reader| {
            stop_times::load(reader, trips)
        })?;
        gtfs.stop_times = stop_times.per_trip;
        gtfs.departures = stop_times.departures;
        info!("Loaded stop times for {} trips", gtfs.stop_times.len());

        Ok(gtfs)
    }

    pub fn empty() -> Self {
        Self {
            shape_points: Vec::new(),
            stops: BTreeMap::new(),
            stops_by_name: BTreeMap::new(),
            routes: BTreeMap::new(),
            trips: BTreeMap::new(),
            stop_times: BTreeMap::new(),
            departures: BTreeMap::new(),
            calendar: Calendar::empty(),
        }
    }
}

// Adds the path in the error message
fn load_table<'a, S, T, F>(source: &'a mut S, name: &str, parse: F) -> Result<T>
where
    S: FeedSource + ?Sized,
    F: FnOnce(Box<dyn std::io::Read + 'a>) -> Result<T>,
{
    let reader = source.open(name)?;
    parse(reader).map_err(|err| anyhow!("{name}: {err}"))
}

// Parsing as f64 accepts NaN and inf, which no real location has
fn check_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !lon.is_finite() {
        bail!("Bad coordinates ({lat}, {lon})");
    }
    Ok(())
}

/// GTFS producers are sloppy about whitespace around fields
fn csv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}
