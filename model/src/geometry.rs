use serde::{Serialize, Serializer};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A raw coordinate pair. Projection treats (lat, lon) as planar (x, y), so nothing here
/// corrects for longitude shrinking away from the equator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// Written as `[lat, lon]`
impl Serialize for LatLon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.lat, self.lon).serialize(serializer)
    }
}

/// Haversine distance in meters
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Projects P onto the segment AB, staying within the segment. When the projection is clamped,
/// the endpoint itself is returned, so callers can compare with `==`.
pub fn project_point_on_segment(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    px: f64,
    py: f64,
) -> (f64, f64) {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (ax, ay);
    }
    let t = ((px - ax) * dx + (py - ay) * dy) / len_sq;
    if t <= 0.0 {
        (ax, ay)
    } else if t >= 1.0 {
        (bx, by)
    } else {
        (ax + t * dx, ay + t * dy)
    }
}

/// Planar distance from P to the segment AB, in coordinate units (not meters)
pub fn distance_point_to_segment(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    px: f64,
    py: f64,
) -> f64 {
    let (x, y) = project_point_on_segment(ax, ay, bx, by, px, py);
    (px - x).hypot(py - y)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn projection_vectors() {
        assert_eq!(
            project_point_on_segment(5.0, 5.0, 10.0, 5.0, 6.0, 6.0),
            (6.0, 5.0)
        );
        assert_relative_eq!(
            distance_point_to_segment(5.0, 5.0, 10.0, 5.0, 6.0, 6.0),
            1.0
        );

        assert_eq!(
            project_point_on_segment(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            (0.0, 0.0)
        );
        assert_eq!(distance_point_to_segment(0.0, 0.0, 0.0, 0.0, 0.0, 0.0), 0.0);

        assert_eq!(
            project_point_on_segment(-1.0, -2.0, -5.0, -2.0, -3.0, -4.0),
            (-3.0, -2.0)
        );
        assert_relative_eq!(
            distance_point_to_segment(-1.0, -2.0, -5.0, -2.0, -3.0, -4.0),
            2.0
        );
    }

    #[test]
    fn projection_clamps_to_endpoints() {
        assert_eq!(
            project_point_on_segment(0.0, 0.0, 1.0, 0.0, -3.0, 1.0),
            (0.0, 0.0)
        );
        assert_eq!(
            project_point_on_segment(0.1, 0.2, 0.3, 0.7, 5.0, 5.0),
            (0.3, 0.7)
        );
        // Degenerate segment, point elsewhere
        assert_eq!(
            project_point_on_segment(2.0, 2.0, 2.0, 2.0, 5.0, 6.0),
            (2.0, 2.0)
        );
        assert_relative_eq!(
            distance_point_to_segment(2.0, 2.0, 2.0, 2.0, 5.0, 6.0),
            5.0
        );
    }

    #[test]
    fn great_circle() {
        assert_eq!(great_circle_distance(47.99, 7.84, 47.99, 7.84), 0.0);

        // One degree of latitude
        assert_relative_eq!(
            great_circle_distance(0.0, 0.0, 1.0, 0.0),
            111_194.93,
            max_relative = 1e-6
        );

        let pairs = [
            (47.9959, 7.8494, 48.0012, 7.8412),
            (-33.8688, 151.2093, 51.5074, -0.1278),
            (0.0, 179.9, 0.0, -179.9),
        ];
        for (lat1, lon1, lat2, lon2) in pairs {
            let there = great_circle_distance(lat1, lon1, lat2, lon2);
            let back = great_circle_distance(lat2, lon2, lat1, lon1);
            assert_relative_eq!(there, back, max_relative = 1e-12);
            assert!(there > 0.0);
        }
    }
}
