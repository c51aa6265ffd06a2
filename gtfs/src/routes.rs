use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use super::RouteID;

/// Used when routes.txt doesn't specify a color
pub const DEFAULT_ROUTE_COLOR: &str = "777777";
pub const DEFAULT_ROUTE_TEXT_COLOR: &str = "FFFFFF";

#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub route_id: RouteID,
    pub short_name: Option<String>,
    /// The raw GTFS code. Extended route types (like 700 for bus service) are common, so this isn't
    /// an enum.
    pub route_type: u16,
    /// Hex without the leading '#'
    pub color: String,
    pub text_color: String,
}

pub fn load<R: std::io::Read>(reader: R) -> Result<BTreeMap<RouteID, Route>> {
    let mut routes = BTreeMap::new();
    for rec in crate::csv_reader(reader).deserialize() {
        let rec: Record = rec?;
        if routes.contains_key(&rec.route_id) {
            bail!("Duplicate {:?}", rec.route_id);
        }
        routes.insert(
            rec.route_id.clone(),
            Route {
                route_id: rec.route_id,
                short_name: rec.route_short_name,
                route_type: rec.route_type,
                color: rec
                    .route_color
                    .unwrap_or_else(|| DEFAULT_ROUTE_COLOR.to_string()),
                text_color: rec
                    .route_text_color
                    .unwrap_or_else(|| DEFAULT_ROUTE_TEXT_COLOR.to_string()),
            },
        );
    }
    Ok(routes)
}

#[derive(Deserialize)]
struct Record {
    route_id: RouteID,
    route_short_name: Option<String>,
    route_type: u16,
    // Both optional columns may be missing entirely
    #[serde(default)]
    route_color: Option<String>,
    #[serde(default)]
    route_text_color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_default() {
        let input = "route_id,route_short_name,route_type,route_color,route_text_color\n\
                     r1,1,0,E2001A,000000\n\
                     r2,SEV,3,,\n";
        let routes = load(input.as_bytes()).unwrap();
        let r1 = &routes[&RouteID::from("r1")];
        assert_eq!(r1.color, "E2001A");
        assert_eq!(r1.text_color, "000000");
        let r2 = &routes[&RouteID::from("r2")];
        assert_eq!(r2.route_type, 3);
        assert_eq!(r2.color, DEFAULT_ROUTE_COLOR);
        assert_eq!(r2.text_color, DEFAULT_ROUTE_TEXT_COLOR);
        assert_eq!(r2.short_name.as_deref(), Some("SEV"));
    }

    #[test]
    fn color_columns_missing() {
        let input = "route_id,route_short_name,route_type\nr1,10,700\n";
        let routes = load(input.as_bytes()).unwrap();
        let r1 = &routes[&RouteID::from("r1")];
        assert_eq!(r1.route_type, 700);
        assert_eq!(r1.color, DEFAULT_ROUTE_COLOR);
    }

    #[test]
    fn bad_route_type_is_fatal() {
        let input = "route_id,route_short_name,route_type\nr1,10,tram\n";
        assert!(load(input.as_bytes()).is_err());
    }
}
