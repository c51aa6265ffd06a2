use std::fmt;

use serde::{Deserialize, Serialize};

// GTFS IDs are opaque strings. Keeping a distinct type per table stops a StopID from being used to
// look up a trip.
macro_rules! string_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<I: Into<String>>(id: I) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(RouteID);
string_id!(ServiceID);
string_id!(ShapeID);
string_id!(StopID);
string_id!(TripID);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = StopID::new("de:08311:30124");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"de:08311:30124\"".to_string()
        );
        assert_eq!(id.to_string(), "de:08311:30124");
        assert_eq!(TripID::from("t1").as_str(), "t1");
    }
}
