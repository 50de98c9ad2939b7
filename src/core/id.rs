//! Identifiers for states and events.
//!
//! Both are cheap-to-clone interned strings. They borrow as `&str`, so the
//! transition table can be queried with plain string slices.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(Arc::from(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(Arc::from(id))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Arc::from(id))
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.0 == *other
            }
        }
    };
}

string_id! {
    /// Unique name of a registered state.
    StateId
}

string_id! {
    /// Name of an event. Events carry no payload.
    EventId
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn ids_compare_with_str() {
        let id = StateId::from("idle");
        assert_eq!(id, "idle");
        assert_eq!(id.as_str(), "idle");
        assert_eq!(id.to_string(), "idle");
        assert_eq!(format!("{:?}", id), "StateId(\"idle\")");
    }

    #[test]
    fn ids_borrow_as_str_for_lookup() {
        let mut map = HashMap::new();
        map.insert(EventId::from("on"), 1);
        assert_eq!(map.get("on"), Some(&1));
        assert_eq!(map.get("off"), None);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = EventId::from("maintain_speed");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"maintain_speed\"");

        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
