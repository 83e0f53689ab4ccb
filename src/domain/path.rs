//! LwM2M resource paths (`/3/0/1`).

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::HubError;

/// A LwM2M node path: object, object instance, resource and resource
/// instance ids, each optional from the right. `/` is the root path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LwM2mPath {
    object_id: Option<u16>,
    object_instance_id: Option<u16>,
    resource_id: Option<u16>,
    resource_instance_id: Option<u16>,
}

impl LwM2mPath {
    /// Path to an object (`/{object_id}`).
    #[must_use]
    pub const fn object(object_id: u16) -> Self {
        Self {
            object_id: Some(object_id),
            object_instance_id: None,
            resource_id: None,
            resource_instance_id: None,
        }
    }

    /// Path to an object instance (`/{object_id}/{instance_id}`).
    #[must_use]
    pub const fn object_instance(object_id: u16, instance_id: u16) -> Self {
        Self {
            object_id: Some(object_id),
            object_instance_id: Some(instance_id),
            resource_id: None,
            resource_instance_id: None,
        }
    }

    /// Path to a resource (`/{object_id}/{instance_id}/{resource_id}`).
    #[must_use]
    pub const fn resource(object_id: u16, instance_id: u16, resource_id: u16) -> Self {
        Self {
            object_id: Some(object_id),
            object_instance_id: Some(instance_id),
            resource_id: Some(resource_id),
            resource_instance_id: None,
        }
    }

    /// Path to a resource instance.
    #[must_use]
    pub const fn resource_instance(
        object_id: u16,
        instance_id: u16,
        resource_id: u16,
        resource_instance_id: u16,
    ) -> Self {
        Self {
            object_id: Some(object_id),
            object_instance_id: Some(instance_id),
            resource_id: Some(resource_id),
            resource_instance_id: Some(resource_instance_id),
        }
    }

    /// Returns `true` for the root path `/`.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.object_id.is_none()
    }

    fn segments(&self) -> impl Iterator<Item = u16> {
        [
            self.object_id,
            self.object_instance_id,
            self.resource_id,
            self.resource_instance_id,
        ]
        .into_iter()
        .map_while(|id| id)
    }
}

impl fmt::Display for LwM2mPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for id in self.segments() {
            write!(f, "/{id}")?;
        }
        Ok(())
    }
}

impl FromStr for LwM2mPath {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| HubError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = s.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };
        if rest.is_empty() {
            return Ok(Self::default());
        }

        let mut ids = [None; 4];
        for (index, segment) in rest.split('/').enumerate() {
            let Some(slot) = ids.get_mut(index) else {
                return Err(invalid("more than 4 segments"));
            };
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            let id = segment
                .parse::<u16>()
                .map_err(|_| invalid("segment is not an id in 0..=65535"))?;
            *slot = Some(id);
        }

        let [object_id, object_instance_id, resource_id, resource_instance_id] = ids;
        Ok(Self {
            object_id,
            object_instance_id,
            resource_id,
            resource_instance_id,
        })
    }
}

impl Serialize for LwM2mPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_resource_path() {
        let Ok(path) = "/3/0/1".parse::<LwM2mPath>() else {
            panic!("valid path rejected");
        };
        assert_eq!(path, LwM2mPath::resource(3, 0, 1));
        assert_eq!(path.to_string(), "/3/0/1");
    }

    #[test]
    fn root_path() {
        let Ok(path) = "/".parse::<LwM2mPath>() else {
            panic!("root rejected");
        };
        assert!(path.is_root());
        assert_eq!(path.to_string(), "/");
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["3/0", "/3//1", "/3/0/", "/a", "/70000", "/1/2/3/4/5"] {
            assert!(bad.parse::<LwM2mPath>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn serializes_as_string_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(LwM2mPath::resource(3, 0, 1), 1);
        let Ok(json) = serde_json::to_string(&map) else {
            panic!("serialization failed");
        };
        assert_eq!(json, r#"{"/3/0/1":1}"#);
    }

    #[test]
    fn orders_by_ids() {
        assert!(LwM2mPath::object(3) < LwM2mPath::object_instance(3, 0));
        assert!(LwM2mPath::resource(3, 0, 1) < LwM2mPath::resource(3, 0, 2));
    }
}
