//! Decoded LwM2M content nodes carried by notifications and Send requests.
//!
//! The JSON shape follows what the web front-end already consumes: every
//! node is tagged by `kind`, resources carry their data `type`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// A single decoded resource value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    /// UTF-8 string.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer.
    UnsignedInteger(u64),
    /// Floating point number. Must be finite to be encodable.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// Raw bytes, rendered as lowercase hex.
    Opaque(Vec<u8>),
    /// Timestamp, rendered as RFC 3339.
    Time(DateTime<Utc>),
    /// Object link, rendered as `"objectId:instanceId"`.
    ObjectLink {
        /// Linked object id.
        object_id: u16,
        /// Linked object instance id.
        instance_id: u16,
    },
}

impl ResourceValue {
    /// Returns the LwM2M data type name of this value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "STRING",
            Self::Integer(_) => "INTEGER",
            Self::UnsignedInteger(_) => "UNSIGNED_INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Opaque(_) => "OPAQUE",
            Self::Time(_) => "TIME",
            Self::ObjectLink { .. } => "OBJLNK",
        }
    }
}

impl Serialize for ResourceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::UnsignedInteger(v) => serializer.serialize_u64(*v),
            Self::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Float(v) => Err(S::Error::custom(format!(
                "float value {v} has no JSON representation"
            ))),
            Self::Boolean(v) => serializer.serialize_bool(*v),
            Self::Opaque(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                serializer.serialize_str(&hex)
            }
            Self::Time(t) => serializer.serialize_str(&t.to_rfc3339()),
            Self::ObjectLink {
                object_id,
                instance_id,
            } => serializer.collect_str(&format_args!("{object_id}:{instance_id}")),
        }
    }
}

/// One resource inside an object instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// Single-instance resource.
    Single {
        /// Resource id.
        id: u16,
        /// Resource value.
        value: ResourceValue,
    },
    /// Multi-instance resource, keyed by resource instance id.
    Multiple {
        /// Resource id.
        id: u16,
        /// Resource instance values.
        values: BTreeMap<u16, ResourceValue>,
    },
}

/// A decoded LwM2M node at any level of the object tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LwM2mNode {
    /// Whole object with its instances.
    Object {
        /// Object id.
        id: u16,
        /// Object instances keyed by instance id.
        instances: BTreeMap<u16, BTreeMap<u16, Resource>>,
    },
    /// Object instance with its resources keyed by resource id.
    ObjectInstance {
        /// Instance id.
        id: u16,
        /// Resources keyed by resource id.
        resources: BTreeMap<u16, Resource>,
    },
    /// Single-instance resource.
    SingleResource {
        /// Resource id.
        id: u16,
        /// Resource value.
        value: ResourceValue,
    },
    /// Multi-instance resource.
    MultiResource {
        /// Resource id.
        id: u16,
        /// Values keyed by resource instance id.
        values: BTreeMap<u16, ResourceValue>,
    },
    /// One instance of a multi-instance resource.
    ResourceInstance {
        /// Resource instance id.
        id: u16,
        /// Value.
        value: ResourceValue,
    },
}

impl From<Resource> for LwM2mNode {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Single { id, value } => Self::SingleResource { id, value },
            Resource::Multiple { id, values } => Self::MultiResource { id, values },
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind")]
enum NodeRepr<'a> {
    #[serde(rename = "obj")]
    Object {
        id: u16,
        instances: Vec<NodeRepr<'a>>,
    },
    #[serde(rename = "instance")]
    ObjectInstance {
        id: u16,
        resources: Vec<NodeRepr<'a>>,
    },
    #[serde(rename = "singleResource")]
    SingleResource {
        id: u16,
        #[serde(rename = "type")]
        value_type: &'static str,
        value: &'a ResourceValue,
    },
    #[serde(rename = "multiResource")]
    MultiResource {
        id: u16,
        #[serde(rename = "type")]
        value_type: &'static str,
        values: &'a BTreeMap<u16, ResourceValue>,
    },
    #[serde(rename = "resourceInstance")]
    ResourceInstance {
        id: u16,
        #[serde(rename = "type")]
        value_type: &'static str,
        value: &'a ResourceValue,
    },
}

fn multi_type(values: &BTreeMap<u16, ResourceValue>) -> &'static str {
    values
        .values()
        .next()
        .map_or("NONE", ResourceValue::type_name)
}

fn resource_repr(resource: &Resource) -> NodeRepr<'_> {
    match resource {
        Resource::Single { id, value } => NodeRepr::SingleResource {
            id: *id,
            value_type: value.type_name(),
            value,
        },
        Resource::Multiple { id, values } => NodeRepr::MultiResource {
            id: *id,
            value_type: multi_type(values),
            values,
        },
    }
}

fn instance_repr(id: u16, resources: &BTreeMap<u16, Resource>) -> NodeRepr<'_> {
    NodeRepr::ObjectInstance {
        id,
        resources: resources.values().map(resource_repr).collect(),
    }
}

impl<'a> From<&'a LwM2mNode> for NodeRepr<'a> {
    fn from(node: &'a LwM2mNode) -> Self {
        match node {
            LwM2mNode::Object { id, instances } => NodeRepr::Object {
                id: *id,
                instances: instances
                    .iter()
                    .map(|(iid, resources)| instance_repr(*iid, resources))
                    .collect(),
            },
            LwM2mNode::ObjectInstance { id, resources } => instance_repr(*id, resources),
            LwM2mNode::SingleResource { id, value } => NodeRepr::SingleResource {
                id: *id,
                value_type: value.type_name(),
                value,
            },
            LwM2mNode::MultiResource { id, values } => NodeRepr::MultiResource {
                id: *id,
                value_type: multi_type(values),
                values,
            },
            LwM2mNode::ResourceInstance { id, value } => NodeRepr::ResourceInstance {
                id: *id,
                value_type: value.type_name(),
                value,
            },
        }
    }
}

impl Serialize for LwM2mNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeRepr::from(self).serialize(serializer)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_resource_shape() {
        let node = LwM2mNode::SingleResource {
            id: 1,
            value: ResourceValue::String("x".to_string()),
        };
        let Ok(value) = serde_json::to_value(&node) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value,
            json!({"kind": "singleResource", "id": 1, "type": "STRING", "value": "x"})
        );
    }

    #[test]
    fn object_instance_lists_resources() {
        let mut resources = BTreeMap::new();
        resources.insert(
            0,
            Resource::Single {
                id: 0,
                value: ResourceValue::String("ACME".to_string()),
            },
        );
        let mut errors = BTreeMap::new();
        errors.insert(0, ResourceValue::Integer(0));
        resources.insert(11, Resource::Multiple { id: 11, values: errors });

        let node = LwM2mNode::ObjectInstance { id: 0, resources };
        let Ok(value) = serde_json::to_value(&node) else {
            panic!("serialization failed");
        };
        assert_eq!(value["kind"], "instance");
        assert_eq!(value["resources"][1]["kind"], "multiResource");
        assert_eq!(value["resources"][1]["type"], "INTEGER");
        assert_eq!(value["resources"][1]["values"]["0"], 0);
    }

    #[test]
    fn opaque_and_objlnk_render_as_strings() {
        let Ok(hex) = serde_json::to_value(ResourceValue::Opaque(vec![0xde, 0xad, 0x01])) else {
            panic!("serialization failed");
        };
        assert_eq!(hex, json!("dead01"));
        let link = ResourceValue::ObjectLink {
            object_id: 3,
            instance_id: 0,
        };
        let Ok(link) = serde_json::to_value(link) else {
            panic!("serialization failed");
        };
        assert_eq!(link, json!("3:0"));
    }

    #[test]
    fn non_finite_float_fails_to_encode() {
        let node = LwM2mNode::SingleResource {
            id: 5700,
            value: ResourceValue::Float(f64::NAN),
        };
        assert!(serde_json::to_value(&node).is_err());
    }
}
