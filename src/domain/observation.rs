//! Observations as established by the observation engine.

use std::fmt;

use super::LwM2mPath;

/// Observation on a single node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleObservation {
    /// Observation id (CoAP token, hex).
    pub id: String,
    /// Id of the registration the observation belongs to.
    pub registration_id: String,
    /// Observed path.
    pub path: LwM2mPath,
}

/// Observe-Composite observation over several paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeObservation {
    /// Observation id (CoAP token, hex).
    pub id: String,
    /// Id of the registration the observation belongs to.
    pub registration_id: String,
    /// Observed paths, in request order.
    pub paths: Vec<LwM2mPath>,
}

/// Either kind of observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Single-path observation.
    Single(SingleObservation),
    /// Composite observation.
    Composite(CompositeObservation),
}

impl Observation {
    /// Returns the registration id the observation belongs to.
    #[must_use]
    pub fn registration_id(&self) -> &str {
        match self {
            Self::Single(o) => &o.registration_id,
            Self::Composite(o) => &o.registration_id,
        }
    }

    /// Returns a displayable rendering of the observed path(s).
    #[must_use]
    pub fn paths(&self) -> ObservedPaths<'_> {
        ObservedPaths(self)
    }
}

/// Display helper for [`Observation::paths`].
#[derive(Debug)]
pub struct ObservedPaths<'a>(&'a Observation);

impl fmt::Display for ObservedPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Observation::Single(o) => write!(f, "{}", o.path),
            Observation::Composite(o) => {
                f.write_str("[")?;
                for (i, path) in o.paths.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{path}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_paths_render_as_list() {
        let obs = Observation::Composite(CompositeObservation {
            id: "0a0b".to_string(),
            registration_id: "reg-1".to_string(),
            paths: vec![LwM2mPath::resource(3, 0, 1), LwM2mPath::object(6)],
        });
        assert_eq!(obs.paths().to_string(), "[/3/0/1, /6]");
        assert_eq!(obs.registration_id(), "reg-1");
    }

    #[test]
    fn single_path_renders_plain() {
        let obs = Observation::Single(SingleObservation {
            id: "01".to_string(),
            registration_id: "reg-2".to_string(),
            path: LwM2mPath::resource(3303, 0, 5700),
        });
        assert_eq!(obs.paths().to_string(), "/3303/0/5700");
    }
}
