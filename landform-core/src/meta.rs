//! OSM object metadata.

/// Version, changeset and authorship information attached to every OSM
/// object. Derived areas carry the metadata of their source relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub version: i32,
    pub changeset: i64,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub uid: i32,
    pub user: String,
    pub visible: bool,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            version: 0,
            changeset: 0,
            timestamp: 0,
            uid: 0,
            user: String::new(),
            visible: true,
        }
    }
}

impl Meta {
    /// Approximate heap footprint in bytes, for memory telemetry.
    pub fn stored_size(&self) -> usize {
        self.user.capacity()
    }
}
