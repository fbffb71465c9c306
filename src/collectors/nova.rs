//! Parsing of the Nova instance metadata attached to a domain.
//!
//! The orchestration layer annotates each domain with an XML blob under its
//! own metadata namespace, describing the instance's flavor, owning user and
//! project, and creation time. The exporter derives a single age metric from
//! it; everything else in the blob is ignored.
//!
//! Creation times are written in the fixed format `YYYY-MM-DD HH:MM:SS`
//! without a timezone. They are interpreted as UTC here; deployments whose
//! control plane writes local time will see a constant offset in the age
//! metric.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// Namespace URI the orchestration layer registers its metadata under.
pub const METADATA_NAMESPACE: &str = "http://openstack.org/xmlns/libvirt/nova/1.0";

const CREATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed instance metadata XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("invalid creation time `{value}`: {source}")]
    CreationTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Deserialize)]
struct InstanceXml {
    #[serde(rename = "creationTime")]
    creation_time: String,
    flavor: FlavorXml,
    owner: OwnerXml,
}

#[derive(Debug, Deserialize)]
struct FlavorXml {
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwnerXml {
    user: OwnedByXml,
    project: OwnedByXml,
}

#[derive(Debug, Deserialize)]
struct OwnedByXml {
    #[serde(rename = "@uuid")]
    uuid: String,
}

/// The fields the exporter cares about, lifted out of the metadata blob.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMetadata {
    pub instance_type: String,
    pub user_id: String,
    pub project_id: String,
    creation_time: NaiveDateTime,
}

impl InstanceMetadata {
    /// Parses an instance metadata XML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Xml`] when the document does not match the expected
    /// shape and [`Error::CreationTime`] when the creation timestamp does
    /// not follow the canonical format.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let raw: InstanceXml = quick_xml::de::from_str(xml)?;
        let creation_time =
            NaiveDateTime::parse_from_str(raw.creation_time.trim(), CREATION_TIME_FORMAT).map_err(
                |source| Error::CreationTime {
                    value: raw.creation_time.clone(),
                    source,
                },
            )?;

        Ok(Self {
            instance_type: raw.flavor.name,
            user_id: raw.owner.user.uuid,
            project_id: raw.owner.project.uuid,
            creation_time,
        })
    }

    /// Seconds elapsed between the instance's creation and `now`.
    ///
    /// Monotonically increasing as long as the creation time is stable; a
    /// recreated domain starts over, which downstream consumers observe as
    /// a counter reset.
    pub fn age_seconds(&self, now: NaiveDateTime) -> f64 {
        (now - self.creation_time).num_seconds() as f64
    }
}
