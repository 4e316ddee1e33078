//! First-pass reading of relations straight from an OSM PBF file.

use std::path::{Path, PathBuf};

use osmpbf::{Element, ElementReader, RelMemberType};
use thiserror::Error;

use landform_core::{ItemKind, Member, Meta, Relation};

use crate::util::RelationsCollector;

/// Errors returned when reading relations from an OSM PBF file.
#[derive(Debug, Error)]
pub enum PbfReadError {
    #[error("failed to open OSM PBF file at {path:?}")]
    Open {
        #[source]
        source: osmpbf::Error,
        path: PathBuf,
    },
    #[error("failed to decode OSM PBF data at {path:?}")]
    Decode {
        #[source]
        source: osmpbf::Error,
        path: PathBuf,
    },
}

/// Feed every relation in the PBF file at `path` to the managers' first
/// pass, then call `prepare_for_lookup` on each.
///
/// Nodes and ways in the file are skipped; the second pass needs ways
/// with resolved node locations, which a raw PBF file does not carry, so
/// pass two input comes from elsewhere in the pipeline.
pub fn read_relations_from_pbf(
    path: &Path,
    managers: &mut [&mut dyn RelationsCollector],
) -> Result<(), PbfReadError> {
    let reader = ElementReader::from_path(path).map_err(|source| PbfReadError::Open {
        source,
        path: path.to_path_buf(),
    })?;

    reader
        .for_each(|element| {
            if let Element::Relation(source) = element {
                let members = source
                    .members()
                    .map(|member| {
                        let kind = match member.member_type {
                            RelMemberType::Node => ItemKind::Node,
                            RelMemberType::Way => ItemKind::Way,
                            RelMemberType::Relation => ItemKind::Relation,
                        };
                        Member::new(kind, member.member_id, member.role().unwrap_or(""))
                    })
                    .collect();

                let mut relation = Relation::new(source.id(), members);
                for (key, value) in source.tags() {
                    relation.tags.insert(key, value);
                }
                let info = source.info();
                relation.meta = Meta {
                    version: info.version().unwrap_or(0),
                    changeset: info.changeset().unwrap_or(0),
                    timestamp: info.milli_timestamp().unwrap_or(0) / 1000,
                    uid: info.uid().unwrap_or(0),
                    user: info
                        .user()
                        .and_then(|user| user.ok())
                        .unwrap_or("")
                        .to_owned(),
                    visible: info.visible(),
                };

                for manager in managers.iter_mut() {
                    manager.collect_relation(&relation);
                }
            }
        })
        .map_err(|source| PbfReadError::Decode {
            source,
            path: path.to_path_buf(),
        })?;

    for manager in managers.iter_mut() {
        manager.prepare_for_lookup();
    }
    Ok(())
}
