//! Named spatial reference systems known to tm2source projects.
//!
//! Layers refer to these either by identifier (`WGS84`, `900913`) or by the
//! full proj4 string. Generated descriptors always render into `900913`.

/// Identifier of the geographic WGS84 spatial reference.
pub const WGS84: &str = "WGS84";

/// Identifier of the spherical mercator spatial reference used for all output.
pub const SPHERICAL_MERCATOR: &str = "900913";

/// A predefined spatial reference: its proj4 projection string and the
/// bounding extent used when a datasource does not declare one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceEntry {
    /// Identifier used in project files, e.g. `WGS84`.
    pub id: &'static str,
    /// proj4 projection parameters.
    pub proj: &'static str,
    /// Default extent as `[min_x, min_y, max_x, max_y]`.
    pub extent: [f64; 4],
}

static REFERENCES: [ReferenceEntry; 2] = [
    ReferenceEntry {
        id: WGS84,
        proj: "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs",
        extent: [-180.0, -90.0, 180.0, 90.0],
    },
    ReferenceEntry {
        id: SPHERICAL_MERCATOR,
        proj: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0.0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs +over",
        extent: [
            -20_037_508.34,
            -20_037_508.34,
            20_037_508.34,
            20_037_508.34,
        ],
    },
];

/// Look up a spatial reference by its identifier.
#[must_use]
pub fn lookup(id: &str) -> Option<&'static ReferenceEntry> {
    REFERENCES.iter().find(|entry| entry.id == id)
}

/// Find the entry a layer `srs` value refers to.
///
/// Project files written by older tools store the full proj4 string rather
/// than the identifier, so both forms are accepted.
#[must_use]
pub fn find_by_srs(srs: &str) -> Option<&'static ReferenceEntry> {
    REFERENCES
        .iter()
        .find(|entry| entry.id == srs || entry.proj == srs)
}

/// The projection every generated descriptor is rendered in.
#[must_use]
pub fn output_projection() -> &'static str {
    REFERENCES[1].proj
}
