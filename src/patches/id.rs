use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::LazyLock;

pub const PATCH_PREFIX: &str = "patch-";
pub const PATCH_SUFFIX: &str = ".json";
pub const REPORT_PREFIX: &str = "summary-";
pub const REPORT_SUFFIX: &str = ".md";

/// Prefix/suffix pairs that map onto the shared logical id space.
const KNOWN_FORMS: &[(&str, &str)] = &[(PATCH_PREFIX, PATCH_SUFFIX), (REPORT_PREFIX, REPORT_SUFFIX)];

static COORDINATES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(P(\d+)\.(\d+)\.(\d+)\)").expect("static regex")
});

/// Map a work-item or report filename onto its logical id.
///
/// `patch-<rest>.json` and `summary-<rest>.md` both normalize to `<rest>`.
/// Names without a known prefix only lose their extension.
pub fn normalize(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    for (prefix, suffix) in KNOWN_FORMS {
        if let Some(rest) = name.strip_prefix(prefix) {
            return rest
                .strip_suffix(suffix)
                .map_or_else(|| strip_extension(rest).to_string(), str::to_string);
        }
    }

    strip_extension(name).to_string()
}

/// Strip a trailing `.ext` when `ext` looks like a file extension: ASCII
/// alphanumeric with at least one letter. Version-like tails such as `.100`
/// and fragments such as `.0)_slug` are kept.
fn strip_extension(name: &str) -> &str {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return name;
    };
    let looks_like_extension = !stem.is_empty()
        && !ext.is_empty()
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
        && ext.chars().any(|c| c.is_ascii_alphabetic());
    if looks_like_extension { stem } else { name }
}

/// Phase/step/attempt triple encoded in ids such as `v1.4.111(P0.2.1)_env-flags`.
///
/// Used for human ordering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PatchCoordinates {
    pub phase: u32,
    pub step: u32,
    pub attempt: u32,
}

impl PatchCoordinates {
    pub fn parse(id: &str) -> Option<Self> {
        let caps = COORDINATES_RE.captures(id)?;
        Some(Self {
            phase: caps[1].parse().ok()?,
            step: caps[2].parse().ok()?,
            attempt: caps[3].parse().ok()?,
        })
    }
}

impl std::fmt::Display for PatchCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}.{}.{}", self.phase, self.step, self.attempt)
    }
}

/// Human ordering: ids with coordinates first, by coordinates, then by id.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (PatchCoordinates::parse(a), PatchCoordinates::parse(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn patch_file_name(id: &str) -> String {
    format!("{PATCH_PREFIX}{id}{PATCH_SUFFIX}")
}

pub fn report_file_name(id: &str) -> String {
    format!("{REPORT_PREFIX}{id}{REPORT_SUFFIX}")
}
