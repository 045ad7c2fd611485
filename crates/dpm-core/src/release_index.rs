//! Release index (component 1, §4.1).

use chrono::{DateTime, Utc};

use crate::errors::{DpmError, DpmResult};
use crate::types::Release;

/// One release as reported by the tracker, before indexing.
#[derive(Debug, Clone)]
pub struct ReleaseDescriptor {
    /// Release name.
    pub name: String,
    /// Release date, if it has actually shipped.
    pub released: bool,
    /// Calendar date, ignored unless `released` is true.
    pub date: Option<DateTime<Utc>>,
}

/// The ordered, indexed set of releases for one project (§3, §4.1).
#[derive(Debug, Clone, Default)]
pub struct ReleaseIndex {
    releases: Vec<Release>,
}

impl ReleaseIndex {
    /// Build the index from raw descriptors: filter to released-with-a-date,
    /// sort by date ascending (ties broken by name), assign dense indices
    /// starting at 1.
    pub fn build(descriptors: Vec<ReleaseDescriptor>, project: &str) -> DpmResult<Self> {
        let mut filtered: Vec<(String, DateTime<Utc>)> = descriptors
            .into_iter()
            .filter_map(|d| {
                if d.released {
                    d.date.map(|date| (d.name, date))
                } else {
                    None
                }
            })
            .collect();

        if filtered.is_empty() {
            return Err(DpmError::NoReleases {
                project: project.to_string(),
            });
        }

        filtered.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let releases = filtered
            .into_iter()
            .enumerate()
            .map(|(i, (name, date))| Release {
                name,
                date,
                index: (i + 1) as u32,
            })
            .collect();

        Ok(Self { releases })
    }

    /// All releases, date-ascending.
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    /// Total release count, `N`.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// `true` if no releases are indexed (never true on a successfully built index).
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// The smallest index whose release date is `>= d`, or `N` if `d` is
    /// after the last release (§4.1).
    pub fn index_for_date(&self, d: DateTime<Utc>) -> u32 {
        for r in &self.releases {
            if r.date >= d {
                return r.index;
            }
        }
        self.releases.len() as u32
    }

    /// Release by 1-based index.
    pub fn by_index(&self, index: u32) -> Option<&Release> {
        self.releases.iter().find(|r| r.index == index)
    }

    /// The index of the release named `name`, if any.
    pub fn index_for_name(&self, name: &str) -> Option<u32> {
        self.releases.iter().find(|r| r.name == name).map(|r| r.index)
    }

    /// The releases whose index falls in the first `ceil(N * cutoff)` (§4.9).
    pub fn cutoff_releases(&self, cutoff: f64) -> &[Release] {
        let n = self.releases.len();
        let keep = ((n as f64) * cutoff).ceil() as usize;
        let keep = keep.clamp(0, n);
        &self.releases[..keep]
    }
}
