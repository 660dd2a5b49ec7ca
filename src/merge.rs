use crate::models::{App, Version};
use crate::version_cmp::compare_version_records;
use std::collections::{HashMap, HashSet};

/// One merged entry plus the release keys already taken.
struct Group {
    app: App,
    seen: HashSet<(String, String)>,
}

impl Group {
    fn new(mut app: App) -> Self {
        app.bundle_id = app.bundle_id.trim().to_string();
        let versions = std::mem::take(&mut app.versions);
        let mut group = Group {
            app,
            seen: HashSet::new(),
        };
        group.add_versions(versions);
        group
    }

    fn add_versions(&mut self, versions: Vec<Version>) {
        for v in versions {
            let (version, url) = v.dedup_key();
            if self.seen.insert((version.to_string(), url.to_string())) {
                self.app.versions.push(v);
            }
        }
    }

    /// Fills empty scalar fields from a later contributor; set fields stay.
    fn absorb(&mut self, other: App) {
        let target = &mut self.app;
        fill_empty(&mut target.name, other.name);
        fill_empty(&mut target.developer, other.developer);
        fill_empty(&mut target.icon_url, other.icon_url);
        fill_empty(&mut target.description, other.description);
        fill_empty(&mut target.source, other.source);

        for source in other.sources {
            if !target.sources.contains(&source) {
                target.sources.push(source);
            }
        }
        self.add_versions(other.versions);
    }

    fn finish(mut self) -> App {
        self.app.versions.sort_by(compare_version_records);
        self.app
    }
}

fn fill_empty(slot: &mut String, candidate: String) {
    if slot.trim().is_empty() && !candidate.trim().is_empty() {
        *slot = candidate;
    }
}

#[derive(Default)]
struct MergeState {
    groups: Vec<Group>,
    by_bundle: HashMap<String, usize>,
}

impl MergeState {
    fn push(mut self, app: App) -> Self {
        if !app.has_bundle_id() {
            // No identity to merge on: always a group of its own.
            self.groups.push(Group::new(app));
            return self;
        }

        let key = app.bundle_id.trim().to_string();

        match self.by_bundle.get(&key) {
            Some(&idx) => self.groups[idx].absorb(app),
            None => {
                self.by_bundle.insert(key, self.groups.len());
                self.groups.push(Group::new(app));
            }
        }
        self
    }
}

/// Merges normalized apps from every source by bundle identifier.
///
/// Groups come out in first-seen order. Within a group the first non-empty
/// value wins for each scalar field, releases are deduplicated on
/// (version, download URL) keeping the first one seen, and the release list
/// is sorted newest first. Apps without a bundle identifier are never merged.
pub fn merge_apps(apps: Vec<App>) -> Vec<App> {
    apps.into_iter()
        .fold(MergeState::default(), MergeState::push)
        .groups
        .into_iter()
        .map(Group::finish)
        .collect()
}
