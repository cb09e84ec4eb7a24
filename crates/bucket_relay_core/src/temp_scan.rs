use chrono::{DateTime, Utc};

use crate::object_keys::is_temp_key;

/// Listing entry for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

/// Running aggregate over a bucket listing, fed page by page.
///
/// Tracks the total size of temp-marked objects and the oldest of them. The
/// oldest is replaced only by a strictly older timestamp, so on ties the
/// first object in listing order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TempObjectScan {
    objects_seen: usize,
    temp_objects: usize,
    total_temp_bytes: u64,
    oldest: Option<ObjectSummary>,
}

impl TempObjectScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, object: &ObjectSummary) {
        self.objects_seen += 1;
        if !is_temp_key(&object.key) {
            return;
        }

        self.temp_objects += 1;
        self.total_temp_bytes = self.total_temp_bytes.saturating_add(object.size_bytes);

        let is_older = self
            .oldest
            .as_ref()
            .map(|current| object.last_modified < current.last_modified)
            .unwrap_or(true);
        if is_older {
            self.oldest = Some(object.clone());
        }
    }

    pub fn observe_page(&mut self, objects: &[ObjectSummary]) {
        for object in objects {
            self.observe(object);
        }
    }

    pub fn objects_seen(&self) -> usize {
        self.objects_seen
    }

    pub fn temp_objects(&self) -> usize {
        self.temp_objects
    }

    pub fn total_temp_bytes(&self) -> u64 {
        self.total_temp_bytes
    }

    pub fn oldest(&self) -> Option<&ObjectSummary> {
        self.oldest.as_ref()
    }
}

pub fn scan_temp_objects<'a>(
    objects: impl IntoIterator<Item = &'a ObjectSummary>,
) -> TempObjectScan {
    let mut scan = TempObjectScan::new();
    for object in objects {
        scan.observe(object);
    }
    scan
}

/// Report line for the temp-object total. Log metric filters parse this text.
pub fn total_size_message(bucket: &str, total_bytes: u64) -> String {
    format!("Total size of temp objects in {bucket}: {total_bytes} bytes")
}
