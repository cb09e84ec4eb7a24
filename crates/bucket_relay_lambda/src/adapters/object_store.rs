use bucket_relay_core::temp_scan::{ObjectSummary, TempObjectScan};

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListingPage {
    pub objects: Vec<ObjectSummary>,
    /// Present only while the listing is truncated.
    pub next_continuation_token: Option<String>,
}

pub trait ObjectStore {
    /// Content length of an object, read from its metadata.
    fn object_size(&self, bucket: &str, key: &str) -> Result<u64, String>;

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), String>;

    fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectListingPage, String>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), String>;
}

/// Pages through the whole bucket and folds every listed object into a
/// [`TempObjectScan`]. Returns the scan and the number of pages read.
pub fn scan_bucket(
    store: &impl ObjectStore,
    bucket: &str,
) -> Result<(TempObjectScan, usize), String> {
    let mut scan = TempObjectScan::new();
    let mut pages = 0usize;
    let mut continuation_token: Option<String> = None;

    loop {
        let page = store.list_objects_page(bucket, continuation_token.as_deref())?;
        pages += 1;
        scan.observe_page(&page.objects);

        match page.next_continuation_token {
            Some(token) if continuation_token.as_deref() != Some(token.as_str()) => {
                continuation_token = Some(token);
            }
            Some(token) => {
                return Err(format!(
                    "listing of bucket {bucket} returned a repeated continuation token: {token}"
                ));
            }
            None => return Ok((scan, pages)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::InMemoryObjectStore;

    use super::*;

    struct StuckListing;

    impl ObjectStore for StuckListing {
        fn object_size(&self, _bucket: &str, _key: &str) -> Result<u64, String> {
            Ok(0)
        }

        fn copy_object(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), String> {
            Ok(())
        }

        fn list_objects_page(
            &self,
            _bucket: &str,
            _continuation_token: Option<&str>,
        ) -> Result<ObjectListingPage, String> {
            Ok(ObjectListingPage {
                objects: Vec::new(),
                next_continuation_token: Some("same".to_string()),
            })
        }

        fn delete_object(&self, _bucket: &str, _key: &str) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn scan_reads_every_page() {
        let store = InMemoryObjectStore::with_page_size(2);
        store.put_object("dst", "a-temp-1", &[0; 100], 1_000);
        store.put_object("dst", "b-temp-2", &[0; 200], 2_000);
        store.put_object("dst", "c-final", &[0; 50], 500);
        store.put_object("dst", "d-temp-3", &[0; 25], 3_000);
        store.put_object("dst", "e-notes", &[0; 10], 100);

        let (scan, pages) = scan_bucket(&store, "dst").expect("scan should succeed");

        assert_eq!(pages, 3);
        assert_eq!(scan.objects_seen(), 5);
        assert_eq!(scan.total_temp_bytes(), 325);
        assert_eq!(scan.oldest().map(|o| o.key.as_str()), Some("a-temp-1"));
    }

    #[test]
    fn scan_of_empty_bucket_reads_one_page() {
        let store = InMemoryObjectStore::new();
        let (scan, pages) = scan_bucket(&store, "dst").expect("scan should succeed");
        assert_eq!(pages, 1);
        assert_eq!(scan.objects_seen(), 0);
    }

    #[test]
    fn scan_stops_on_repeated_continuation_token() {
        let error = scan_bucket(&StuckListing, "dst").expect_err("stuck listing should fail");
        assert!(error.contains("repeated continuation token"));
    }

    #[test]
    fn scan_propagates_listing_failure() {
        let store = InMemoryObjectStore::new();
        store.fail_operation("list_objects_v2");
        let error = scan_bucket(&store, "dst").expect_err("listing failure should propagate");
        assert!(error.contains("list_objects_v2"));
    }
}
