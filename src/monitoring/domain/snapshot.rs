use super::application_record::{ApplicationRecord, IdentityKey};
use std::collections::HashMap;

/// A complete point-in-time inventory, keyed by identity key.
///
/// Keys are unique; building from records that repeat a key keeps the last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: HashMap<IdentityKey, ApplicationRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ApplicationRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.key().clone(), record))
            .collect();
        Self { records }
    }

    pub fn insert(&mut self, record: ApplicationRecord) {
        self.records.insert(record.key().clone(), record);
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&ApplicationRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &ApplicationRecord> {
        self.records.values()
    }

    /// Records sorted by identity key, for stable presentation and batching.
    pub fn sorted_records(&self) -> Vec<&ApplicationRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.key().cmp(b.key()));
        records
    }

    pub fn into_records(self) -> Vec<ApplicationRecord> {
        let mut records: Vec<_> = self.records.into_values().collect();
        records.sort_by(|a, b| a.key().cmp(b.key()));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, name: &str) -> ApplicationRecord {
        ApplicationRecord::new(IdentityKey::new(key).unwrap(), name)
    }

    #[test]
    fn test_from_records_last_duplicate_wins() {
        let snapshot = Snapshot::from_records(vec![
            record("/Applications/A.app", "A").with_version("1.0"),
            record("/Applications/B.app", "B"),
            record("/Applications/A.app", "A").with_version("2.0"),
        ]);

        assert_eq!(snapshot.len(), 2);
        let key = IdentityKey::new("/Applications/A.app").unwrap();
        assert_eq!(snapshot.get(&key).unwrap().version(), "2.0");
    }

    #[test]
    fn test_sorted_records_order() {
        let snapshot = Snapshot::from_records(vec![
            record("/c", "C"),
            record("/a", "A"),
            record("/b", "B"),
        ]);

        let names: Vec<_> = snapshot.sorted_records().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::new();
        assert!(snapshot.is_empty());
        assert!(!snapshot.contains(&IdentityKey::new("/a").unwrap()));
    }
}
