//! Query predicates for the remote record store.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::{FieldValue, RecordId, RecordType, RemoteRecord};

/// Filter applied to records of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Match every record.
    All,
    /// Match records whose field equals the value.
    Equals {
        /// Field name.
        field: String,
        /// Value the field must equal.
        value: FieldValue,
    },
    /// Match records whose id is not in the set. Unsaved records always match.
    RecordIdNotIn(BTreeSet<RecordId>),
}

impl Predicate {
    /// Equality on a text field.
    pub fn text_equals(field: &str, value: &str) -> Self {
        Self::Equals {
            field: field.to_string(),
            value: FieldValue::Text(value.to_string()),
        }
    }

    /// Evaluate this predicate against a record.
    ///
    /// Stores without a server-side query engine use this to filter.
    pub fn matches(&self, record: &RemoteRecord) -> bool {
        match self {
            Self::All => true,
            Self::Equals { field, value } => record.get(field) == Some(value),
            Self::RecordIdNotIn(excluded) => match &record.record_id {
                Some(id) => !excluded.contains(id),
                None => true,
            },
        }
    }
}

/// Sort order for query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    /// Field to sort by.
    pub field: String,
    /// Ascending when true.
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortDescriptor {
    /// Compare two records on this descriptor's field.
    ///
    /// Records missing the field sort last regardless of direction.
    pub fn compare(&self, a: &RemoteRecord, b: &RemoteRecord) -> Ordering {
        let ord = match (a.get(&self.field), b.get(&self.field)) {
            (Some(x), Some(y)) => compare_values(x, y),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }
}

fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (FieldValue::Integer(x), FieldValue::Integer(y)) => x.cmp(y),
        (FieldValue::Double(x), FieldValue::Double(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Integer(x), FieldValue::Double(y)) => {
            (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Double(x), FieldValue::Integer(y)) => {
            x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal)
        }
        _ => Ordering::Equal,
    }
}

/// A query against one record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Record type to search.
    pub record_type: RecordType,
    /// Filter.
    pub predicate: Predicate,
    /// Sort order, applied in sequence. Empty means store order.
    pub sort: Vec<SortDescriptor>,
}

impl Query {
    /// Create a query with no sort order.
    pub fn new(record_type: RecordType, predicate: Predicate) -> Self {
        Self {
            record_type,
            predicate,
            sort: Vec::new(),
        }
    }

    /// Add a sort descriptor.
    pub fn sorted_by(mut self, descriptor: SortDescriptor) -> Self {
        self.sort.push(descriptor);
        self
    }

    /// Whether a record satisfies both the type and the predicate.
    pub fn matches(&self, record: &RemoteRecord) -> bool {
        record.record_type == self.record_type && self.predicate.matches(record)
    }

    /// Sort records in place according to this query's descriptors.
    pub fn sort_records(&self, records: &mut [RemoteRecord]) {
        if self.sort.is_empty() {
            return;
        }
        records.sort_by(|a, b| {
            self.sort
                .iter()
                .map(|d| d.compare(a, b))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(id: &str, record_id: Option<&str>) -> RemoteRecord {
        let mut r = RemoteRecord::new(RecordType::Pet);
        r.set("id", id);
        r.record_id = record_id.map(RecordId::from);
        r
    }

    #[test]
    fn all_matches_everything() {
        assert!(Predicate::All.matches(&pet("p1", None)));
        assert!(Predicate::All.matches(&pet("p2", Some("rec-1"))));
    }

    #[test]
    fn equals_matches_field() {
        let p = Predicate::text_equals("id", "p1");
        assert!(p.matches(&pet("p1", Some("rec-1"))));
        assert!(!p.matches(&pet("p2", Some("rec-2"))));
    }

    #[test]
    fn equals_does_not_match_missing_field() {
        let p = Predicate::text_equals("name", "Rex");
        assert!(!p.matches(&pet("p1", None)));
    }

    #[test]
    fn not_in_excludes_listed_ids() {
        let excluded: BTreeSet<RecordId> = ["rec-1", "rec-2"].into_iter().map(RecordId::from).collect();
        let p = Predicate::RecordIdNotIn(excluded);
        assert!(!p.matches(&pet("p1", Some("rec-1"))));
        assert!(!p.matches(&pet("p2", Some("rec-2"))));
        assert!(p.matches(&pet("p3", Some("rec-3"))));
        assert!(p.matches(&pet("p4", None)));
    }

    #[test]
    fn query_checks_record_type() {
        let q = Query::new(RecordType::Shelter, Predicate::All);
        assert!(!q.matches(&pet("p1", Some("rec-1"))));
    }

    #[test]
    fn sort_descending_with_missing_last() {
        let mut a = pet("a", Some("rec-1"));
        a.set("last_update", "2017-11-01");
        let mut b = pet("b", Some("rec-2"));
        b.set("last_update", "2017-11-09");
        let c = pet("c", Some("rec-3"));

        let q = Query::new(RecordType::Pet, Predicate::All).sorted_by(SortDescriptor {
            field: "last_update".into(),
            ascending: false,
        });
        let mut records = vec![c, a, b];
        q.sort_records(&mut records);

        let order: Vec<_> = records.iter().map(|r| r.entity_id().unwrap()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }
}
