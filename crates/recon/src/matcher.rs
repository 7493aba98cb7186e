use std::collections::HashMap;

use crate::model::Record;

/// id → record lookup for one source.
///
/// Keys keep the position of their first occurrence; a later record with the
/// same id overwrites the value slot (last write wins).
pub struct KeyedTable<'a> {
    order: Vec<&'a str>,
    index: HashMap<&'a str, &'a Record>,
    occurrences: HashMap<&'a str, usize>,
}

impl<'a> KeyedTable<'a> {
    pub fn build(records: &'a [Record]) -> Self {
        let mut order = Vec::new();
        let mut index = HashMap::new();
        let mut occurrences: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let id = record.id.as_str();
            let seen = occurrences.entry(id).or_insert(0);
            if *seen == 0 {
                order.push(id);
            }
            *seen += 1;
            index.insert(id, record);
        }

        Self {
            order,
            index,
            occurrences,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Record> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of unique ids.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Surviving records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.order.iter().map(move |id| self.index[id])
    }

    /// Ids that occurred more than once, in first-occurrence order, with counts.
    pub fn duplicates(&self) -> Vec<(&'a str, usize)> {
        self.order
            .iter()
            .filter_map(|id| {
                let count = self.occurrences[id];
                (count > 1).then_some((*id, count))
            })
            .collect()
    }
}

/// Key-level partition of two tables.
#[derive(Debug)]
pub struct Partition<'a> {
    pub primary_only: Vec<&'a Record>,
    pub external_only: Vec<&'a Record>,
    /// (primary, external) pairs sharing an id, in primary key order.
    pub matched: Vec<(&'a Record, &'a Record)>,
}

/// Split two tables by id.
///
/// The intersection is computed by walking the primary table and probing the
/// external one, so output order depends only on input order.
pub fn partition<'a>(primary: &KeyedTable<'a>, external: &KeyedTable<'a>) -> Partition<'a> {
    let mut primary_only = Vec::new();
    let mut matched = Vec::new();

    for record in primary.iter() {
        match external.get(&record.id) {
            Some(other) => matched.push((record, other)),
            None => primary_only.push(record),
        }
    }

    let external_only = external
        .iter()
        .filter(|r| !primary.contains(&r.id))
        .collect();

    Partition {
        primary_only,
        external_only,
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Origin;

    fn rec(id: &str, name: &str) -> Record {
        Record::new(id, name, Origin::Primary)
    }

    #[test]
    fn last_write_wins_keeps_first_position() {
        let records = vec![rec("5", "First"), rec("6", "Other"), rec("5", "Second")];
        let table = KeyedTable::build(&records);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("5").unwrap().name, "Second");
        let ids: Vec<&str> = table.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "6"]);
        assert_eq!(table.duplicates(), vec![("5", 2)]);
    }

    #[test]
    fn ids_are_case_sensitive() {
        let records = vec![rec("net30", "a"), rec("NET30", "b")];
        let table = KeyedTable::build(&records);
        assert_eq!(table.len(), 2);
        assert!(table.duplicates().is_empty());
    }

    #[test]
    fn partition_splits_by_key() {
        let left = vec![rec("1", "a"), rec("2", "b")];
        let right = vec![rec("3", "c"), rec("2", "b")];
        let lt = KeyedTable::build(&left);
        let rt = KeyedTable::build(&right);
        let p = partition(&lt, &rt);
        assert_eq!(p.primary_only.len(), 1);
        assert_eq!(p.primary_only[0].id, "1");
        assert_eq!(p.external_only.len(), 1);
        assert_eq!(p.external_only[0].id, "3");
        assert_eq!(p.matched.len(), 1);
        assert_eq!(p.matched[0].0.id, "2");
    }

    #[test]
    fn matched_follow_primary_order() {
        let left = vec![rec("b", ""), rec("a", ""), rec("c", "")];
        let right = vec![rec("c", ""), rec("a", ""), rec("b", "")];
        let lt = KeyedTable::build(&left);
        let rt = KeyedTable::build(&right);
        let p = partition(&lt, &rt);
        let ids: Vec<&str> = p.matched.iter().map(|(l, _)| l.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_tables() {
        let none: Vec<Record> = Vec::new();
        let t = KeyedTable::build(&none);
        assert!(t.is_empty());
        let p = partition(&t, &t);
        assert!(p.primary_only.is_empty() && p.external_only.is_empty() && p.matched.is_empty());
    }
}
