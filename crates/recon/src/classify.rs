use std::collections::BTreeSet;

use crate::model::{Conflict, ConflictReason, Record, FIELD_NAME};

/// Fields compared for a matched pair: `name` plus the union of both records'
/// secondary fields.
pub fn compared_fields<'r>(primary: &'r Record, external: &'r Record) -> Vec<&'r str> {
    let secondary: BTreeSet<&str> = primary
        .fields
        .keys()
        .chain(external.fields.keys())
        .map(String::as_str)
        .collect();

    std::iter::once(FIELD_NAME).chain(secondary).collect()
}

/// Classify a matched pair. Returns a `field_mismatch` conflict when any
/// compared field differs, `None` when the pair is fully reconciled.
pub fn classify_pair(primary: &Record, external: &Record) -> Option<Conflict> {
    let fields = compared_fields(primary, external);

    let differs = fields
        .iter()
        .any(|f| !values_equal(primary.field(f), external.field(f)));
    if !differs {
        return None;
    }

    Some(Conflict {
        id: primary.id.clone(),
        reason: ConflictReason::FieldMismatch,
        primary: primary.projection(fields.iter().copied()),
        external: external.projection(fields.iter().copied()),
    })
}

/// Exact, case-sensitive comparison; an absent field equals an empty one.
fn values_equal(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or("") == b.unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Origin, FIELD_NUMBER, FIELD_TYPE};

    fn acct(id: &str, name: &str, number: &str, ty: &str, origin: Origin) -> Record {
        Record::new(id, name, origin)
            .with_field(FIELD_NUMBER, number)
            .with_field(FIELD_TYPE, ty)
    }

    #[test]
    fn identical_pair_is_reconciled() {
        let p = acct("3", "Income", "3000", "INCOME", Origin::Primary);
        let e = acct("3", "Income", "3000", "INCOME", Origin::External);
        assert!(classify_pair(&p, &e).is_none());
    }

    #[test]
    fn name_mismatch_carries_full_projection() {
        let p = acct("2", "Expense", "2000", "EXPENSE", Origin::Primary);
        let e = acct("2", "Expenses", "2000", "EXPENSE", Origin::External);
        let c = classify_pair(&p, &e).unwrap();
        assert_eq!(c.reason, ConflictReason::FieldMismatch);
        assert_eq!(c.primary_value("name"), Some("Expense"));
        assert_eq!(c.external_value("name"), Some("Expenses"));
        assert_eq!(c.primary_value("number"), Some("2000"));
        assert_eq!(c.external_value("type"), Some("EXPENSE"));
        assert_eq!(c.differing_fields(), vec!["name"]);
    }

    #[test]
    fn secondary_field_mismatch_is_a_conflict() {
        let p = acct("1", "Asset", "10000", "ASSET", Origin::Primary);
        let e = acct("1", "Asset", "10000", "EXPENSE", Origin::External);
        let c = classify_pair(&p, &e).unwrap();
        assert_eq!(c.differing_fields(), vec!["type"]);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let p = Record::new("1", "Cash", Origin::Primary);
        let e = Record::new("1", "CASH", Origin::External);
        assert!(classify_pair(&p, &e).is_some());
    }

    #[test]
    fn field_missing_on_one_side_is_null_in_snapshot() {
        let p = Record::new("7", "Rent", Origin::Primary).with_field(FIELD_NUMBER, "7000");
        let e = Record::new("7", "Rent", Origin::External);
        let c = classify_pair(&p, &e).unwrap();
        assert_eq!(c.primary_value("number"), Some("7000"));
        assert_eq!(c.external.get("number"), Some(&None));
    }

    #[test]
    fn absent_field_equals_empty_field() {
        let p = Record::new("7", "Rent", Origin::Primary).with_field(FIELD_NUMBER, "");
        let e = Record::new("7", "Rent", Origin::External);
        assert!(classify_pair(&p, &e).is_none());
    }

    #[test]
    fn compared_fields_union_name_first() {
        let p = Record::new("1", "a", Origin::Primary).with_field("type", "x");
        let e = Record::new("1", "a", Origin::External).with_field("number", "y");
        assert_eq!(compared_fields(&p, &e), vec!["name", "number", "type"]);
    }
}
