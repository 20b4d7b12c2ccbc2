use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::columns::{CellContext, CellValue, ColumnId, ColumnSet};
use crate::domain::RosterError;
use crate::record::Person;

/// Below this many records the sort keys are extracted sequentially.
const PARALLEL_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// At most one active (column, direction) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState(Option<(ColumnId, SortDirection)>);

impl SortState {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn by(column: ColumnId, direction: SortDirection) -> Self {
        Self(Some((column, direction)))
    }

    pub fn active(&self) -> Option<(ColumnId, SortDirection)> {
        self.0
    }

    pub fn direction_of(&self, column: ColumnId) -> Option<SortDirection> {
        match self.0 {
            Some((id, dir)) if id == column => Some(dir),
            _ => None,
        }
    }

    /// Header click: none -> ascending -> descending -> none. A click on a
    /// different column starts over at ascending on that column.
    pub fn toggled(&self, column: ColumnId) -> Self {
        match self.direction_of(column) {
            None => Self::by(column, SortDirection::Ascending),
            Some(SortDirection::Ascending) => Self::by(column, SortDirection::Descending),
            Some(SortDirection::Descending) => Self::none(),
        }
    }
}

/// Joins the records with the column definitions and the active sort.
/// Returns record indices in display order.
pub fn sorted_rows(
    records: &[Person],
    columns: &ColumnSet,
    sort: &SortState,
    ctx: &CellContext,
) -> Result<Vec<usize>, RosterError> {
    let mut rows: Vec<usize> = (0..records.len()).collect();
    let Some((column_id, direction)) = sort.active() else {
        trace!("No active sort, keeping input order of {} rows", rows.len());
        return Ok(rows);
    };

    let column = columns.require(column_id)?;
    if !column.is_sortable() {
        return Err(RosterError::NotSortable(column_id.to_string()));
    }

    let directed = |ord: Ordering| match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    };

    // `sort_by` is stable, equal keys keep their input order in both directions.
    if column.has_custom_compare() {
        rows.sort_by(|&a, &b| directed(column.compare(&records[a], &records[b], ctx)));
    } else {
        let keys: Vec<CellValue> = if records.len() >= PARALLEL_THRESHOLD {
            records.par_iter().map(|p| column.value(p, ctx)).collect()
        } else {
            records.iter().map(|p| column.value(p, ctx)).collect()
        };
        rows.sort_by(|&a, &b| directed(keys[a].cmp(&keys[b])));
    }

    debug!("Sorted {} rows by {column_id} {direction:?}", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::tests::{ctx, person};
    use crate::columns::{
        person_columns, CellValue, ColumnDef, ColumnSet, DAYS_SINCE_REGISTERED, FIRST_NAME,
        FULL_NAME, ID, LAST_NAME,
    };
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn ids(records: &[Person], rows: &[usize]) -> Vec<u32> {
        rows.iter().map(|&r| records[r].id).collect()
    }

    #[test]
    fn toggle_cycles_with_period_three() {
        let s0 = SortState::none();
        let s1 = s0.toggled(FIRST_NAME);
        let s2 = s1.toggled(FIRST_NAME);
        let s3 = s2.toggled(FIRST_NAME);
        assert_eq!(s1, SortState::by(FIRST_NAME, SortDirection::Ascending));
        assert_eq!(s2, SortState::by(FIRST_NAME, SortDirection::Descending));
        assert_eq!(s3, s0);
    }

    #[test]
    fn toggling_another_column_resets_previous() {
        let s = SortState::none().toggled(ID).toggled(ID);
        let s = s.toggled(LAST_NAME);
        assert_eq!(s, SortState::by(LAST_NAME, SortDirection::Ascending));
        assert_eq!(s.direction_of(ID), None);
    }

    #[test]
    fn sort_scenario_by_first_name() {
        let records = vec![person(1, "B", "X", date(1)), person(2, "A", "Y", date(2))];
        let columns = person_columns().unwrap();

        let mut sort = SortState::none().toggled(FIRST_NAME);
        let rows = sorted_rows(&records, &columns, &sort, &ctx()).unwrap();
        assert_eq!(ids(&records, &rows), vec![2, 1]);

        sort = sort.toggled(FIRST_NAME);
        let rows = sorted_rows(&records, &columns, &sort, &ctx()).unwrap();
        assert_eq!(ids(&records, &rows), vec![1, 2]);

        sort = sort.toggled(FIRST_NAME);
        let rows = sorted_rows(&records, &columns, &sort, &ctx()).unwrap();
        assert_eq!(ids(&records, &rows), vec![1, 2]);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let records = vec![
            person(1, "Kim", "A", date(1)),
            person(2, "Lee", "B", date(2)),
            person(3, "Kim", "C", date(3)),
            person(4, "Lee", "D", date(4)),
            person(5, "Kim", "E", date(5)),
        ];
        let columns = person_columns().unwrap();

        let asc = SortState::by(FIRST_NAME, SortDirection::Ascending);
        let rows = sorted_rows(&records, &columns, &asc, &ctx()).unwrap();
        assert_eq!(ids(&records, &rows), vec![1, 3, 5, 2, 4]);

        let desc = SortState::by(FIRST_NAME, SortDirection::Descending);
        let rows = sorted_rows(&records, &columns, &desc, &ctx()).unwrap();
        assert_eq!(ids(&records, &rows), vec![2, 4, 1, 3, 5]);
    }

    #[test]
    fn computed_column_sorts_with_comparator() {
        let records = vec![
            person(1, "A", "A", date(20)),
            person(2, "B", "B", date(5)),
            person(3, "C", "C", date(12)),
        ];
        let columns = person_columns().unwrap();
        let sort = SortState::by(DAYS_SINCE_REGISTERED, SortDirection::Ascending);
        let rows = sorted_rows(&records, &columns, &sort, &ctx()).unwrap();
        assert_eq!(ids(&records, &rows), vec![1, 3, 2]);
    }

    #[test]
    fn computed_column_without_comparator_is_not_sortable() {
        let records = vec![person(1, "A", "A", date(1))];
        let columns = person_columns().unwrap();
        let sort = SortState::by(FULL_NAME, SortDirection::Ascending);
        assert!(matches!(
            sorted_rows(&records, &columns, &sort, &ctx()),
            Err(RosterError::NotSortable(_))
        ));
    }

    #[test]
    fn unknown_sort_column_is_an_error() {
        let columns = ColumnSet::new(vec![ColumnDef::field(ID, "ID", 4, |p, _| {
            CellValue::Int(p.id as i64)
        })])
        .unwrap();
        let sort = SortState::by(LAST_NAME, SortDirection::Ascending);
        assert!(matches!(
            sorted_rows(&[], &columns, &sort, &ctx()),
            Err(RosterError::UnknownColumn(_))
        ));
    }

    #[test]
    fn empty_input_yields_empty_rows() {
        let columns = person_columns().unwrap();
        let sort = SortState::by(ID, SortDirection::Descending);
        assert!(sorted_rows(&[], &columns, &sort, &ctx()).unwrap().is_empty());
    }

    #[test]
    fn numeric_ids_sort_numerically() {
        let records: Vec<Person> = [9, 10, 100, 2]
            .into_iter()
            .map(|id| person(id, "A", "B", date(1)))
            .collect();
        let columns = person_columns().unwrap();
        let sort = SortState::by(ID, SortDirection::Ascending);
        let rows = sorted_rows(&records, &columns, &sort, &ctx()).unwrap();
        assert_eq!(ids(&records, &rows), vec![2, 9, 10, 100]);
    }
}
