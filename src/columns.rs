use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;

use crate::domain::RosterError;
use crate::record::Person;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId(&'static str);

impl ColumnId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub const ID: ColumnId = ColumnId::new("id");
pub const FIRST_NAME: ColumnId = ColumnId::new("firstName");
pub const LAST_NAME: ColumnId = ColumnId::new("lastName");
pub const FULL_NAME: ColumnId = ColumnId::new("fullName");
pub const CITY: ColumnId = ColumnId::new("city");
pub const EMAIL: ColumnId = ColumnId::new("email");
pub const REGISTERED: ColumnId = ColumnId::new("registeredDate");
pub const DAYS_SINCE_REGISTERED: ColumnId = ColumnId::new("dsr");

/// A single extracted cell. Values of one column always share a variant,
/// so the derived ordering is the natural ordering of the column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CellValue {
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Everything a cell may depend on besides its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellContext {
    pub today: NaiveDate,
}

pub type Accessor = fn(&Person, &CellContext) -> CellValue;
pub type Comparator = fn(&Person, &Person, &CellContext) -> Ordering;
pub type Renderer = fn(&CellValue) -> String;

#[derive(Clone, Copy)]
enum Access {
    Field(Accessor),
    Computed(Accessor),
}

#[derive(Clone)]
pub struct ColumnDef {
    pub id: ColumnId,
    pub label: &'static str,
    pub width: usize,
    access: Access,
    compare: Option<Comparator>,
    render: Option<Renderer>,
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("width", &self.width)
            .field("computed", &matches!(self.access, Access::Computed(_)))
            .field("sortable", &self.is_sortable())
            .finish()
    }
}

impl ColumnDef {
    /// A column reading a record field directly. Sortable by natural ordering.
    pub fn field(id: ColumnId, label: &'static str, width: usize, accessor: Accessor) -> Self {
        Self {
            id,
            label,
            width,
            access: Access::Field(accessor),
            compare: None,
            render: None,
        }
    }

    /// A column derived from the whole record. Only sortable with a comparator.
    pub fn computed(id: ColumnId, label: &'static str, width: usize, accessor: Accessor) -> Self {
        Self {
            id,
            label,
            width,
            access: Access::Computed(accessor),
            compare: None,
            render: None,
        }
    }

    pub fn with_compare(mut self, compare: Comparator) -> Self {
        self.compare = Some(compare);
        self
    }

    pub fn with_render(mut self, render: Renderer) -> Self {
        self.render = Some(render);
        self
    }

    pub fn is_sortable(&self) -> bool {
        self.compare.is_some() || matches!(self.access, Access::Field(_))
    }

    pub fn has_custom_compare(&self) -> bool {
        self.compare.is_some()
    }

    pub fn value(&self, person: &Person, ctx: &CellContext) -> CellValue {
        match self.access {
            Access::Field(get) | Access::Computed(get) => get(person, ctx),
        }
    }

    pub fn compare(&self, a: &Person, b: &Person, ctx: &CellContext) -> Ordering {
        match self.compare {
            Some(cmp) => cmp(a, b, ctx),
            None => self.value(a, ctx).cmp(&self.value(b, ctx)),
        }
    }

    pub fn render(&self, person: &Person, ctx: &CellContext) -> String {
        let value = self.value(person, ctx);
        match self.render {
            Some(render) => render(&value),
            None => value.to_string(),
        }
    }
}

/// The immutable definition table, validated once at startup.
#[derive(Debug, Clone)]
pub struct ColumnSet {
    defs: Vec<ColumnDef>,
}

impl ColumnSet {
    pub fn new(defs: Vec<ColumnDef>) -> Result<Self, RosterError> {
        let mut seen = HashSet::new();
        for def in defs.iter() {
            if !seen.insert(def.id) {
                return Err(RosterError::DuplicateColumn(def.id.to_string()));
            }
            if def.width == 0 {
                return Err(RosterError::Config(format!(
                    "column '{}' has zero width",
                    def.id
                )));
            }
        }
        Ok(Self { defs })
    }

    pub fn get(&self, id: ColumnId) -> Option<&ColumnDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    pub fn require(&self, id: ColumnId) -> Result<&ColumnDef, RosterError> {
        self.get(id)
            .ok_or_else(|| RosterError::UnknownColumn(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.defs.iter().map(|d| d.id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

pub fn days_since_registered(person: &Person, ctx: &CellContext) -> i64 {
    (ctx.today - person.registered).num_days().abs()
}

fn render_date(value: &CellValue) -> String {
    match value {
        CellValue::Date(d) => d.format("%m/%d/%Y").to_string(),
        other => other.to_string(),
    }
}

/// The person table as the application shows it.
pub fn person_columns() -> Result<ColumnSet, RosterError> {
    ColumnSet::new(vec![
        ColumnDef::field(ID, "ID", 6, |p, _| CellValue::Int(p.id as i64)),
        ColumnDef::field(FIRST_NAME, "First Name", 12, |p, _| {
            CellValue::Text(p.first_name.clone())
        }),
        ColumnDef::field(LAST_NAME, "Last Name", 14, |p, _| {
            CellValue::Text(p.last_name.clone())
        }),
        ColumnDef::computed(FULL_NAME, "Full Name", 24, |p, _| {
            CellValue::Text(format!("{} {}", p.first_name, p.last_name))
        }),
        ColumnDef::field(CITY, "City", 12, |p, _| CellValue::Text(p.city.clone())),
        ColumnDef::field(EMAIL, "Email", 32, |p, _| CellValue::Text(p.email.clone())),
        ColumnDef::field(REGISTERED, "Registered Date", 15, |p, _| {
            CellValue::Date(p.registered)
        })
        .with_render(render_date),
        ColumnDef::computed(DAYS_SINCE_REGISTERED, "Days Since Registered", 21, |p, ctx| {
            CellValue::Int(days_since_registered(p, ctx))
        })
        .with_compare(|a, b, ctx| {
            days_since_registered(a, ctx).cmp(&days_since_registered(b, ctx))
        }),
    ])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn person(id: u32, first: &str, last: &str, registered: NaiveDate) -> Person {
        Person {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@example.com", first, last).to_lowercase(),
            city: "Graz".to_string(),
            registered,
        }
    }

    pub(crate) fn ctx() -> CellContext {
        CellContext {
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn days_since_registered_uses_reference_date() {
        let p = person(1, "Ada", "Lovelace", NaiveDate::from_ymd_opt(2024, 5, 22).unwrap());
        let columns = person_columns().unwrap();
        let dsr = columns.get(DAYS_SINCE_REGISTERED).unwrap();
        assert_eq!(dsr.value(&p, &ctx()), CellValue::Int(10));

        let later = CellContext {
            today: NaiveDate::from_ymd_opt(2024, 6, 11).unwrap(),
        };
        assert_eq!(dsr.render(&p, &later), "20");
    }

    #[test]
    fn computed_columns_sort_only_with_comparator() {
        let columns = person_columns().unwrap();
        assert!(columns.get(ID).unwrap().is_sortable());
        assert!(!columns.get(FULL_NAME).unwrap().is_sortable());
        assert!(columns.get(DAYS_SINCE_REGISTERED).unwrap().is_sortable());
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let p = person(3, "Grace", "Hopper", ctx().today);
        let columns = person_columns().unwrap();
        assert_eq!(columns.get(FULL_NAME).unwrap().render(&p, &ctx()), "Grace Hopper");
    }

    #[test]
    fn registered_date_has_custom_render() {
        let p = person(3, "Grace", "Hopper", NaiveDate::from_ymd_opt(2023, 12, 9).unwrap());
        let columns = person_columns().unwrap();
        let col = columns.get(REGISTERED).unwrap();
        assert_eq!(col.render(&p, &ctx()), "12/09/2023");
        assert_eq!(col.value(&p, &ctx()).to_string(), "2023-12-09");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = ColumnSet::new(vec![
            ColumnDef::field(ID, "ID", 4, |p, _| CellValue::Int(p.id as i64)),
            ColumnDef::field(ID, "Again", 4, |p, _| CellValue::Int(p.id as i64)),
        ]);
        assert!(matches!(result, Err(RosterError::DuplicateColumn(id)) if id == "id"));
    }

    #[test]
    fn zero_width_is_rejected() {
        let result = ColumnSet::new(vec![ColumnDef::field(ID, "ID", 0, |p, _| {
            CellValue::Int(p.id as i64)
        })]);
        assert!(matches!(result, Err(RosterError::Config(_))));
    }

    #[test]
    fn unknown_column_lookup_fails() {
        let columns = person_columns().unwrap();
        let missing = ColumnId::new("phone");
        assert!(matches!(
            columns.require(missing),
            Err(RosterError::UnknownColumn(id)) if id == "phone"
        ));
    }
}
