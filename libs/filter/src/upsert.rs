//! Get-or-create for the name-keyed lookup tables.
//!
//! One statement covers both outcomes: the conflict-tolerant insert returns
//! the new id when it wrote a row, and the union with a lookup by name returns
//! the existing id when it did not. Under read committed a statement whose
//! insert waited on a concurrent writer may see neither row, so callers retry
//! the statement when it comes back empty.

use std::fmt;

use uuid::Uuid;

use crate::schema::Table;
use crate::value::BindValue;
use crate::write::Statement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    City,
    Country,
}

impl LookupTable {
    pub fn table(self) -> Table {
        match self {
            LookupTable::City => Table::City,
            LookupTable::Country => Table::Country,
        }
    }
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().name())
    }
}

/// Build the get-or-create statement for `name` with a candidate `id`.
pub fn lookup_upsert(table: LookupTable, id: Uuid, name: &str) -> Statement {
    let t = table.table().name();
    Statement {
        sql: format!(
            "WITH inserted AS (INSERT INTO {t} (id, name) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING RETURNING id) \
             SELECT inserted.id FROM inserted \
             UNION \
             SELECT {t}.id FROM {t} WHERE {t}.name = $3"
        ),
        binds: vec![
            BindValue::Uuid(id),
            BindValue::Text(name.to_string()),
            BindValue::Text(name.to_string()),
        ],
    }
}

/// Fresh candidate id for an insert attempt.
pub fn new_lookup_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_upsert_unions_insert_and_lookup() {
        let id = Uuid::new_v4();
        let stmt = lookup_upsert(LookupTable::City, id, "Москва");
        assert_eq!(
            stmt.sql,
            "WITH inserted AS (INSERT INTO city (id, name) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING RETURNING id) \
             SELECT inserted.id FROM inserted \
             UNION \
             SELECT city.id FROM city WHERE city.name = $3"
        );
        assert_eq!(
            stmt.binds,
            vec![
                BindValue::Uuid(id),
                BindValue::Text("Москва".into()),
                BindValue::Text("Москва".into()),
            ]
        );
    }

    #[test]
    fn country_upsert_targets_country_table() {
        let stmt = lookup_upsert(LookupTable::Country, new_lookup_id(), "Россия");
        assert!(stmt.sql.contains("INSERT INTO country (id, name)"));
        assert!(stmt.sql.ends_with("WHERE country.name = $3"));
        assert_eq!(LookupTable::Country.to_string(), "country");
    }

    #[test]
    fn names_never_reach_the_sql_text() {
        let stmt = lookup_upsert(LookupTable::City, new_lookup_id(), "x'); DROP TABLE city; --");
        assert!(!stmt.sql.contains("DROP"));
    }
}
