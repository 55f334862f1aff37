//! Statements for the account write path.

use uuid::Uuid;

use crate::account::{Like, ValidatedAccount, ValidatedUpdate};
use crate::value::BindValue;

/// SQL text with `$n` placeholders and the binds for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

const ACCOUNT_COLUMNS: [&str; 13] = [
    "id",
    "status",
    "email",
    "sex",
    "birth",
    "name",
    "surname",
    "phone",
    "country_id",
    "city_id",
    "joined",
    "prem_start",
    "prem_end",
];

pub fn compile_account_insert(
    account: &ValidatedAccount,
    city_id: Option<Uuid>,
    country_id: Option<Uuid>,
) -> Statement {
    let binds = vec![
        BindValue::Integer(i64::from(account.id)),
        BindValue::Text(account.status.clone()),
        BindValue::Text(account.email.clone()),
        BindValue::Text(account.sex.clone()),
        BindValue::Timestamp(account.birth),
        BindValue::opt_text(account.fname.as_deref()),
        BindValue::opt_text(account.sname.as_deref()),
        BindValue::opt_text(account.phone.as_deref()),
        BindValue::opt_uuid(country_id),
        BindValue::opt_uuid(city_id),
        BindValue::Timestamp(account.joined),
        BindValue::opt_timestamp(account.premium.map(|p| p.start)),
        BindValue::opt_timestamp(account.premium.map(|p| p.finish)),
    ];
    let placeholders: Vec<String> = (1..=ACCOUNT_COLUMNS.len()).map(|i| format!("${i}")).collect();
    Statement {
        sql: format!(
            "INSERT INTO account ({}) VALUES ({}) RETURNING id",
            ACCOUNT_COLUMNS.join(", "),
            placeholders.join(", ")
        ),
        binds,
    }
}

/// `UPDATE` over the present fields only; `None` when nothing would change.
///
/// City and country are updated only when the corresponding lookup id is given.
pub fn compile_account_update(
    update: &ValidatedUpdate,
    city_id: Option<Uuid>,
    country_id: Option<Uuid>,
) -> Option<Statement> {
    let mut assignments: Vec<(&str, BindValue)> = Vec::new();
    let mut set = |column, value: Option<BindValue>| {
        if let Some(value) = value {
            assignments.push((column, value));
        }
    };
    set("status", update.status.clone().map(BindValue::Text));
    set("email", update.email.clone().map(BindValue::Text));
    set("sex", update.sex.clone().map(BindValue::Text));
    set("birth", update.birth.map(BindValue::Timestamp));
    set("name", update.fname.clone().map(BindValue::Text));
    set("surname", update.sname.clone().map(BindValue::Text));
    set("phone", update.phone.clone().map(BindValue::Text));
    set("country_id", country_id.map(BindValue::Uuid));
    set("city_id", city_id.map(BindValue::Uuid));
    set("joined", update.joined.map(BindValue::Timestamp));
    set("prem_start", update.premium.map(|p| BindValue::Timestamp(p.start)));
    set("prem_end", update.premium.map(|p| BindValue::Timestamp(p.finish)));

    if assignments.is_empty() {
        return None;
    }

    let mut sql = String::from("UPDATE account SET ");
    let mut binds = Vec::with_capacity(assignments.len() + 1);
    for (i, (column, value)) in assignments.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&format!("{column} = ${}", i + 1));
        binds.push(value);
    }
    binds.push(BindValue::Integer(i64::from(update.id)));
    sql.push_str(&format!(" WHERE account.id = ${}", binds.len()));
    Some(Statement { sql, binds })
}

pub fn compile_account_exists(id: i32) -> Statement {
    Statement {
        sql: "SELECT account.id FROM account WHERE account.id = $1".to_string(),
        binds: vec![BindValue::Integer(i64::from(id))],
    }
}

/// Bulk likes insert; `None` for an empty batch.
pub fn compile_likes_insert(likes: &[Like]) -> Option<Statement> {
    if likes.is_empty() {
        return None;
    }
    Some(Statement {
        sql: "INSERT INTO likes (liker_id, likee_id, ts) \
              SELECT * FROM UNNEST($1::int4[], $2::int4[], $3::timestamptz[])"
            .to_string(),
        binds: vec![
            BindValue::IntegerArray(likes.iter().map(|l| i64::from(l.liker)).collect()),
            BindValue::IntegerArray(likes.iter().map(|l| i64::from(l.likee)).collect()),
            BindValue::TimestampArray(likes.iter().map(|l| l.ts).collect()),
        ],
    })
}

/// Bulk interests insert for one account; `None` when there are none.
pub fn compile_interests_insert(account_id: i32, interests: &[String]) -> Option<Statement> {
    if interests.is_empty() {
        return None;
    }
    Some(Statement {
        sql: "INSERT INTO interest (account_id, name) \
              SELECT * FROM UNNEST($1::int4[], $2::text[])"
            .to_string(),
        binds: vec![
            BindValue::IntegerArray(vec![i64::from(account_id); interests.len()]),
            BindValue::TextArray(interests.to_vec()),
        ],
    })
}
