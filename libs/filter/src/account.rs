//! Write-path input models and their validation.
//!
//! Request bodies deserialize into the `*Input` types with every member
//! optional; [`AccountInput::validate`] and friends enforce presence and the
//! same domain rules the filter parser applies to query values.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::constraints::{Constraint, PREMIUM_WINDOW};
use crate::error::{Error, Result};
use crate::schema::{Field, FieldSchema, Operator};
use crate::value::{timestamp_from_epoch, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PremiumInput {
    pub start: Option<i64>,
    pub finish: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountLikeInput {
    pub id: Option<i64>,
    pub ts: Option<i64>,
}

/// Body of `POST /accounts/new/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInput {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub sex: Option<String>,
    pub birth: Option<i64>,
    pub joined: Option<i64>,
    pub status: Option<String>,
    pub fname: Option<String>,
    pub sname: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub interests: Option<Vec<String>>,
    pub premium: Option<PremiumInput>,
    pub likes: Option<Vec<AccountLikeInput>>,
}

/// Body of `POST /accounts/{id}/`; the id comes from the path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub sex: Option<String>,
    pub birth: Option<i64>,
    pub joined: Option<i64>,
    pub status: Option<String>,
    pub fname: Option<String>,
    pub sname: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub premium: Option<PremiumInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeInput {
    pub liker: Option<i64>,
    pub likee: Option<i64>,
    pub ts: Option<i64>,
}

/// Body of `POST /accounts/likes/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikesInput {
    #[serde(default)]
    pub likes: Vec<LikeInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Premium {
    pub start: DateTime<Utc>,
    pub finish: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Like {
    pub liker: i32,
    pub likee: i32,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAccount {
    pub id: i32,
    pub email: String,
    pub sex: String,
    pub status: String,
    pub birth: DateTime<Utc>,
    pub joined: DateTime<Utc>,
    pub fname: Option<String>,
    pub sname: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub interests: Vec<String>,
    pub premium: Option<Premium>,
    pub likes: Vec<Like>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedUpdate {
    pub id: i32,
    pub email: Option<String>,
    pub sex: Option<String>,
    pub status: Option<String>,
    pub birth: Option<DateTime<Utc>>,
    pub joined: Option<DateTime<Utc>>,
    pub fname: Option<String>,
    pub sname: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub premium: Option<Premium>,
}

impl ValidatedUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.sex.is_none()
            && self.status.is_none()
            && self.birth.is_none()
            && self.joined.is_none()
            && self.fname.is_none()
            && self.sname.is_none()
            && self.phone.is_none()
            && self.country.is_none()
            && self.city.is_none()
            && self.premium.is_none()
    }
}

impl AccountInput {
    pub fn validate(self) -> Result<ValidatedAccount> {
        let v = Validator::new();
        let id = v.account_id("id", required(self.id, "id")?)?;
        let likes = self
            .likes
            .unwrap_or_default()
            .into_iter()
            .map(|like| {
                Ok(Like {
                    liker: id,
                    likee: v.account_id("likes", required(like.id, "likes.id")?)?,
                    ts: v.instant("likes", required(like.ts, "likes.ts")?)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let interests = self
            .interests
            .unwrap_or_default()
            .into_iter()
            .map(|interest| v.text(Field::Interests, interest))
            .collect::<Result<Vec<_>>>()?;

        Ok(ValidatedAccount {
            id,
            email: v.text(Field::Email, required(self.email, "email")?)?,
            sex: v.text(Field::Sex, required(self.sex, "sex")?)?,
            status: v.text(Field::Status, required(self.status, "status")?)?,
            birth: v.timestamp(Field::Birth, required(self.birth, "birth")?)?,
            joined: v.timestamp(Field::Joined, required(self.joined, "joined")?)?,
            fname: v.opt_text(Field::Fname, self.fname)?,
            sname: v.opt_text(Field::Sname, self.sname)?,
            phone: v.opt_text(Field::Phone, self.phone)?,
            country: v.opt_text(Field::Country, self.country)?,
            city: v.opt_text(Field::City, self.city)?,
            interests,
            premium: self.premium.map(|p| v.premium(p)).transpose()?,
            likes,
        })
    }
}

impl AccountUpdate {
    pub fn validate(self, id: i64) -> Result<ValidatedUpdate> {
        let v = Validator::new();
        Ok(ValidatedUpdate {
            id: v.account_id("id", id)?,
            email: v.opt_text(Field::Email, self.email)?,
            sex: v.opt_text(Field::Sex, self.sex)?,
            status: v.opt_text(Field::Status, self.status)?,
            birth: self
                .birth
                .map(|b| v.timestamp(Field::Birth, b))
                .transpose()?,
            joined: self
                .joined
                .map(|j| v.timestamp(Field::Joined, j))
                .transpose()?,
            fname: v.opt_text(Field::Fname, self.fname)?,
            sname: v.opt_text(Field::Sname, self.sname)?,
            phone: v.opt_text(Field::Phone, self.phone)?,
            country: v.opt_text(Field::Country, self.country)?,
            city: v.opt_text(Field::City, self.city)?,
            premium: self.premium.map(|p| v.premium(p)).transpose()?,
        })
    }
}

impl LikesInput {
    pub fn validate(self) -> Result<Vec<Like>> {
        let v = Validator::new();
        self.likes
            .into_iter()
            .map(|like| {
                Ok(Like {
                    liker: v.account_id("liker", required(like.liker, "liker")?)?,
                    likee: v.account_id("likee", required(like.likee, "likee")?)?,
                    ts: v.instant("ts", required(like.ts, "ts")?)?,
                })
            })
            .collect()
    }
}

fn required<T>(value: Option<T>, name: &'static str) -> Result<T> {
    value.ok_or(Error::MissingField(name))
}

/// Applies the field constraints registered in the account schema.
struct Validator {
    schema: &'static FieldSchema,
}

impl Validator {
    fn new() -> Self {
        Self {
            schema: FieldSchema::accounts(),
        }
    }

    fn constraint(&self, field: Field) -> Result<Constraint> {
        Ok(self.schema.require(field)?.constraint)
    }

    fn text(&self, field: Field, value: String) -> Result<String> {
        if value.is_empty() {
            return Err(Error::EmptyValue(field.name().to_string()));
        }
        self.constraint(field)?
            .check(field.name(), Operator::Equal, &Value::String(value.clone()))?;
        Ok(value)
    }

    fn opt_text(&self, field: Field, value: Option<String>) -> Result<Option<String>> {
        value.map(|v| self.text(field, v)).transpose()
    }

    fn timestamp(&self, field: Field, secs: i64) -> Result<DateTime<Utc>> {
        let ts = self.instant(field.name(), secs)?;
        self.constraint(field)?
            .check(field.name(), Operator::Equal, &Value::Timestamp(ts))?;
        Ok(ts)
    }

    fn instant(&self, name: &str, secs: i64) -> Result<DateTime<Utc>> {
        timestamp_from_epoch(secs).ok_or_else(|| Error::invalid(name, &secs.to_string()))
    }

    fn account_id(&self, name: &str, id: i64) -> Result<i32> {
        Constraint::Identifier.check(name, Operator::Equal, &Value::Integer(id))?;
        i32::try_from(id).map_err(|_| Error::out_of_range(name, format!("id {id} is not valid")))
    }

    fn premium(&self, input: PremiumInput) -> Result<Premium> {
        let window = Constraint::Window(PREMIUM_WINDOW);
        let bound = |secs: Option<i64>, name: &'static str| -> Result<DateTime<Utc>> {
            let ts = self.instant(name, required(secs, name)?)?;
            window.check(name, Operator::Equal, &Value::Timestamp(ts))?;
            Ok(ts)
        };
        let start = bound(input.start, "premium.start")?;
        let finish = bound(input.finish, "premium.finish")?;
        if start > finish {
            return Err(Error::out_of_range("premium", "start is after finish"));
        }
        Ok(Premium { start, finish })
    }
}
