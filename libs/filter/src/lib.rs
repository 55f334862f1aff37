//! Account filter compiler.
//!
//! Turns untrusted `field` / `field_operator` request parameters into a
//! parameterized Postgres statement, and builds the statements used by the
//! account write path.
//!
//! ```
//! use accounts_filter::{compile, FieldSchema};
//!
//! let items = vec![
//!     ("sex_eq".to_string(), "m".to_string()),
//!     ("limit".to_string(), "10".to_string()),
//!     ("query_id".to_string(), "1".to_string()),
//! ];
//! let query = compile(FieldSchema::accounts(), &items).unwrap();
//! assert!(query.sql.contains("account.sex = $1"));
//! ```

#![forbid(unsafe_code)]

pub mod account;
pub mod assembler;
pub mod constraints;
pub mod error;
mod escape;
pub mod params;
pub mod predicate;
pub mod schema;
pub mod upsert;
pub mod value;
pub mod write;

pub use account::{
    AccountInput, AccountUpdate, Like, LikesInput, Premium, ValidatedAccount, ValidatedUpdate,
};
pub use assembler::{compile, compile_at, CompiledQuery, ProjectedColumn, QueryAssembler};
pub use error::{Error, Result};
pub use params::{FilterSet, ParameterParser, QueryParam};
pub use predicate::{CompiledPredicate, PredicateCompiler};
pub use schema::{Field, FieldDescriptor, FieldSchema, JoinSpec, Operator, Table, ValueType};
pub use upsert::{lookup_upsert, LookupTable};
pub use value::{BindValue, SqlType, Value};
pub use write::{
    compile_account_exists, compile_account_insert, compile_account_update,
    compile_interests_insert, compile_likes_insert, Statement,
};
