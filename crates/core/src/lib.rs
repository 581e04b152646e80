//! Static model of the admissions record: the field catalog, the
//! conditional rule table, repeatable group policies and the record
//! snapshot type.
//!
//! Nothing here evaluates anything; `admit-eval` consumes these tables.

pub mod catalog;
pub mod groups;
pub mod record;
pub mod rules;
pub mod value;

pub use catalog::{FieldDef, FieldType, Format};
pub use groups::{GroupKind, GroupPolicy, GroupTrigger};
pub use record::{default_element, Fields, Record, RecordError};
pub use rules::{check_rule_table, Condition, Consequence, Effect, Rule, RuleTableError};
pub use value::{Attachment, Value};
