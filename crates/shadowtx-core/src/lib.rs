mod account;
mod fields;
mod group;
mod record;
mod shadow;

pub use account::AccountRecord;
pub use group::GroupRecord;
pub use record::{Record, TableKind, TableRecord};
pub use shadow::{days_since_epoch, ShadowRecord, DISABLED_PASSWORD};
