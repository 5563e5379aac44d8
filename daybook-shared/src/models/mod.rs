/// Domain models
///
/// Each model has a persisted document shape (what the store holds) and a
/// domain type that adds the document id and version.
///
/// # Models
///
/// - `user`: Accounts, pending verification records and the public profile
/// - `journal`: Daily journal entries, search parameters and date helpers

pub mod journal;
pub mod user;
