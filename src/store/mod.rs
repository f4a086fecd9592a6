//! Store backends. Each entity has its own repo trait; a backend implements all of them.

pub mod memory;
pub mod postgres;

use crate::availability::repo::AvailabilityRepo;
use crate::interactions::repo::InteractionRepo;
use crate::meetings::repo::MeetingRepo;
use crate::timezones::repo::TimeZoneRepo;
use crate::users::repo::UserRepo;

pub trait Store: UserRepo + TimeZoneRepo + AvailabilityRepo + InteractionRepo + MeetingRepo {}

impl<T> Store for T where T: UserRepo + TimeZoneRepo + AvailabilityRepo + InteractionRepo + MeetingRepo
{}

/// A write collided with a unique column. Travels inside `anyhow::Error` so
/// services can tell it apart from other store failures.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key: {column}")]
pub struct DuplicateKey {
    pub column: &'static str,
}

/// The unique column a failed write collided with, if that is why it failed.
pub fn duplicate_column(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<DuplicateKey>().map(|d| d.column)
}
