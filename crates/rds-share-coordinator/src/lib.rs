//! rds-share-coordinator - daily RDS snapshot share between AWS accounts
//!
//! Takes a manual snapshot of a DB instance in a source account, shares it
//! with a destination account, copies it there, deletes the source snapshot
//! and prunes destination copies older than the retention window.

pub mod aws;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod wait;

#[cfg(test)]
mod testing;
