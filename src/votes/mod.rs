//! Vote casting for topics and replies

pub mod ledger;

pub use ledger::VoteLedger;
