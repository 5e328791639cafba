//! SWORD protocol layer
//!
//! This module speaks the deposit protocol itself: the authenticated
//! deposit exchange and the interpretation of Atom deposit receipts.

pub mod client;
pub mod receipt;

pub use client::SwordClient;
pub use receipt::{
    PACKAGING_METS, REL_ADD, REL_STATEMENT, extract_statement_href, parse_deposit_receipt,
};
