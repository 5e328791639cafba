pub mod statement_store;

pub use statement_store::JsonStatementStore;
