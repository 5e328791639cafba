pub mod file_builder;

pub use file_builder::{DepositManifest, FilePackageBuilder, ManifestEntry};
