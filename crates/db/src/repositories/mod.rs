//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod generation_repo;
pub mod model_repo;
pub mod profile_repo;
pub mod settings_repo;
pub mod transaction_repo;

pub use generation_repo::GenerationRepo;
pub use model_repo::ModelRepo;
pub use profile_repo::{DeductOutcome, ProfileRepo};
pub use settings_repo::SettingsRepo;
pub use transaction_repo::TransactionRepo;
