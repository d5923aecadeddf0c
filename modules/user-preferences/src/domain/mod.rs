pub mod error;
pub mod model;
pub mod repo;
pub mod service;


pub use error::DomainError;
pub use repo::PreferencesRepository;
pub use service::Service;
