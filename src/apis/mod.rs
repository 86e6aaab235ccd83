pub mod edreams;
pub mod ryanair;
pub mod session;

pub use edreams::{EDreamsFactory, EDreamsProvider};
pub use ryanair::{RyanairFactory, RyanairProvider};
pub use session::ProviderSession;
