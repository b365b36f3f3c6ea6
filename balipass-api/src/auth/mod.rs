mod backend;
mod extractor;
mod router;

pub use backend::AuthBackend;
pub use backend::AuthSession;
pub use extractor::{AuthUser, MaybeUser};
pub use router::router;
