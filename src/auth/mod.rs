pub mod claims;
pub mod identity;
pub mod jwt;
pub mod utils;

pub use claims::Claims;
pub use identity::Identity;
pub use jwt::JwtService;
pub use utils::{
    extract_caller_from_context, hash_token, require_admin, require_authenticated, require_owner_or_admin,
};
