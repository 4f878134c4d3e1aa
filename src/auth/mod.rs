mod extractor;
mod password;

pub use extractor::AuthUser;
pub use password::{generate_token, hash_password, hash_token, verify_password, MIN_PASSWORD_LEN};
