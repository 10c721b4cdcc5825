use rand::Rng;

use crate::error::AppError;
use crate::store::{Store, StoreError};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const CODE_LEN: usize = 6;

/// Draw a candidate public student code, 6 chars over A-Z0-9.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Rejection-sample a code that is free at the time of the check. The unique
/// constraint on the code column catches the remaining race window; callers
/// retry on a code conflict at insert time.
pub async fn allocate_code(store: &dyn Store) -> Result<String, StoreError> {
    loop {
        let code = generate_code();
        if !store.code_taken(&code).await? {
            return Ok(code);
        }
    }
}

/// Email must be unused across students and instructors alike.
pub async fn ensure_email_available(store: &dyn Store, email: &str) -> Result<(), AppError> {
    if store.student_by_email(email).await?.is_some()
        || store.instructor_by_email(email).await?.is_some()
    {
        return Err(AppError::Conflict("Email already registered!".into()));
    }
    Ok(())
}
