use rand::{distr::Alphanumeric, Rng};

/// Length of IDs generated for documents created through `add`, matching Firestore's
/// client-side auto IDs.
pub const AUTO_ID_LEN: usize = 20;

/// Generates a random alphanumeric document ID.
pub fn auto_id() -> String {
    random_token(AUTO_ID_LEN)
}

/// Generates a random alphanumeric token of `len` characters.
pub fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
