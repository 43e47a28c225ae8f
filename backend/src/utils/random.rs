use rand::{Rng, distributions::Alphanumeric};

/// Length of activation, reset and session tokens.
pub const TOKEN_LENGTH: usize = 40;

/// Generates a random alphanumeric string of the specified length.
///
/// The generated string contains uppercase letters (A-Z), lowercase letters
/// (a-z), and digits (0-9), sampled from the thread-local CSPRNG, and is
/// suitable for activation tokens and session identifiers.
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
