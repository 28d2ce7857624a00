//! Random mailbox names and passwords.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated mailbox usernames.
pub const USERNAME_LEN: usize = 10;

/// Length of generated mailbox passwords.
pub const PASSWORD_LEN: usize = 16;

const USERNAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a lowercase alphanumeric username.
pub fn random_username() -> String {
    let mut rng = rand::thread_rng();
    (0..USERNAME_LEN)
        .map(|_| USERNAME_CHARSET[rng.gen_range(0..USERNAME_CHARSET.len())] as char)
        .collect()
}

/// Generate a mixed-case alphanumeric password.
pub fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Join a username and domain into a mailbox address.
pub fn mailbox_address(username: &str, domain: &str) -> String {
    format!("{}@{}", username, domain)
}
