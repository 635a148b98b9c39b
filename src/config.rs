use crate::object::Identity;

const FALLBACK_NAME: &str = "Git Crate";
const FALLBACK_EMAIL: &str = "git-crate@localhost";

/// Resolves the author identity from `GIT_AUTHOR_NAME`/`GIT_AUTHOR_EMAIL`,
/// falling back to a fixed identity when either is unset. Kept separate
/// from `committer_identity` since real git allows the two to differ.
pub fn author_identity() -> Identity {
    identity_from_env("GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL")
}

pub fn committer_identity() -> Identity {
    identity_from_env("GIT_COMMITTER_NAME", "GIT_COMMITTER_EMAIL")
}

fn identity_from_env(name_var: &str, email_var: &str) -> Identity {
    let name = std::env::var(name_var).unwrap_or_else(|_| FALLBACK_NAME.to_string());
    let email = std::env::var(email_var).unwrap_or_else(|_| FALLBACK_EMAIL.to_string());
    Identity { name, email }
}
