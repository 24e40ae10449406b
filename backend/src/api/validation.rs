//! Sign-up and sign-in schemas, checked before any store access.

use crate::api::error::ApiError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 6;

/// Collects rule violations for one request body.
#[derive(Debug, Default)]
struct Violations(Vec<String>);

impl Violations {
    fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.0.push(message.into());
        }
    }

    fn required(&mut self, value: &str, message: &str) -> bool {
        let present = !value.trim().is_empty();
        self.check(present, message);
        present
    }

    fn finish(self) -> Result<(), ApiError> {
        match self.0.first() {
            None => Ok(()),
            Some(first) => Err(ApiError::Validation {
                message: first.clone(),
                errors: self.0,
            }),
        }
    }
}

pub fn sign_in(username: &str, password: &str) -> Result<(), ApiError> {
    let mut violations = Violations::default();
    violations.required(username, "Username is required");
    violations.required(password, "Password is required");
    violations.finish()
}

pub fn sign_up(username: &str, password: &str, email: Option<&str>) -> Result<(), ApiError> {
    let mut violations = Violations::default();

    if violations.required(username, "Username is required") {
        let len = username.trim().chars().count();
        violations.check(
            (USERNAME_MIN..=USERNAME_MAX).contains(&len),
            format!("Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
        );
    }

    if violations.required(password, "Password is required") {
        violations.check(
            password.chars().count() >= PASSWORD_MIN,
            format!("Password must be at least {PASSWORD_MIN} characters"),
        );
    }

    if let Some(email) = email.filter(|email| !email.trim().is_empty()) {
        violations.check(looks_like_email(email.trim()), "Email must be a valid email");
    }

    violations.finish()
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}
