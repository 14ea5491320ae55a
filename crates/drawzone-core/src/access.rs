// Access gate: who may open the dashboard.
//
// The gate is a capability handed to the display layer at startup; nothing
// in the classifier or loader consults it.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("{0} is not on the access list")]
    NotAllowed(String),

    #[error("an access list is configured but credentials.toml has no user email")]
    MissingEmail,
}

/// Allowed accounts: exact email addresses, or whole domains.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Whitelist {
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

impl Whitelist {
    /// An email is allowed when listed verbatim or when the part after its
    /// `@` is a listed domain. No email is never allowed.
    pub fn allows(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };
        if self.allowed_emails.iter().any(|e| e == email) {
            return true;
        }
        match email.split('@').nth(1) {
            Some(domain) => self.allowed_domains.iter().any(|d| d == domain),
            None => false,
        }
    }
}

/// The signed-in user as far as the display layer is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        CurrentUser {
            email: None,
            display_name: None,
        }
    }

    /// Name for the status bar: display name, else email, else "local".
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("local")
    }
}

/// Admit `user` through the gate. Without a whitelist everyone is admitted.
pub fn authorize(whitelist: Option<&Whitelist>, user: CurrentUser) -> Result<CurrentUser, AccessError> {
    let Some(whitelist) = whitelist else {
        return Ok(user);
    };
    match user.email.as_deref() {
        None => Err(AccessError::MissingEmail),
        Some(email) if whitelist.allows(Some(email)) => Ok(user),
        Some(email) => Err(AccessError::NotAllowed(email.to_string())),
    }
}
