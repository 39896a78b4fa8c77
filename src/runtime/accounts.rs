use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;

pub const ACCOUNTS_ENV: &str = "CLOUDSIGN_ACCOUNTS";
pub const ACCOUNTS_FILE_ENV: &str = "CLOUDSIGN_ACCOUNTS_FILE";

const MASK_HEAD: usize = 3;
const MASK_TAIL: usize = 4;

/// One cloud storage account. Both fields are secrets: the username only
/// ever appears in masked form, the password never appears at all.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Account {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// A usable account entry carries both a username and a password.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }

    pub fn masked_username(&self) -> String {
        mask(&self.username)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &mask(&self.username))
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Irreversible partial redaction of a secret identifier.
///
/// Long identifiers keep their first three and last four characters with the
/// middle collapsed to `****`; short ones keep only the first character.
pub fn mask(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    if chars.is_empty() {
        return "***".to_owned();
    }
    if chars.len() >= MASK_HEAD + MASK_TAIL + 1 {
        let head: String = chars[..MASK_HEAD].iter().collect();
        let tail: String = chars[chars.len() - MASK_TAIL..].iter().collect();
        return format!("{head}****{tail}");
    }
    let head = chars[0];
    format!("{head}{}", "*".repeat(chars.len() - 1))
}

/// Loads the ordered account list from `CLOUDSIGN_ACCOUNTS` (inline JSON) or
/// `CLOUDSIGN_ACCOUNTS_FILE` (path to the same JSON).
pub fn load_accounts() -> Result<Vec<Account>> {
    if let Ok(raw) = std::env::var(ACCOUNTS_ENV) {
        return parse_accounts(&raw).with_context(|| format!("invalid {ACCOUNTS_ENV}"));
    }

    if let Ok(path) = std::env::var(ACCOUNTS_FILE_ENV) {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read accounts file {path}"))?;
        return parse_accounts(&raw).with_context(|| format!("invalid accounts file {path}"));
    }

    bail!("no accounts configured; set {ACCOUNTS_ENV} or {ACCOUNTS_FILE_ENV}")
}

pub fn parse_accounts(raw: &str) -> Result<Vec<Account>> {
    let accounts: Vec<Account> = serde_json::from_str(raw)
        .context("accounts must be a JSON array of {\"username\", \"password\"} objects")?;
    if accounts.is_empty() {
        bail!("account list is empty");
    }
    Ok(accounts)
}
