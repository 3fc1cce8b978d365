//! Contact identifier resolution for conversation addresses.
//!
//! Remote uids arrive in whatever format the caller uses: dialer strings
//! with punctuation, bare digit runs, or email-shaped IM account uids.
//! The registry hands out stable numeric contact ids so that differently
//! formatted forms of the same address resolve to the same contact.

use std::collections::HashMap;

/// Minimum number of digits for a valid phone number.
const MIN_PHONE_DIGITS: usize = 3;

/// Maximum number of digits for a valid phone number.
const MAX_PHONE_DIGITS: usize = 15;

/// Number of trailing digits used for suffix matching.
/// This handles country code variations across different regions.
const SUFFIX_MATCH_DIGITS: usize = 10;

/// Strip formatting characters from an address.
///
/// Removes spaces, dashes, parentheses, and plus signs. Leading zeros are
/// preserved as they may be significant in some regions. Non-phone
/// addresses (IM uids) pass through with only the listed characters
/// removed, which leaves them intact in practice.
pub fn canonicalize_address(address: &str) -> String {
    address
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '+'))
        .collect()
}

/// Validate that an address can identify a remote conversation party.
///
/// Returns true for:
/// - Phone numbers: 3-15 digits after removing formatting characters
/// - Email-shaped IM uids: a basic pattern with one @ symbol
pub fn is_address_valid(address: &str) -> bool {
    let canonicalized = canonicalize_address(address);

    if canonicalized.len() >= MIN_PHONE_DIGITS
        && canonicalized.len() <= MAX_PHONE_DIGITS
        && canonicalized.chars().all(|c| c.is_ascii_digit())
    {
        return true;
    }

    if address.contains('@') {
        let parts: Vec<&str> = address.split('@').collect();
        if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            return true;
        }
    }

    false
}

/// Extract the digit run of a phone-number-like address.
fn phone_digits(address: &str) -> String {
    address.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// The last [`SUFFIX_MATCH_DIGITS`] digits, or all of them if shorter.
/// A number stored with a country code still matches its bare local form.
fn phone_suffix(digits: &str) -> &str {
    if digits.len() > SUFFIX_MATCH_DIGITS {
        &digits[digits.len() - SUFFIX_MATCH_DIGITS..]
    } else {
        digits
    }
}

/// Whether an address is phone-shaped rather than an IM uid.
fn is_phone_address(address: &str) -> bool {
    let canonicalized = canonicalize_address(address);
    !canonicalized.is_empty() && canonicalized.chars().all(|c| c.is_ascii_digit())
}

/// Assigns stable numeric contact ids to remote addresses.
///
/// Phone numbers are keyed on their digit run with a trailing-digits
/// fallback, so `+1-555-123-4567` and `(555) 123-4567` share one id.
/// Other uids are keyed verbatim.
#[derive(Debug, Default)]
pub struct ContactRegistry {
    /// Full digit run to contact id, for exact matching.
    digits_to_id: HashMap<String, u32>,
    /// Trailing digits to contact id, for country-code variations.
    suffix_to_id: HashMap<String, u32>,
    /// Non-phone uids to contact id.
    uid_to_id: HashMap<String, u32>,
    last_id: u32,
}

impl ContactRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contact id for `address`, assigning the next free id on first use.
    pub fn resolve_or_assign(&mut self, address: &str) -> u32 {
        if is_phone_address(address) {
            self.resolve_phone(address)
        } else {
            self.resolve_uid(address)
        }
    }

    /// Number of known contacts.
    pub fn len(&self) -> usize {
        self.last_id as usize
    }

    /// True when no contact has been assigned yet.
    pub fn is_empty(&self) -> bool {
        self.last_id == 0
    }

    fn resolve_phone(&mut self, address: &str) -> u32 {
        let digits = phone_digits(address);
        if let Some(id) = self.digits_to_id.get(&digits) {
            return *id;
        }

        let suffix = phone_suffix(&digits).to_owned();
        if let Some(id) = self.suffix_to_id.get(&suffix).copied() {
            // New formatting of a known number; remember the exact form.
            self.digits_to_id.insert(digits, id);
            return id;
        }

        let id = self.allocate();
        self.digits_to_id.insert(digits, id);
        self.suffix_to_id.insert(suffix, id);
        id
    }

    fn resolve_uid(&mut self, address: &str) -> u32 {
        if let Some(id) = self.uid_to_id.get(address) {
            return *id;
        }
        let id = self.allocate();
        self.uid_to_id.insert(address.to_owned(), id);
        id
    }

    fn allocate(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }
}
