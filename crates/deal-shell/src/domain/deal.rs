//! Deal and comment records.
//!
//! Purpose: model the leasing requirement ("deal") the shell manages and the
//! comments attached to it. Values are immutable from the shell's point of
//! view: every change produces a new [`Deal`].
//!
//! Serialisation contract (camelCase JSON):
//! `{ "id": int|null, "requirementSize": int, "tenantName": string,
//! "comments": [{ "id": int|null, "text": string }] }`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors raised when constructing deal values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealValidationError {
    /// Requirement sizes must be strictly positive.
    #[error("requirement size must be greater than zero")]
    ZeroRequirementSize,
    /// Tenant names must contain at least one non-whitespace character.
    #[error("tenant name must not be empty")]
    EmptyTenantName,
    /// Comment text must contain at least one non-whitespace character.
    #[error("comment text must not be empty")]
    EmptyCommentText,
}

/// Server-assigned deal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(u64);

impl DealId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned comment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(u64);

impl CommentId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Floor area requested by the tenant. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RequirementSize(u64);

impl RequirementSize {
    /// Validate and construct a requirement size.
    ///
    /// # Examples
    /// ```
    /// use deal_shell::domain::RequirementSize;
    ///
    /// assert!(RequirementSize::new(1000).is_ok());
    /// assert!(RequirementSize::new(0).is_err());
    /// ```
    pub fn new(raw: u64) -> Result<Self, DealValidationError> {
        if raw == 0 {
            return Err(DealValidationError::ZeroRequirementSize);
        }
        Ok(Self(raw))
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for RequirementSize {
    type Error = DealValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequirementSize> for u64 {
    fn from(value: RequirementSize) -> Self {
        value.0
    }
}

/// Name of the tenant behind a deal. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantName(String);

impl TenantName {
    /// Validate and construct a tenant name.
    pub fn new(name: impl Into<String>) -> Result<Self, DealValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DealValidationError::EmptyTenantName);
        }
        Ok(Self(name))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for TenantName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TenantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TenantName {
    type Error = DealValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantName> for String {
    fn from(value: TenantName) -> Self {
        value.0
    }
}

/// Body of a comment. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommentText(String);

impl CommentText {
    /// Validate and construct comment text.
    pub fn new(text: impl Into<String>) -> Result<Self, DealValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DealValidationError::EmptyCommentText);
        }
        Ok(Self(text))
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for CommentText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for CommentText {
    type Error = DealValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommentText> for String {
    fn from(value: CommentText) -> Self {
        value.0
    }
}

/// A note attached to a deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier assigned by the backing store.
    pub id: Option<CommentId>,
    /// Comment body.
    pub text: CommentText,
}

impl Comment {
    /// Build a comment that has not been stored yet.
    pub const fn new(text: CommentText) -> Self {
        Self { id: None, text }
    }

    /// Return a copy carrying the store-assigned identifier.
    #[must_use]
    pub fn with_id(self, id: CommentId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}

/// A leasing requirement tracked by the shell.
///
/// ## Invariants
/// - `id` is `None` until the repository assigns one and never changes
///   afterwards.
/// - `comments` keeps insertion order; entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    /// Identifier assigned by the repository on creation.
    pub id: Option<DealId>,
    /// Requested floor area.
    pub requirement_size: RequirementSize,
    /// Tenant behind the requirement.
    pub tenant_name: TenantName,
    /// Comments in insertion order.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Deal {
    /// Build a deal that has not been submitted yet: no id, no comments.
    ///
    /// # Examples
    /// ```
    /// use deal_shell::domain::{Deal, RequirementSize, TenantName};
    ///
    /// let size = RequirementSize::new(250).expect("positive size");
    /// let tenant = TenantName::new("Acme").expect("named tenant");
    /// let deal = Deal::draft(size, tenant);
    /// assert!(deal.id.is_none());
    /// assert!(deal.comments.is_empty());
    /// ```
    pub const fn draft(requirement_size: RequirementSize, tenant_name: TenantName) -> Self {
        Self {
            id: None,
            requirement_size,
            tenant_name,
            comments: Vec::new(),
        }
    }

    /// Return a copy carrying the repository-assigned identifier.
    #[must_use]
    pub fn with_id(self, id: DealId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Return a new deal equal to this one with `comment` appended.
    #[must_use]
    pub fn with_comment(&self, comment: Comment) -> Self {
        let mut comments = self.comments.clone();
        comments.push(comment);
        Self {
            comments,
            ..self.clone()
        }
    }
}
