//! Enumeration types for the presence state core.
//!
//! Both enumerations arrive as free-form string tags from the outside world.
//! They are modelled as closed sets with one escape variant that preserves
//! the unrecognized tag, so nothing is silently dropped and callers can
//! decide how to treat an unknown value.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scope kind
// ---------------------------------------------------------------------------

/// Whether a scope models one individual or a shared group.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScopeKind {
    /// A single individual.
    #[default]
    Individual,
    /// A group space shared by several members.
    Group,
    /// A tag this version does not know about, kept verbatim.
    Other(String),
}

impl ScopeKind {
    /// The wire tag for this kind.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::Individual => "individual",
            Self::Group => "group",
            Self::Other(tag) => tag,
        }
    }

    /// Whether this kind is one of the known variants.
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for ScopeKind {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "individual" => Self::Individual,
            "group" => Self::Group,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for ScopeKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_owned())
    }
}

impl From<ScopeKind> for String {
    fn from(kind: ScopeKind) -> Self {
        match kind {
            ScopeKind::Other(tag) => tag,
            known => known.as_tag().to_owned(),
        }
    }
}

impl core::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_tag())
    }
}

// ---------------------------------------------------------------------------
// Member state
// ---------------------------------------------------------------------------

/// The qualitative state a member is in.
///
/// The four known states each map to a fixed progression effect. An
/// [`Unrecognized`](Self::Unrecognized) tag has no effect and makes
/// progression fail rather than default.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberState {
    /// Clear and receptive.
    Clear,
    /// Engaged in activity.
    Active,
    /// Evenly balanced.
    #[default]
    Balanced,
    /// At rest.
    Calm,
    /// A tag outside the known set, kept verbatim.
    Unrecognized(String),
}

impl MemberState {
    /// All known states, in table order.
    pub const KNOWN: [Self; 4] = [Self::Clear, Self::Active, Self::Balanced, Self::Calm];

    /// The wire tag for this state.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::Clear => "clear",
            Self::Active => "active",
            Self::Balanced => "balanced",
            Self::Calm => "calm",
            Self::Unrecognized(tag) => tag,
        }
    }

    /// Whether this state has an entry in the effect table.
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for MemberState {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "active" => Self::Active,
            "balanced" => Self::Balanced,
            "calm" => Self::Calm,
            _ => Self::Unrecognized(tag),
        }
    }
}

impl From<&str> for MemberState {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_owned())
    }
}

impl From<MemberState> for String {
    fn from(state: MemberState) -> Self {
        match state {
            MemberState::Unrecognized(tag) => tag,
            known => known.as_tag().to_owned(),
        }
    }
}

impl core::fmt::Display for MemberState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_tag())
    }
}
