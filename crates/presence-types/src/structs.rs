//! Core records for the presence state core.
//!
//! Every scalar attribute is a real number in the closed range 0.0 to 1.0.
//! Constructors and the `clamped` helpers run values through [`clamp_unit`]
//! so a record built here always satisfies the range invariant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{MemberState, ScopeKind};
use crate::ids::{MemberId, ScopeId, SpaceId};

/// Starting value for every flow and energy attribute of a fresh session.
pub const SESSION_DEFAULT_LEVEL: f64 = 0.5;

/// Clamp a value into the unit range. `NaN` maps to 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whether a value lies in the unit range (and is not `NaN`).
pub fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

// ---------------------------------------------------------------------------
// NaturalFlow
// ---------------------------------------------------------------------------

/// The five-dimensional flow descriptor of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NaturalFlow {
    /// Regularity of movement through time.
    pub rhythm: f64,
    /// Responsiveness to others.
    pub resonance: f64,
    /// Internal consistency.
    pub coherence: f64,
    /// Degree of being here now.
    pub presence: f64,
    /// Agreement between the other four.
    pub harmony: f64,
}

impl NaturalFlow {
    /// A flow with every field set to the same (clamped) value.
    pub fn uniform(value: f64) -> Self {
        let v = clamp_unit(value);
        Self {
            rhythm: v,
            resonance: v,
            coherence: v,
            presence: v,
            harmony: v,
        }
    }

    /// Return a copy with every field clamped to the unit range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            rhythm: clamp_unit(self.rhythm),
            resonance: clamp_unit(self.resonance),
            coherence: clamp_unit(self.coherence),
            presence: clamp_unit(self.presence),
            harmony: clamp_unit(self.harmony),
        }
    }

    /// Merge a partial update over this flow. Absent fields keep their value.
    #[must_use]
    pub fn merge(self, patch: &NaturalFlowPatch) -> Self {
        Self {
            rhythm: patch.rhythm.map_or(self.rhythm, clamp_unit),
            resonance: patch.resonance.map_or(self.resonance, clamp_unit),
            coherence: patch.coherence.map_or(self.coherence, clamp_unit),
            presence: patch.presence.map_or(self.presence, clamp_unit),
            harmony: patch.harmony.map_or(self.harmony, clamp_unit),
        }
    }

    /// Arithmetic mean of the five fields.
    pub fn mean(&self) -> f64 {
        (self.rhythm + self.resonance + self.coherence + self.presence + self.harmony) / 5.0
    }

    /// Whether every field lies in the unit range.
    pub fn is_within_bounds(&self) -> bool {
        [
            self.rhythm,
            self.resonance,
            self.coherence,
            self.presence,
            self.harmony,
        ]
        .into_iter()
        .all(is_unit)
    }
}

impl Default for NaturalFlow {
    fn default() -> Self {
        Self::uniform(SESSION_DEFAULT_LEVEL)
    }
}

/// A partial update to a [`NaturalFlow`]. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NaturalFlowPatch {
    /// New rhythm, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhythm: Option<f64>,
    /// New resonance, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resonance: Option<f64>,
    /// New coherence, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence: Option<f64>,
    /// New presence, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<f64>,
    /// New harmony, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmony: Option<f64>,
}

impl NaturalFlowPatch {
    /// Whether the patch changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.rhythm.is_none()
            && self.resonance.is_none()
            && self.coherence.is_none()
            && self.presence.is_none()
            && self.harmony.is_none()
    }
}

// ---------------------------------------------------------------------------
// EnergyState
// ---------------------------------------------------------------------------

/// Energy descriptor of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EnergyState {
    /// Amount of energy available.
    pub level: f64,
    /// How refined the energy is.
    pub quality: f64,
    /// Resistance to fluctuation.
    pub stability: f64,
    /// Shielding from outside disturbance.
    pub protection: f64,
}

impl EnergyState {
    /// Build an energy state, clamping every field.
    pub fn new(level: f64, quality: f64, stability: f64, protection: f64) -> Self {
        Self {
            level: clamp_unit(level),
            quality: clamp_unit(quality),
            stability: clamp_unit(stability),
            protection: clamp_unit(protection),
        }
    }

    /// Return a copy with every field clamped to the unit range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.level, self.quality, self.stability, self.protection)
    }

    /// Whether every field lies in the unit range.
    pub fn is_within_bounds(&self) -> bool {
        [self.level, self.quality, self.stability, self.protection]
            .into_iter()
            .all(is_unit)
    }
}

impl Default for EnergyState {
    fn default() -> Self {
        Self::new(
            SESSION_DEFAULT_LEVEL,
            SESSION_DEFAULT_LEVEL,
            SESSION_DEFAULT_LEVEL,
            SESSION_DEFAULT_LEVEL,
        )
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// A directed edge between two scopes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Connection {
    /// Source scope.
    pub from: ScopeId,
    /// Target scope.
    pub to: ScopeId,
}

impl Connection {
    /// Create a connection from `from` to `to`.
    pub fn new(from: impl Into<ScopeId>, to: impl Into<ScopeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Whether this edge has exactly the given endpoints.
    pub fn matches(&self, from: &ScopeId, to: &ScopeId) -> bool {
        self.from == *from && self.to == *to
    }
}

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

/// Focus of a member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Focus {
    /// How concentrated the member is.
    pub level: f64,
    /// How good that concentration is.
    pub quality: f64,
}

impl Focus {
    /// Build a focus record, clamping both fields.
    pub fn new(level: f64, quality: f64) -> Self {
        Self {
            level: clamp_unit(level),
            quality: clamp_unit(quality),
        }
    }
}

impl Default for Focus {
    fn default() -> Self {
        Self::new(SESSION_DEFAULT_LEVEL, SESSION_DEFAULT_LEVEL)
    }
}

/// A participant present in a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Member {
    /// Stable member identifier.
    pub id: MemberId,
    /// Qualitative state; drives the progression effect.
    #[ts(as = "String")]
    pub state: MemberState,
    /// Focus level and quality.
    pub focus: Focus,
    /// Energy available to the member.
    pub energy: f64,
    /// Attention the member is paying.
    pub attention: f64,
    /// Accumulated immersion.
    pub depth: f64,
}

impl Member {
    /// Create a member in the given state with session defaults.
    pub fn new(id: impl Into<MemberId>, state: MemberState) -> Self {
        Self {
            id: id.into(),
            state,
            focus: Focus::default(),
            energy: SESSION_DEFAULT_LEVEL,
            attention: SESSION_DEFAULT_LEVEL,
            depth: 0.0,
        }
    }

    /// Return a copy with every scalar clamped to the unit range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.focus = Focus::new(self.focus.level, self.focus.quality);
        self.energy = clamp_unit(self.energy);
        self.attention = clamp_unit(self.attention);
        self.depth = clamp_unit(self.depth);
        self
    }

    /// Whether every scalar lies in the unit range.
    pub fn is_within_bounds(&self) -> bool {
        [
            self.focus.level,
            self.focus.quality,
            self.energy,
            self.attention,
            self.depth,
        ]
        .into_iter()
        .all(is_unit)
    }
}

// ---------------------------------------------------------------------------
// FlowSpace
// ---------------------------------------------------------------------------

/// A named sub-scope of the root state that members can be present in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FlowSpace {
    /// Unique space identifier.
    pub id: SpaceId,
    /// Human-readable name.
    pub name: String,
    /// Whether the space hosts one individual or a group.
    #[ts(as = "String")]
    pub kind: ScopeKind,
    /// The space's own flow.
    pub flow: NaturalFlow,
    /// The space's own energy.
    pub energy: EnergyState,
    /// Members currently present, in arrival order.
    pub members: Vec<Member>,
}

impl FlowSpace {
    /// Create an empty group space with default flow and energy.
    pub fn new(id: impl Into<SpaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ScopeKind::Group,
            flow: NaturalFlow::default(),
            energy: EnergyState::default(),
            members: Vec::new(),
        }
    }

    /// Builder-style helper that sets the present members.
    #[must_use]
    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Look up a present member by id.
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == *id)
    }

    /// Whether every scalar of the space and its members lies in the unit range.
    pub fn is_within_bounds(&self) -> bool {
        self.flow.is_within_bounds()
            && self.energy.is_within_bounds()
            && self.members.iter().all(Member::is_within_bounds)
    }
}

// ---------------------------------------------------------------------------
// ConsciousnessState
// ---------------------------------------------------------------------------

/// The root snapshot of the whole observable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConsciousnessState {
    /// Identifier of the root scope.
    pub id: ScopeId,
    /// Individual or group.
    #[ts(as = "String")]
    pub kind: ScopeKind,
    /// Root flow.
    pub flow: NaturalFlow,
    /// Accumulated immersion; never decreases within a session.
    pub depth: f64,
    /// Directed edges in creation order.
    pub connections: Vec<Connection>,
    /// Root energy.
    pub energy: EnergyState,
    /// Sub-scopes keyed by id.
    pub spaces: BTreeMap<SpaceId, FlowSpace>,
}

impl ConsciousnessState {
    /// The state a session starts from.
    pub fn new_root() -> Self {
        Self {
            id: ScopeId::root(),
            kind: ScopeKind::Individual,
            flow: NaturalFlow::default(),
            depth: 0.0,
            connections: Vec::new(),
            energy: EnergyState::default(),
            spaces: BTreeMap::new(),
        }
    }

    /// Look up a space by id.
    pub fn space(&self, id: &SpaceId) -> Option<&FlowSpace> {
        self.spaces.get(id)
    }

    /// Whether an edge with exactly these endpoints exists.
    pub fn has_connection(&self, from: &ScopeId, to: &ScopeId) -> bool {
        self.connections.iter().any(|c| c.matches(from, to))
    }

    /// Total number of members across all spaces.
    pub fn member_count(&self) -> usize {
        self.spaces.values().map(|s| s.members.len()).sum()
    }

    /// Whether every bounded scalar in the snapshot lies in the unit range.
    pub fn is_within_bounds(&self) -> bool {
        is_unit(self.depth)
            && self.flow.is_within_bounds()
            && self.energy.is_within_bounds()
            && self.spaces.values().all(FlowSpace::is_within_bounds)
    }
}

impl Default for ConsciousnessState {
    fn default() -> Self {
        Self::new_root()
    }
}
