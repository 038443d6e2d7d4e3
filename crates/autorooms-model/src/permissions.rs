//! Permission flags, tri-state overwrites, and canonical subject keys.
//!
//! The platform expresses capabilities as bit masks. Instead of passing raw
//! integers around, this module names every flag the controller cares about
//! ([`Permission`]) and combines them in a typed set ([`PermissionSet`]).
//!
//! Channel overwrites are keyed by *subject* (a member or a role). The
//! platform sometimes hands out a fully resolved member and sometimes only a
//! lightweight `(kind, id)` reference for the same subject. Every lookup and
//! insertion goes through [`SubjectKey`], so both forms land on the same
//! map entry.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::{ActorId, ActorRef, ModelError, RoleId};

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// A single named permission flag, with the platform's bit value as its
/// discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum Permission {
    CreateInstantInvite = 1 << 0,
    ManageChannels = 1 << 4,
    PrioritySpeaker = 1 << 8,
    Stream = 1 << 9,
    ViewChannel = 1 << 10,
    Connect = 1 << 20,
    Speak = 1 << 21,
    MuteMembers = 1 << 22,
    DeafenMembers = 1 << 23,
    MoveMembers = 1 << 24,
    UseVoiceActivity = 1 << 25,
    ManageRoles = 1 << 28,
}

impl Permission {
    /// Every known flag, in ascending bit order.
    pub const ALL: [Permission; 12] = [
        Permission::CreateInstantInvite,
        Permission::ManageChannels,
        Permission::PrioritySpeaker,
        Permission::Stream,
        Permission::ViewChannel,
        Permission::Connect,
        Permission::Speak,
        Permission::MuteMembers,
        Permission::DeafenMembers,
        Permission::MoveMembers,
        Permission::UseVoiceActivity,
        Permission::ManageRoles,
    ];

    /// The flag's bit value.
    pub const fn bit(self) -> u64 {
        self as u64
    }

    /// The platform's snake_case name for the flag.
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateInstantInvite => "create_instant_invite",
            Self::ManageChannels => "manage_channels",
            Self::PrioritySpeaker => "priority_speaker",
            Self::Stream => "stream",
            Self::ViewChannel => "view_channel",
            Self::Connect => "connect",
            Self::Speak => "speak",
            Self::MuteMembers => "mute_members",
            Self::DeafenMembers => "deafen_members",
            Self::MoveMembers => "move_members",
            Self::UseVoiceActivity => "use_voice_activity",
            Self::ManageRoles => "manage_roles",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// PermissionSet
// ---------------------------------------------------------------------------

const KNOWN_BITS: u64 = {
    let mut bits = 0;
    let mut i = 0;
    while i < Permission::ALL.len() {
        bits |= Permission::ALL[i].bit();
        i += 1;
    }
    bits
};

/// A set of [`Permission`] flags.
///
/// Serialized as the platform's numeric mask. Deserialization goes through
/// [`PermissionSet::from_bits`], so masks with unknown bits are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PermissionSet(u64);

impl PermissionSet {
    /// No permissions.
    pub const EMPTY: Self = Self(0);

    /// The guild-level capability the controller needs before it reaps or
    /// clones anything: manage channels, connect, and move members.
    ///
    /// Numerically `17825808`, the mask the bot requests in its invite link.
    pub const AUTOROOM_CAPABILITY: Self = Self(
        Permission::ManageChannels.bit() | Permission::Connect.bit() | Permission::MoveMembers.bit(),
    );

    /// The elevated flags granted to the bot and the room owner on every
    /// cloned room: manage channels, manage roles, and connect.
    pub const ROOM_OWNER: Self = Self(
        Permission::ManageChannels.bit() | Permission::ManageRoles.bit() | Permission::Connect.bit(),
    );

    /// Builds a set from a raw mask.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownPermissionBits`] carrying the offending
    /// bits if the mask contains flags this crate does not name.
    pub fn from_bits(bits: u64) -> Result<Self, ModelError> {
        let unknown = bits & !KNOWN_BITS;
        if unknown != 0 {
            return Err(ModelError::UnknownPermissionBits(unknown));
        }
        Ok(Self(bits))
    }

    /// Builds a set from a raw mask, dropping unknown bits.
    pub fn from_bits_truncate(bits: u64) -> Self {
        Self(bits & KNOWN_BITS)
    }

    /// The raw mask.
    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// Returns `true` if every flag in `other` is also in `self`.
    pub fn contains_all(self, other: PermissionSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.bit();
    }

    pub fn remove(&mut self, permission: Permission) {
        self.0 &= !permission.bit();
    }

    /// Flags in `self` that are not in `other`.
    pub fn difference(self, other: PermissionSet) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterates the contained flags in ascending bit order.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl From<Permission> for PermissionSet {
    fn from(permission: Permission) -> Self {
        Self(permission.bit())
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

impl TryFrom<u64> for PermissionSet {
    type Error = ModelError;

    fn try_from(bits: u64) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl From<PermissionSet> for u64 {
    fn from(set: PermissionSet) -> Self {
        set.0
    }
}

impl BitOr for PermissionSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<Permission> for PermissionSet {
    type Output = Self;

    fn bitor(self, rhs: Permission) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOrAssign for PermissionSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        let mut first = true;
        for permission in self.iter() {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(permission.name())?;
            first = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PermissionOverwrite
// ---------------------------------------------------------------------------

/// The tri-state value of one flag inside an overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverwriteValue {
    Allow,
    Deny,
    /// Falls back to the subject's guild-level permissions.
    #[default]
    Inherit,
}

/// A per-subject set of allow/deny/inherit flags on one channel.
///
/// A flag is never in `allow` and `deny` at the same time; every mutator
/// keeps the two sets disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    allow: PermissionSet,
    deny: PermissionSet,
}

impl PermissionOverwrite {
    /// An overwrite where every flag inherits.
    pub fn new() -> Self {
        Self::default()
    }

    /// An overwrite allowing exactly `set`.
    pub fn allowing(set: PermissionSet) -> Self {
        Self {
            allow: set,
            deny: PermissionSet::EMPTY,
        }
    }

    /// Builds an overwrite from the platform's allow/deny pair. Flags
    /// present in both masks resolve to allow.
    pub fn from_pair(allow: PermissionSet, deny: PermissionSet) -> Self {
        Self {
            allow,
            deny: deny.difference(allow),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, permission: Permission, value: OverwriteValue) -> Self {
        self.set(permission, value);
        self
    }

    pub fn allow(&self) -> PermissionSet {
        self.allow
    }

    pub fn deny(&self) -> PermissionSet {
        self.deny
    }

    pub fn get(&self, permission: Permission) -> OverwriteValue {
        if self.allow.contains(permission) {
            OverwriteValue::Allow
        } else if self.deny.contains(permission) {
            OverwriteValue::Deny
        } else {
            OverwriteValue::Inherit
        }
    }

    pub fn set(&mut self, permission: Permission, value: OverwriteValue) {
        self.allow.remove(permission);
        self.deny.remove(permission);
        match value {
            OverwriteValue::Allow => self.allow.insert(permission),
            OverwriteValue::Deny => self.deny.insert(permission),
            OverwriteValue::Inherit => {}
        }
    }

    /// Sets every flag in `set` to allow, leaving all other flags as they
    /// were.
    pub fn grant(&mut self, set: PermissionSet) {
        self.allow |= set;
        self.deny = self.deny.difference(set);
    }

    /// Returns `true` if every flag inherits.
    pub fn is_neutral(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// What kind of subject an overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubjectKind {
    Member,
    Role,
}

/// Canonical identity of an overwrite subject. This is the only key type
/// [`Overwrites`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectKey {
    pub kind: SubjectKind,
    pub id: u64,
}

impl SubjectKey {
    pub fn member(id: ActorId) -> Self {
        Self {
            kind: SubjectKind::Member,
            id: id.0,
        }
    }

    pub fn role(id: RoleId) -> Self {
        Self {
            kind: SubjectKind::Role,
            id: id.0,
        }
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SubjectKind::Member => write!(f, "member:{}", self.id),
            SubjectKind::Role => write!(f, "role:{}", self.id),
        }
    }
}

/// A subject as the platform hands it out: either fully resolved or as a
/// lightweight reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectRef {
    /// A resolved guild member (this includes the bot's own member).
    Member(ActorRef),
    /// A resolved role.
    Role { id: RoleId, name: String },
    /// An unresolved reference carrying only kind and id.
    Reference { kind: SubjectKind, id: u64 },
}

impl SubjectRef {
    /// Normalizes to the canonical key. A resolved subject and a reference
    /// to the same subject always produce equal keys.
    pub fn key(&self) -> SubjectKey {
        match self {
            Self::Member(actor) => SubjectKey::member(actor.id),
            Self::Role { id, .. } => SubjectKey::role(*id),
            Self::Reference { kind, id } => SubjectKey {
                kind: *kind,
                id: *id,
            },
        }
    }
}

impl From<&SubjectRef> for SubjectKey {
    fn from(subject: &SubjectRef) -> Self {
        subject.key()
    }
}

impl From<ActorId> for SubjectKey {
    fn from(id: ActorId) -> Self {
        Self::member(id)
    }
}

impl From<&ActorRef> for SubjectKey {
    fn from(actor: &ActorRef) -> Self {
        Self::member(actor.id)
    }
}

impl From<RoleId> for SubjectKey {
    fn from(id: RoleId) -> Self {
        Self::role(id)
    }
}

// ---------------------------------------------------------------------------
// Overwrites
// ---------------------------------------------------------------------------

/// All permission overwrites on one channel, keyed canonically by subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overwrites(BTreeMap<SubjectKey, PermissionOverwrite>);

impl Overwrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: impl Into<SubjectKey>) -> Option<&PermissionOverwrite> {
        self.0.get(&subject.into())
    }

    /// Inserts or replaces the overwrite for `subject`, returning the
    /// previous one.
    pub fn insert(
        &mut self,
        subject: impl Into<SubjectKey>,
        overwrite: PermissionOverwrite,
    ) -> Option<PermissionOverwrite> {
        self.0.insert(subject.into(), overwrite)
    }

    pub fn remove(&mut self, subject: impl Into<SubjectKey>) -> Option<PermissionOverwrite> {
        self.0.remove(&subject.into())
    }

    pub fn contains(&self, subject: impl Into<SubjectKey>) -> bool {
        self.0.contains_key(&subject.into())
    }

    /// Grants `set` to `subject`.
    ///
    /// An existing entry is merged with [`PermissionOverwrite::grant`], so
    /// its unrelated flags survive. Without an entry, a fresh overwrite
    /// allowing exactly `set` is inserted.
    pub fn elevate(&mut self, subject: impl Into<SubjectKey>, set: PermissionSet) {
        self.0
            .entry(subject.into())
            .and_modify(|existing| existing.grant(set))
            .or_insert_with(|| PermissionOverwrite::allowing(set));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubjectKey, &PermissionOverwrite)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SubjectKey, PermissionOverwrite)> for Overwrites {
    fn from_iter<I: IntoIterator<Item = (SubjectKey, PermissionOverwrite)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
