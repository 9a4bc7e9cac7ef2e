//! Data models shared by every analysis stage.
//!
//! - [`Message`] - one parsed transcript line (plus continuation lines)
//! - [`ParticipantIdentity`] - a canonical person known to the registry
//! - [`WishSignal`] - per-message birthday evidence
//! - [`BirthdayCluster`] - a burst of wishes around one celebration
//! - [`BirthdayEntity`] - the externally visible, possibly multi-year result
//!
//! Identities are referenced by [`IdentityId`] handles everywhere outside the
//! registry, so signals and entities never own a person record.

pub mod cluster;
pub mod entity;
pub mod evidence;
pub mod identity;
pub mod message;
pub mod signal;
pub mod warning;

pub use cluster::{BirthdayCluster, SignalSummary};
pub use entity::{BirthdayEntity, MonthDay, Occurrence, TargetRef};
pub use evidence::{
    ConfidenceBreakdown, Contribution, EvidenceClass, EvidenceItem, Strategy, StrategyOutcome,
    StrategyReport,
};
pub use identity::{IdentityId, IdentityKey, ParticipantIdentity};
pub use message::{Message, MessageKind};
pub use signal::{TimingModifier, WishSignal};
pub use warning::AnalysisWarning;
