//! Participant identity resolution.
//!
//! Every stage after parsing refers to people through [`IdentityId`] handles
//! issued by the [`ParticipantRegistry`]. Phone-keyed identities are always
//! canonical over name-only ones; merges only ever fold a name-only identity
//! into a phone-keyed one, never the reverse, and never two phone-keyed
//! identities into each other.
//!
//! [`IdentityId`]: crate::models::IdentityId

pub mod matching;
pub mod normalize;
pub mod registry;

pub use matching::{name_matches, token_overlap};
pub use normalize::{NameNormalizer, looks_like_phone, normalize_phone};
pub use registry::{AliasOutcome, AmbiguityNote, ParticipantRegistry};
