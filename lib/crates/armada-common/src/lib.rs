//! Shared manifest types for armada.
//!
//! Holds the serde shapes of the two documents armada reads from disk: the
//! per-identity `identity.yaml` and the project-level `armada.yaml` fleet
//! manifest. No I/O lives here.

pub mod fleet;
pub mod identity;

pub use fleet::{CloudProvider, ConfigValue, FleetAgent, FleetManifest, OwnerInfo};
pub use identity::{HUB_SKILL_PREFIX, IDENTITY_MANIFEST_FILE, IdentityManifest, SkillRef};
