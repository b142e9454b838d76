//! Big-brain router (§4.5): routes gate-approved briefs to the flash tier
//! and escalations to the pro tier, with a transport-failure fallback from
//! pro to flash only.

pub mod error;
pub mod model;
pub mod router;

pub use error::RouterError;
pub use model::SynthesisResult;
pub use router::BigBrainRouter;
