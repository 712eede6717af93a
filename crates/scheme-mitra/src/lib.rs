//! SchemeMitra core: scheme catalog, discovery pipeline, and Azure AI clients.
//!
//! The discovery pipeline is `catalog -> filter -> match score -> eligibility
//! explanation`. Remote AI failures never cross the explanation boundary as
//! errors; they degrade to displayable warning text so the presentation layer
//! stays error-agnostic.

pub mod ai;
pub mod config;
pub mod error;
pub mod schemes;
pub mod session;
pub mod telemetry;
