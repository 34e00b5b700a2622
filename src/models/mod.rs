//! System description: particles, compartments, boxes and run context
//!
//! # Structure
//!
//! ```text
//! ModelContext
//! ├── ModelBox "Utopia"
//! │   ├── Compartment "Ocean_Surface_Water"  (type, processes, connections)
//! │   ├── Compartment "Ocean_Mixed_Water"
//! │   └── ...
//! └── BoxFlows (optional inter-box connectivity)
//!
//! Particle (species) ── compartment name + box name ──> ModelContext
//! ```
//!
//! Species never own their compartment; every lookup goes through the
//! context of the run.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod compartment;
pub mod context;
pub mod emission;
pub mod model_box;
pub mod particle;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use compartment::{Compartment, CompartmentType, TransportEdge};
pub use context::{LoadedModel, ModelContext, ModelInput};
pub use emission::{EmissionSource, Emissions};
pub use model_box::{BoxFlows, ModelBox};
pub use particle::{Particle, ParticleProperties, Shape};
