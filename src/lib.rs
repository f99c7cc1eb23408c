//! bridgegen: a dual-artifact bridge binding generator
//!
//! Reads a tree of type-annotated source modules whose exported functions
//! are meant to be callable across a managed/browser boundary, and emits
//! two coordinated artifacts per namespace: a managed binding unit (extern
//! declarations plus public wrappers with pending-call bookkeeping) and a
//! glue library unit (boundary functions with value marshaling and the
//! completion call-back path). A separate verification pass re-parses both
//! texts and confirms they agree on the calling convention.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  bridgegen                   │
//! │                                              │
//! │  extract    - export signature scanning      │
//! │  mapper     - canonical type tags            │
//! │  namespace  - path -> dotted namespace       │
//! │  transform  - async -> callback convention   │
//! │  emit       - managed + glue projection      │
//! │  verify     - cross-artifact re-parse check  │
//! │  pipeline   - per-namespace fault isolation  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: descriptors feed both emitters in parallel, and the
//! verifier consumes only emitted text, never the descriptors, so an
//! emission defect can't mask itself.

pub mod emit;
pub mod error;
pub mod extract;
pub mod mapper;
pub mod namespace;
pub mod pipeline;
pub mod report;
pub mod transform;
pub mod types;
pub mod verify;

pub use error::GenerateError;
pub use pipeline::{generate, generate_modules, OutputTargets, SourceModule};
pub use report::GenerationReport;
pub use types::{BridgeFunctionDescriptor, TypeTag};
pub use verify::{verify_units, InvariantViolation};
