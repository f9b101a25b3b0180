//! Window assembly and classification dispatch.
//!
//! Raw audio batches come in from the bus, full windows go out to the
//! classification oracle, and validated results are published back onto
//! the bus:
//!
//! ```text
//! radio:audio ──▶ WindowAssembler ──▶ Classifier (blocking) ──▶ radio:classifier
//! ```

pub mod classifier;
pub mod loudness;
pub mod window;
pub mod worker;

pub use classifier::{Classification, Classifier, Label, MockClassifier};
pub use loudness::{LoudnessClassifier, LoudnessConfig};
pub use window::WindowAssembler;
pub use worker::{ClassifierWorker, ClassifierWorkerConfig};
