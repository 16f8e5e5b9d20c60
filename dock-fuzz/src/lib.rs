//! dock-fuzz: randomized, replayable operation fuzzing for docking layouts
//!
//! Drive a docking library through random sequences of close, show, dock,
//! tab, save and restore operations. Every executed step is recorded; a
//! failing run is dumped as JSON and can be replayed step for step.
//!
//! # Example
//! ```ignore
//! use dock_fuzz::prelude::*;
//!
//! let config = FuzzerConfig::default().with_seed(7).with_dump_dir("dumps");
//! let mut fuzzer = Fuzzer::new(SimulatedDockHost::new(), config);
//!
//! if let Err(failure) = fuzzer.fuzz(&CancellationToken::new()).await {
//!     eprintln!("{failure}");
//! }
//! ```

// Re-export everything from core
pub use dock_fuzz_core::*;

// Re-export derive macros
pub use dock_fuzz_macros::CodedEnum;

/// Prelude for convenient imports
pub mod prelude {
    pub use dock_fuzz_core::prelude::*;

    // Derive macros
    pub use dock_fuzz_macros::CodedEnum;
}
