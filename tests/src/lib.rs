//! # DAG Ledger Test Suite
//!
//! Cross-crate scenarios that drive the full submission path: review,
//! pending apply, stabilization and witness rotation.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks
//! └── src/integration/  # End-to-end scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dag-tests
//! cargo test -p dag-tests integration::scenarios::
//! cargo bench -p dag-tests
//! ```

pub mod integration;
