//! # Rusty-hmm
//!
//! `rusty-hmm` provides the building blocks of Hidden Markov Model training in Rust:
//! Gaussian distributions, emission models that can be fitted on weighted observations,
//! an HMM parameter container and an adaptive decision tree that partitions data into
//! regions, each of which can get its own emission model.
//!
//! ## Getting Started
//!
//! To use `rusty-hmm`, add the following to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! rusty-hmm = "*"
//! ```
//!
//! ## Example Usage
//!
//! As a quick example, here's how you can split a signal with a decision tree and turn
//! every leaf into the emission model of one HMM state:
//!
//! ```rust
//!
//! use rusty_hmm::data::ObservationVector;
//! use rusty_hmm::hmm::Hmm;
//! use rusty_hmm::observables::{Opdf, OpdfMultiGaussian};
//! use rusty_hmm::trees::{ContinuousAttribute, DecisionTree, GaussianTarget, TreeParams};
//! use nalgebra::{DMatrix, DVector};
//!
//! type Sample = (f64, ObservationVector);
//!
//! let mut params = TreeParams::new();
//! params.set_max_leaves(Some(2)).unwrap();
//!
//! let mut tree: DecisionTree<Sample> = DecisionTree::with_params(
//!     vec![Box::new(ContinuousAttribute::new("time", |s: &Sample| s.0))],
//!     Box::new(GaussianTarget::new("signal", |s: &Sample| s.1.value.clone())),
//!     params,
//! );
//!
//! for i in 0..20 {
//!     let level = if i < 10 { 0.0 } else { 10.0 };
//!     let signal = vec![level + 0.1 * (i % 3) as f64, level - 0.1 * (i % 2) as f64];
//!     tree.insert((i as f64, ObservationVector::from(signal))).unwrap();
//! }
//!
//! tree.grow().unwrap();
//!
//! let fitted = tree
//!     .fit_leaves(tree.root(), |memory| {
//!         let observations: Vec<ObservationVector> = memory.iter().map(|s| s.1.clone()).collect();
//!         let mut opdf = OpdfMultiGaussian::new(2);
//!         opdf.fit(&observations)?;
//!         Ok(opdf)
//!     })
//!     .unwrap();
//!
//! let opdfs: Vec<Box<dyn Opdf<ObservationVector>>> = fitted
//!     .into_iter()
//!     .map(|(_, opdf)| Box::new(opdf) as Box<dyn Opdf<ObservationVector>>)
//!     .collect();
//!
//! let hmm = Hmm::with_params(
//!     DVector::from_element(2, 0.5),
//!     DMatrix::from_element(2, 2, 0.5),
//!     opdfs,
//! )
//! .unwrap();
//!
//! assert_eq!(hmm.nb_states(), 2);
//! ```

/// Observation types and numeric traits
pub mod data;
/// Gaussian distributions and weighted parameter estimation
pub mod distributions;
/// Error type shared by every model
pub mod error;
/// Hidden Markov Model container and sequence generation
pub mod hmm;
/// Emission probability distributions
pub mod observables;
/// Adaptive decision trees
pub mod trees;

pub use error::{ModelError, Result};
