//! Contract errors of the demand protocol.
//!
//! Stream failures travel through [`Completion::Failed`]; the errors here are
//! different. They describe a publisher or subscriber breaking the protocol
//! itself. A violation terminates the subscription it happened on: the
//! offending value is not delivered, upstreams are cancelled and the event is
//! logged. Nothing panics.
//!
//! [`Completion::Failed`]: crate::subscriber::Completion::Failed

use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
  /// A demand was built from a negative count.
  #[error("demand must not be negative, got {0}")]
  NegativeDemand(i64),

  /// A publisher emitted a value while the subscriber had no outstanding
  /// demand.
  #[error("value emitted without outstanding demand")]
  EmissionWithoutDemand,
}

impl ContractViolation {
  /// Short stable label for logs.
  pub fn as_label(&self) -> &'static str {
    match self {
      ContractViolation::NegativeDemand(_) => "negative_demand",
      ContractViolation::EmissionWithoutDemand => "emission_without_demand",
    }
  }
}
