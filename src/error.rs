use std::fmt;

use thiserror::Error;

/// The network step a [`DeployError::Network`] happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Step {
    Connecting,
    Submitting,
    Confirming,
}

/// Errors that end a deployment run.
///
/// None of these are retried. Every variant maps to exit code `1`.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or invalid credential, endpoint, constructor arguments or
    /// artifact selection.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The RPC endpoint rejected a request or could not be reached.
    #[error("Network error while {step}: {message}")]
    Network { step: Step, message: String },

    #[error(transparent)]
    Unknown(#[from] eyre::Report),
}

impl DeployError {
    pub fn configuration(message: impl ToString) -> Self {
        Self::Configuration(message.to_string())
    }

    pub fn network(step: Step, err: impl fmt::Display) -> Self {
        Self::Network {
            step,
            message: err.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn network_step(&self) -> Option<Step> {
        match self {
            Self::Network { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_name_the_step() {
        let err = DeployError::network(Step::Submitting, "nonce too low");

        assert_eq!(
            err.to_string(),
            "Network error while submitting: nonce too low"
        );
        assert_eq!(err.network_step(), Some(Step::Submitting));
        assert!(!err.is_configuration());
    }

    #[test]
    fn unknown_wraps_eyre_reports() {
        let err: DeployError = eyre::eyre!("disk on fire").into();

        assert!(matches!(err, DeployError::Unknown(_)));
        assert_eq!(err.to_string(), "disk on fire");
    }
}
