use crate::models::ResourceSpec;

/// Result of describing a resource. Transient describe failures travel on
/// the error channel, not here.
#[derive(Clone, Debug)]
pub enum RemoteState {
    Absent,
    Present(ResourceSpec),
}

impl RemoteState {
    pub fn is_present(&self) -> bool {
        matches!(self, RemoteState::Present(_))
    }
}

/// How a single converge call left the resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceOutcome {
    /// The resource was absent and has been created.
    Created,
    /// The resource existed with stale content and was deleted and created
    /// again with the desired content.
    Recreated,
    /// The resource already matched the desired content; nothing was mutated.
    AlreadyCurrent,
}

impl std::fmt::Display for ConvergenceOutcome {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ConvergenceOutcome::Created => write!(f, "created"),
            ConvergenceOutcome::Recreated => write!(f, "recreated"),
            ConvergenceOutcome::AlreadyCurrent => write!(f, "already current"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrySpec;

    #[test]
    fn present_state_is_present() {
        let state = RemoteState::Present(ResourceSpec::Registry(RegistrySpec {
            description: "d".to_string(),
        }));
        assert!(state.is_present());
        assert!(!RemoteState::Absent.is_present());
    }

    #[test]
    fn outcome_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ConvergenceOutcome::AlreadyCurrent).unwrap(),
            "\"already_current\""
        );
    }
}
