use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Builds the health bodies served by `/health` and `/ready`.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Liveness: the process is up and serving requests.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "IPS API is alive".into(),
        }
    }

    /// Readiness, given the outcome of a store ping.
    ///
    /// The error text is not echoed back to the caller.
    pub fn readiness<E>(ping: Result<(), E>) -> HealthRes {
        match ping {
            Ok(()) => HealthRes {
                ok: true,
                message: "IPS API is ready".into(),
            },
            Err(_) => HealthRes {
                ok: false,
                message: "record store unavailable".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_reflects_ping() {
        assert!(HealthService::check_health().ok);
        assert!(HealthService::readiness::<()>(Ok(())).ok);

        let res = HealthService::readiness(Err("connection refused"));
        assert!(!res.ok);
        assert!(!res.message.contains("refused"));
    }
}
