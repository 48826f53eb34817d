// Identity providers - who is acting when a record is written

/// Supplies the email of the acting user, if one is known.
pub trait IdentityProvider {
    fn current_actor_email(&self) -> Option<String>;
}

/// No acting user; actor stamps are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_actor_email(&self) -> Option<String> {
        None
    }
}

/// A fixed acting user.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

impl IdentityProvider for StaticIdentity {
    fn current_actor_email(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the acting user from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvIdentity {
    var: String,
}

impl EnvIdentity {
    pub const DEFAULT_VAR: &'static str = "GRIDORM_ACTOR";

    pub fn new(var: &str) -> Self {
        EnvIdentity {
            var: var.to_string(),
        }
    }
}

impl Default for EnvIdentity {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl IdentityProvider for EnvIdentity {
    fn current_actor_email(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_none() {
        assert_eq!(NoIdentity.current_actor_email(), None);
        assert_eq!(
            StaticIdentity("ann@example.com".into()).current_actor_email().as_deref(),
            Some("ann@example.com")
        );
    }

    #[test]
    fn test_env_identity() {
        let var = "GRIDORM_TEST_ACTOR_IDENTITY";
        let identity = EnvIdentity::new(var);

        std::env::remove_var(var);
        assert_eq!(identity.current_actor_email(), None);

        std::env::set_var(var, "  ");
        assert_eq!(identity.current_actor_email(), None);

        std::env::set_var(var, "bob@example.com");
        assert_eq!(identity.current_actor_email().as_deref(), Some("bob@example.com"));
        std::env::remove_var(var);
    }
}
