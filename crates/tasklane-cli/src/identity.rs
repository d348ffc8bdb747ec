//! Caller identity for CLI requests.
//!
//! Resolution chain: `--user` flag > `TASKLANE_USER` env > `USER` env (TTY only).
//! An unresolved caller is passed through as anonymous; the backend rejects it
//! with `NotAuthenticated`.

use std::env;

use tasklane_core::auth::{FixedIdentity, Identity, IdentityProvider};

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

fn resolve_user_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(user) = cli_flag.filter(|u| !u.trim().is_empty()) {
        return Some(user.to_string());
    }
    if let Some(val) = env.get("TASKLANE_USER") {
        return Some(val);
    }
    if env.is_tty() {
        return env.get("USER");
    }
    None
}

/// Identity provider backed by the flag and the process environment.
#[derive(Debug, Clone)]
pub struct CliIdentity(FixedIdentity);

impl CliIdentity {
    pub fn resolve(cli_flag: Option<&str>) -> Self {
        Self::from_user(resolve_user_with(cli_flag, &RealEnv))
    }

    fn from_user(user: Option<String>) -> Self {
        Self(user.map_or_else(FixedIdentity::anonymous, |u| FixedIdentity::user(&u)))
    }
}

impl IdentityProvider for CliIdentity {
    fn resolve_identity(&self) -> Option<Identity> {
        let identity = self.0.resolve_identity();
        if let Some(ref id) = identity {
            tracing::debug!(user = id.as_str(), "caller resolved");
        }
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockEnv {
        vars: HashMap<String, String>,
        tty: bool,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
                tty: false,
            }
        }

        fn var(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }

        const fn tty(mut self) -> Self {
            self.tty = true;
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.trim().is_empty()).cloned()
        }

        fn is_tty(&self) -> bool {
            self.tty
        }
    }

    #[test]
    fn flag_takes_priority() {
        let env = MockEnv::new().var("TASKLANE_USER", "env-user");
        assert_eq!(resolve_user_with(Some("flag-user"), &env).as_deref(), Some("flag-user"));
    }

    #[test]
    fn blank_flag_falls_back_to_env() {
        let env = MockEnv::new().var("TASKLANE_USER", "env-user");
        assert_eq!(resolve_user_with(Some("  "), &env).as_deref(), Some("env-user"));
    }

    #[test]
    fn user_env_only_on_a_tty() {
        let env = MockEnv::new().var("USER", "ada");
        assert_eq!(resolve_user_with(None, &env), None);

        let env = MockEnv::new().var("USER", "ada").tty();
        assert_eq!(resolve_user_with(None, &env).as_deref(), Some("ada"));
    }

    #[test]
    fn unresolved_caller_is_anonymous() {
        assert!(CliIdentity::from_user(None).resolve_identity().is_none());
        let id = CliIdentity::from_user(Some(" ada ".to_string()))
            .resolve_identity()
            .expect("identity");
        assert_eq!(id.as_str(), "ada");
    }
}
