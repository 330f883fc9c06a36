use crate::config::GuardConfig;
use crate::router::ResolvedLocation;

/// Locations reachable without a token, by path or by route name.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    paths: Vec<String>,
    names: Vec<String>,
}

impl Whitelist {
    pub fn new(paths: Vec<String>, names: Vec<String>) -> Self { Self { paths, names } }

    pub fn from_config(cfg: &GuardConfig) -> Self { Self::new(cfg.whitelist_paths.clone(), cfg.whitelist_names.clone()) }

    pub fn is_white_list(&self, to: &ResolvedLocation) -> bool {
        self.paths.iter().any(|p| p == &to.path)
            || to.name.as_ref().map(|n| self.names.iter().any(|w| w == n)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(path: &str, name: Option<&str>) -> ResolvedLocation {
        ResolvedLocation { path: path.into(), name: name.map(str::to_string), ..Default::default() }
    }

    #[test]
    fn matches_path_or_name() {
        let w = Whitelist::new(vec!["/login".into()], vec!["register".into()]);
        assert!(w.is_white_list(&loc("/login", None)));
        assert!(w.is_white_list(&loc("/sign-up", Some("register"))));
        assert!(!w.is_white_list(&loc("/book/list", Some("bookList"))));
    }

    #[test]
    fn default_config_admits_login_only() {
        let w = Whitelist::from_config(&GuardConfig::default());
        assert!(w.is_white_list(&loc("/login", None)));
        assert!(!w.is_white_list(&loc("/403", None)));
    }
}
