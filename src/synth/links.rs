//! Cross-app location linking and root locations.

use crate::model::{AppConfig, Location};
use crate::synth::ConfigError;

/// Index of the first app (in listing order) serving `domain`.
pub fn app_by_domain(apps: &[AppConfig], domain: &str) -> Option<usize> {
    apps.iter()
        .position(|app| app.domains.iter().any(|d| d == domain))
}

/// Domains claimed by more than one app, with the first and shadowed claimants.
pub fn duplicate_domains(apps: &[AppConfig]) -> Vec<(String, String, String)> {
    let mut duplicates = Vec::new();
    for (i, app) in apps.iter().enumerate() {
        for domain in &app.domains {
            if let Some(first) = app_by_domain(&apps[..i], domain) {
                duplicates.push((domain.clone(), apps[first].name.clone(), app.name.clone()));
            }
        }
    }
    duplicates
}

/// Append each borrowing app's proxy locations to the app owning its proxy domain.
///
/// Locations record the borrower by its index in `apps`, so `apps` must
/// not be reordered afterwards. Fails on the first proxy domain no app serves; `apps` may then hold
/// partially linked entries and must be discarded.
pub fn link_locations(apps: &mut [AppConfig]) -> Result<(), ConfigError> {
    for i in 0..apps.len() {
        if !apps[i].proxies_elsewhere() {
            continue;
        }

        let borrower = &apps[i];
        let target = app_by_domain(apps, &borrower.proxy_domain).ok_or_else(|| {
            ConfigError::MissingProxyDomain {
                domain: borrower.proxy_domain.clone(),
                app: borrower.name.clone(),
            }
        })?;

        let linked: Vec<Location> = borrower
            .proxy_locations
            .iter()
            .map(|path| Location::new(i, path.clone()))
            .collect();

        tracing::debug!(
            borrower = %borrower.name,
            target = %apps[target].name,
            paths = linked.len(),
            "Linked proxy locations"
        );
        apps[target].locations.extend(linked);
    }
    Ok(())
}

/// Give every app its catch-all "/" location, after any linked ones.
pub fn add_root_locations(apps: &mut [AppConfig]) {
    for (i, app) in apps.iter_mut().enumerate() {
        app.locations.push(Location::new(i, "/"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RouterConfig;

    fn app(name: &str, domains: &[&str]) -> AppConfig {
        let mut app = AppConfig::new(&RouterConfig::default());
        app.name = name.to_string();
        app.domains = domains.iter().map(|d| d.to_string()).collect();
        app
    }

    fn paths(app: &AppConfig) -> Vec<(usize, &str)> {
        app.locations
            .iter()
            .map(|l| (l.owner, l.path.as_str()))
            .collect()
    }

    #[test]
    fn test_links_borrowed_paths_onto_target() {
        let mut borrower = app("bar", &["bar.example.com"]);
        borrower.proxy_domain = "foo.example.com".to_string();
        borrower.proxy_locations = vec!["/api".to_string(), "/webhook".to_string()];
        let mut apps = vec![app("foo", &["foo.example.com"]), borrower];

        link_locations(&mut apps).unwrap();
        add_root_locations(&mut apps);

        assert_eq!(paths(&apps[0]), vec![(1, "/api"), (1, "/webhook"), (0, "/")]);
        assert_eq!(paths(&apps[1]), vec![(1, "/")]);
    }

    #[test]
    fn test_missing_proxy_domain_names_domain() {
        let mut borrower = app("bar", &["bar.example.com"]);
        borrower.proxy_domain = "foo.example.com".to_string();
        borrower.proxy_locations = vec!["/api".to_string()];
        let mut apps = vec![borrower];

        let err = link_locations(&mut apps).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingProxyDomain {
                domain: "foo.example.com".to_string(),
                app: "bar".to_string(),
            }
        );
        assert!(err.to_string().contains("foo.example.com"));
    }

    #[test]
    fn test_proxy_domain_without_locations_is_ignored() {
        let mut borrower = app("bar", &["bar.example.com"]);
        borrower.proxy_domain = "nowhere.example.com".to_string();
        let mut apps = vec![borrower];

        assert!(link_locations(&mut apps).is_ok());
        assert!(apps[0].locations.is_empty());
    }

    #[test]
    fn test_first_listed_app_wins_duplicate_domain() {
        let mut borrower = app("bar", &["bar.example.com"]);
        borrower.proxy_domain = "shared.example.com".to_string();
        borrower.proxy_locations = vec!["/api".to_string()];
        let mut apps = vec![
            app("first", &["shared.example.com"]),
            app("second", &["shared.example.com"]),
            borrower,
        ];

        assert_eq!(
            duplicate_domains(&apps),
            vec![("shared.example.com".to_string(), "first".to_string(), "second".to_string())]
        );

        link_locations(&mut apps).unwrap();
        assert_eq!(apps[0].locations.len(), 1);
        assert!(apps[1].locations.is_empty());
    }
}
