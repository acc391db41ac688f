//! Allow-list behaviour through the public engine API
//!
//! Mirrors how a deployed gate sees certificates: a config, an ordered
//! SAN list (or none), and a decision.

use std::sync::Arc;
use std::thread;

use certauthz_core::{AuthorizationGate, AuthzConfig, CertificateView, ConfigError, Decision};

fn decide(config: AuthzConfig, sans: Option<&[&str]>) -> Decision {
    let gate = AuthorizationGate::new(&config, "certauthz").unwrap();
    let cert = sans.map(|s| CertificateView::from_dns_names(s.iter().copied()));
    gate.authorize(cert.as_ref())
}

fn domains(list: &[&str]) -> AuthzConfig {
    AuthzConfig::from_domains(list.iter().copied())
}

// ── configuration ────────────────────────────────────────────────────────────

#[test]
fn config_with_both_modes_fails() {
    let cfg = AuthzConfig {
        regex: "^example[.]org$".to_string(),
        domains: vec!["example.org".to_string()],
    };
    let err = AuthorizationGate::new(&cfg, "certauthz").unwrap_err();
    assert!(matches!(err, ConfigError::BothSpecified));
}

#[test]
fn config_with_neither_mode_fails() {
    let err = AuthorizationGate::new(&AuthzConfig::default(), "certauthz").unwrap_err();
    assert!(matches!(err, ConfigError::NoneSpecified));
}

#[test]
fn config_error_messages_are_operator_readable() {
    assert_eq!(
        ConfigError::InvalidCharacter("a b".to_string()).to_string(),
        "Invalid characters in domain name: a b"
    );
    assert!(ConfigError::BothSpecified.to_string().contains("not both"));
}

// ── domains ──────────────────────────────────────────────────────────────────

#[test]
fn exact_domain_allows() {
    assert_eq!(decide(domains(&["example.org"]), Some(&["example.org"])), Decision::Allow);
}

#[test]
fn any_of_several_domains_allows() {
    assert_eq!(
        decide(domains(&["example.org", "example.com"]), Some(&["example.org"])),
        Decision::Allow
    );
}

#[test]
fn any_of_several_sans_allows() {
    assert_eq!(
        decide(domains(&["example.org"]), Some(&["example.org", "example.com"])),
        Decision::Allow
    );
}

#[test]
fn mixed_case_pattern_allows() {
    assert_eq!(
        decide(
            domains(&["eXamp1e.org", "example.net"]),
            Some(&["examp1e.org", "example.edu"])
        ),
        Decision::Allow
    );
}

#[test]
fn missing_certificate_denies() {
    assert_eq!(decide(domains(&["example.org"]), None), Decision::Deny);
}

#[test]
fn empty_san_list_denies() {
    assert_eq!(decide(domains(&["example.org"]), Some(&[])), Decision::Deny);
}

#[test]
fn other_domain_denies() {
    assert_eq!(decide(domains(&["example.org"]), Some(&["example.com"])), Decision::Deny);
    assert_eq!(
        decide(domains(&["example.org", "example.net"]), Some(&["example.com", "example.edu"])),
        Decision::Deny
    );
}

#[test]
fn attacker_suffix_denies() {
    assert_eq!(
        decide(
            domains(&["example.org"]),
            Some(&["example.org.badactor.com", "sub.example.org.badactor.com"])
        ),
        Decision::Deny
    );
    assert_eq!(
        decide(
            domains(&["example.org"]),
            Some(&["examplexorg.badactor.com", "sub.examplexorg.badactor.com"])
        ),
        Decision::Deny
    );
}

// ── wildcards ────────────────────────────────────────────────────────────────

#[test]
fn wildcard_allows_single_label() {
    assert_eq!(
        decide(domains(&["*.example.org", "example.com"]), Some(&["sub.example.org"])),
        Decision::Allow
    );
    assert_eq!(
        decide(domains(&["*.example.org"]), Some(&["example.org", "*.example.org"])),
        Decision::Allow
    );
}

#[test]
fn wildcard_denies_apex_deeper_and_other_zone() {
    let cfg = || domains(&["*.example.org"]);
    assert_eq!(decide(cfg(), Some(&["example.org"])), Decision::Deny);
    assert_eq!(decide(cfg(), Some(&["sub.example.com"])), Decision::Deny);
    assert_eq!(decide(cfg(), Some(&["sub.sub.example.org"])), Decision::Deny);
    assert_eq!(decide(cfg(), Some(&["*.example.com"])), Decision::Deny);
}

#[test]
fn wildcard_in_last_label_allows() {
    assert_eq!(decide(domains(&["example.*"]), Some(&["example.org"])), Decision::Allow);
}

#[test]
fn partial_label_wildcard_is_loose() {
    // `*` is not required to be a whole label
    assert_eq!(decide(domains(&["exam*ple.org"]), Some(&["examqwerple.org"])), Decision::Allow);
    assert_eq!(decide(domains(&["exam*ple.org"]), Some(&["example.org"])), Decision::Deny);
    assert_eq!(
        decide(domains(&["*example.org"]), Some(&["badactorexample.org"])),
        Decision::Allow
    );
}

// ── raw regex ────────────────────────────────────────────────────────────────

#[test]
fn regex_allows() {
    let re = "^example[.]org$|^[^.]+.example.org$";
    assert_eq!(decide(AuthzConfig::from_regex("^example[.]org$"), Some(&["example.org"])), Decision::Allow);
    assert_eq!(decide(AuthzConfig::from_regex(re), Some(&["sub.example.org"])), Decision::Allow);
    assert_eq!(
        decide(AuthzConfig::from_regex(re), Some(&["example.org", "sub.example.com"])),
        Decision::Allow
    );
}

#[test]
fn unanchored_regex_matches_substrings() {
    let cfg = || AuthzConfig::from_regex("example.org");
    assert_eq!(decide(cfg(), Some(&["example.org.badactor.com"])), Decision::Allow);
    assert_eq!(decide(cfg(), Some(&["examplexorg.badactor.com"])), Decision::Allow);
    assert_eq!(decide(cfg(), Some(&["examplexorg"])), Decision::Allow);
}

#[test]
fn anchored_regex_denies() {
    let cfg = || AuthzConfig::from_regex("^example[.]org$");
    assert_eq!(decide(cfg(), Some(&["examplexorg"])), Decision::Deny);
    assert_eq!(decide(cfg(), Some(&["example.org.badactor.com"])), Decision::Deny);
}

#[test]
fn regex_mode_denies_without_certificate() {
    assert_eq!(decide(AuthzConfig::from_regex(".*"), None), Decision::Deny);
}

// ── concurrency ──────────────────────────────────────────────────────────────

#[test]
fn one_gate_serves_many_threads() {
    let gate = Arc::new(
        AuthorizationGate::new(&domains(&["*.example.org"]), "shared").unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let allowed = CertificateView::from_dns_names([format!("host{i}.example.org")]);
                let denied = CertificateView::from_dns_names([format!("host{i}.example.com")]);
                (0..100).all(|_| {
                    gate.authorize(Some(&allowed)) == Decision::Allow
                        && gate.authorize(Some(&denied)) == Decision::Deny
                })
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap());
    }
}
