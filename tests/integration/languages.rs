//! Accept-Language ranking through the request context

use crate::helpers::*;
use request_params::core::Context;
use request_params::language::resolve_accept_language;
use request_params::params::FragmentSource;

/// Languages are ranked by quality, ties in header order.
#[tokio::test]
async fn test_populate_ranks_languages() {
    let config = TestConfig::new();
    let mut req = request(
        "/",
        &[("accept-language", "fr;q=0.5, en-GB, nl;q=0.8, en, de;q=0.5")],
        "",
    );

    let mut ctx = Context::new();
    ctx.populate(&mut req, &config.params)
        .await
        .expect("Populate failed");

    let tags: Vec<_> = ctx
        .languages()
        .iter()
        .map(|p| p.language.as_str())
        .collect();
    assert_eq!(tags, vec!["en-GB", "en", "nl", "fr", "de"]);
    assert_eq!(ctx.languages()[2].quality, 0.8);
    assert!(ctx.degraded().is_empty());
    assert_eq!(ctx.languages().negotiate(&["de", "en-US"]), Some("en-US"));
}

/// Malformed qualities default to 1.0 and are reported with the rest.
#[tokio::test]
async fn test_populate_reports_language_degradations() {
    let config = TestConfig::new();
    let mut req = request(
        "/?x=%G1",
        &[("accept-language", "de;q=0.9, es;q=abc, it;q=7")],
        "",
    );

    let mut ctx = Context::new();
    ctx.populate(&mut req, &config.params)
        .await
        .expect("Populate failed");

    assert_eq!(ctx.languages().preferred(), Some("es"));
    assert_eq!(ctx.languages()[1].language, "it");
    assert_eq!(ctx.languages()[1].quality, 1.0);
    assert_eq!(ctx.languages()[2].language, "de");

    let sources: Vec<_> = ctx.degraded().iter().map(|d| d.source).collect();
    assert_eq!(
        sources,
        vec![
            FragmentSource::Query,
            FragmentSource::AcceptLanguage,
            FragmentSource::AcceptLanguage,
        ]
    );
}

/// No header means no preferences.
#[test]
fn test_missing_header() {
    let req = request("/", &[], "");
    let languages = resolve_accept_language(&req);

    assert!(languages.is_empty());
    assert_eq!(languages.preferred(), None);
    assert_eq!(languages.negotiate(&["en"]), None);
}

/// Rankings serialize in order for downstream consumers.
#[test]
fn test_ranking_serializes() {
    let req = request("/", &[("accept-language", "nl;q=0.2, en")], "");
    let languages = resolve_accept_language(&req);

    let json = serde_json::to_value(&languages).expect("Serialize failed");
    assert_eq!(json[0]["language"], "en");
    assert_eq!(json[1]["language"], "nl");
    assert_eq!(languages.to_string(), "en (1), nl (0.2)");
}
