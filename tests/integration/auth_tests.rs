//! Login state machine against a scripted site

use crate::mock::*;
use linkreach::automation::selectors;
use linkreach::session::{AuthOutcome, AuthenticationFlow, Credentials};
use linkreach::LinkreachError;
use std::time::Duration;

fn credentials() -> Credentials {
    Credentials::new("ada@example.com", "hunter2")
}

#[tokio::test(start_paused = true)]
async fn test_cached_session_skips_credentials() {
    let site = MockSite::new(SiteScript::default());
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::holding(CACHED_COOKIES);
    let settings = test_settings();
    let limiter = limiter(&settings);

    let outcome = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await
        .unwrap();

    assert_eq!(outcome, AuthOutcome::CachedSession);
    assert!(site.typed().is_empty(), "credential fields must stay untouched");
    assert!(site.clicks().is_empty());
    assert!(!site.navigations().iter().any(|url| url == LOGIN));
    assert_eq!(site.count(&Event::SetCookies), 1);
    assert_eq!(store.saves(), 0);
    assert_eq!(site.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_credential_login_saves_session_once() {
    let site = MockSite::new(SiteScript::default());
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::empty();
    let settings = test_settings();
    let limiter = limiter(&settings);

    let outcome = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await
        .unwrap();

    assert_eq!(outcome, AuthOutcome::CredentialLogin);
    assert_eq!(store.saves(), 1);
    assert_eq!(store.current().unwrap().as_bytes(), FRESH_COOKIES.as_bytes());
    assert_eq!(
        site.typed(),
        vec![
            (selectors::LOGIN_USERNAME.to_string(), "ada@example.com".to_string()),
            (selectors::LOGIN_PASSWORD.to_string(), "hunter2".to_string()),
        ]
    );
    assert_eq!(site.clicks(), vec![selectors::LOGIN_SUBMIT.to_string()]);
    assert_eq!(site.count(&Event::SetCookies), 0);
    assert_eq!(site.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_session_is_invalidated_before_credential_login() {
    let site = MockSite::new(SiteScript {
        cached_session_valid: false,
        ..SiteScript::default()
    });
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::holding(CACHED_COOKIES);
    let settings = test_settings();
    let limiter = limiter(&settings);

    let outcome = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await
        .unwrap();

    assert_eq!(outcome, AuthOutcome::CredentialLogin);
    assert_eq!(store.clears(), 1);
    assert_eq!(store.saves(), 1);

    // cookies are dropped before the login form is touched
    let events = site.events();
    let cleared = events.iter().position(|e| *e == Event::ClearCookies).unwrap();
    let first_type = events
        .iter()
        .position(|e| matches!(e, Event::Type { .. }))
        .unwrap();
    assert!(cleared < first_type);
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_resolved_while_polling() {
    let site = MockSite::new(SiteScript {
        login_landing: LoginLanding::Checkpoint(Some(3)),
        ..SiteScript::default()
    });
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::empty();
    let settings = test_settings();
    let limiter = limiter(&settings);

    let started = tokio::time::Instant::now();
    let outcome = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await
        .unwrap();

    assert_eq!(outcome, AuthOutcome::CheckpointCleared);
    assert_eq!(store.saves(), 1);
    assert!(started.elapsed() < settings.checkpoint_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_resolved_on_final_read() {
    // one read after submitting, one per tick, then the closing read
    let settings = test_settings();
    let final_read = 1 + settings.checkpoint_timeout_seconds as usize + 1;
    let site = MockSite::new(SiteScript {
        login_landing: LoginLanding::Checkpoint(Some(final_read)),
        ..SiteScript::default()
    });
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::empty();
    let limiter = limiter(&settings);

    let started = tokio::time::Instant::now();
    let outcome = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await
        .unwrap();

    assert_eq!(outcome, AuthOutcome::CheckpointCleared);
    assert_eq!(store.saves(), 1);
    assert!(started.elapsed() >= settings.checkpoint_timeout());
    assert!(started.elapsed() < settings.checkpoint_timeout() + settings.failure_grace());
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_timeout_fails_after_grace_delay() {
    let site = MockSite::new(SiteScript {
        login_landing: LoginLanding::Checkpoint(None),
        ..SiteScript::default()
    });
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::empty();
    let settings = test_settings();
    let limiter = limiter(&settings);

    let started = tokio::time::Instant::now();
    let result = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await;

    match result {
        Err(LinkreachError::Authentication { stage, message }) => {
            assert_eq!(stage, "checkpoint");
            assert!(message.contains("checkpoint"));
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
    assert!(started.elapsed() >= settings.checkpoint_timeout() + settings.failure_grace());
    assert_eq!(store.saves(), 0);
    assert_eq!(site.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_landing_is_authentication_error() {
    let site = MockSite::new(SiteScript {
        login_landing: LoginLanding::Elsewhere(
            "https://www.linkedin.com/uas/login-submit?error=1".to_string(),
        ),
        ..SiteScript::default()
    });
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::empty();
    let settings = test_settings();
    let limiter = limiter(&settings);

    let result = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, LinkreachError::Authentication { .. }));
    assert!(!err.is_retryable());
    assert_eq!(store.saves(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_login_form_fails() {
    let site = MockSite::new(SiteScript::default().missing(selectors::LOGIN_PASSWORD));
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::empty();
    let settings = test_settings();
    let limiter = limiter(&settings);

    let result = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await;

    assert!(matches!(result, Err(LinkreachError::Authentication { .. })));
    assert!(site.typed().is_empty());
    assert_eq!(site.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_login_during_checkpoint() {
    let site = MockSite::new(SiteScript {
        login_landing: LoginLanding::Checkpoint(None),
        ..SiteScript::default()
    });
    let browser = MockBrowser::new(site.clone());
    let store = MemoryStore::empty();
    let mut settings = test_settings();
    settings.checkpoint_timeout_seconds = 600;
    let limiter = limiter(&settings);

    let cancel = limiter.cancellation().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        cancel.cancel();
    });

    let result = AuthenticationFlow::new(&settings, store.as_ref(), &limiter)
        .login(&browser, &credentials())
        .await;

    assert!(matches!(result, Err(LinkreachError::Cancelled)));
    assert_eq!(site.open_pages(), 0);
}
