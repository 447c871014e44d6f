use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use tracing::{error, info, instrument, warn};

use crate::auth::dto::{LoginForm, OtpForm, RegisterForm};
use crate::auth::error::AuthError;
use crate::auth::repo::{self, User};
use crate::auth::{otp, services};
use crate::session::Session;
use crate::state::AppState;

const REGISTER_FORM: &str = r#"<form method="post" action="/register">
<input name="name" placeholder="Name">
<input name="email" placeholder="Email">
<input type="password" name="password" placeholder="Password">
<button>Register</button>
</form>"#;

const VERIFY_FORM: &str = r#"<form method="post" action="/verify-otp">
<input name="otp" placeholder="One-time code">
<button>Verify</button>
</form>"#;

const LOGIN_FORM: &str = r#"<form method="post" action="/login">
<input name="email" placeholder="Email">
<input type="password" name="password" placeholder="Password">
<button>Log in</button>
</form>"#;

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page(title: &str, flash: Option<&str>, body: &str) -> String {
    let notice = flash
        .map(|m| format!(r#"<p class="flash">{}</p>"#, escape_html(m)))
        .unwrap_or_default();
    format!(
        "<!doctype html><html><head><title>{title}</title></head>\
         <body><h1>{title}</h1>{notice}{body}</body></html>"
    )
}

/// Map a flow error onto its redirect. Session gate failures redirect bare,
/// user mistakes carry a flash message, infrastructure failures become a 500.
async fn fail(session: Session, err: AuthError) -> Response {
    match err {
        AuthError::NoPendingSession | AuthError::Unauthenticated => {
            session.redirect("/login").await
        }
        AuthError::Internal(e) => {
            error!(error = %e, "internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
        other => {
            let target = other.redirect_target();
            session.redirect_with_flash(&other.to_string(), target).await
        }
    }
}

#[instrument(skip(session))]
pub async fn register_page(mut session: Session) -> Response {
    let flash = session.take_flash();
    session
        .render(page("Register", flash.as_deref(), REGISTER_FORM))
        .await
}

#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    match try_register(&state, &form).await {
        Ok(user) => {
            session.data.pending_email = Some(user.email.clone());
            session.redirect("/verify-otp").await
        }
        Err(err) => fail(session, err).await,
    }
}

async fn try_register(state: &AppState, form: &RegisterForm) -> Result<User, AuthError> {
    if !all_fields_present(form) {
        return Err(AuthError::Validation);
    }

    // Pre-check gives the friendly failure; the unique constraint on the
    // insert below is what settles a concurrent race on the same email.
    if User::find_by_email(&state.db, &form.email).await?.is_some() {
        warn!(email = %form.email, "email already registered");
        return Err(AuthError::DuplicateEmail);
    }

    let code = otp::generate();
    state.mailer.send_code(&form.email, &code).await?;

    let hash = services::hash_password(&form.password)?;

    match User::create(&state.db, &form.name, &form.email, &hash, &code).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Err(e) if repo::is_unique_violation(&e) => {
            warn!(email = %form.email, "email already registered (insert race)");
            Err(AuthError::DuplicateEmail)
        }
        Err(e) => Err(AuthError::Internal(e.into())),
    }
}

fn all_fields_present(form: &RegisterForm) -> bool {
    !(form.name.is_empty() || form.email.is_empty() || form.password.is_empty())
}

#[instrument(skip(session))]
pub async fn verify_otp_page(mut session: Session) -> Response {
    if session.data.pending_email.is_none() {
        return session.redirect("/login").await;
    }
    let flash = session.take_flash();
    session
        .render(page("Verify OTP", flash.as_deref(), VERIFY_FORM))
        .await
}

#[instrument(skip(state, session, form))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OtpForm>,
) -> Response {
    let Some(email) = session.data.pending_email.clone() else {
        return fail(session, AuthError::NoPendingSession).await;
    };
    match try_verify(&state, &email, &form.otp).await {
        Ok(()) => {
            session
                .redirect_with_flash("OTP Verified! Please log in.", "/login")
                .await
        }
        Err(err) => fail(session, err).await,
    }
}

async fn try_verify(state: &AppState, email: &str, submitted: &str) -> Result<(), AuthError> {
    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or(AuthError::InvalidOtp)?;

    let matches = user
        .otp
        .as_deref()
        .is_some_and(|stored| otp::otp_matches(submitted, stored));
    if !matches {
        warn!(email = %email, "otp mismatch");
        return Err(AuthError::InvalidOtp);
    }

    User::mark_verified(&state.db, user.id).await?;
    info!(user_id = %user.id, email = %user.email, "otp verified");
    Ok(())
}

#[instrument(skip(session))]
pub async fn login_page(mut session: Session) -> Response {
    let flash = session.take_flash();
    session
        .render(page("Log in", flash.as_deref(), LOGIN_FORM))
        .await
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match try_login(&state, &form).await {
        Ok(email) => {
            session.data.authenticated_email = Some(email);
            session.redirect("/welcome").await
        }
        Err(err) => fail(session, err).await,
    }
}

async fn try_login(state: &AppState, form: &LoginForm) -> Result<String, AuthError> {
    let user = User::find_by_email(&state.db, &form.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !login_allowed(&user, &form.password)? {
        warn!(email = %form.email, "login rejected");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(user.email)
}

/// Login requires a verified account and a matching password. Callers fold
/// both failures, and an unknown email, into one undifferentiated signal.
fn login_allowed(user: &User, password: &str) -> Result<bool, AuthError> {
    if !user.otp_verified {
        return Ok(false);
    }
    Ok(services::verify_password(password, &user.password_hash)?)
}

#[instrument(skip(session))]
pub async fn welcome(mut session: Session) -> Response {
    let Some(email) = session.data.authenticated_email.clone() else {
        return fail(session, AuthError::Unauthenticated).await;
    };
    let flash = session.take_flash();
    session
        .render(page(
            "Welcome",
            flash.as_deref(),
            &format!("<p>Logged in as {}</p>", escape_html(&email)),
        ))
        .await
}

#[cfg(test)]
mod tests {
    use axum::extract::FromRequestParts;
    use axum::http::header::LOCATION;
    use axum::http::Request;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    fn make_user(verified: bool, password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "a@x.com".into(),
            password_hash: services::hash_password(password).expect("hash"),
            otp: Some("123456".into()),
            otp_verified: verified,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    async fn fresh_session(state: &AppState) -> Session {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        Session::from_request_parts(&mut parts, state).await.unwrap()
    }

    #[test]
    fn unverified_account_cannot_log_in_even_with_correct_password() {
        let user = make_user(false, "pw1");
        assert!(!login_allowed(&user, "pw1").unwrap());
    }

    #[test]
    fn verified_account_rejects_wrong_password() {
        let user = make_user(true, "pw1");
        assert!(!login_allowed(&user, "pw2").unwrap());
    }

    #[test]
    fn verified_account_with_correct_password_logs_in() {
        let user = make_user(true, "pw1");
        assert!(login_allowed(&user, "pw1").unwrap());
    }

    #[test]
    fn registration_requires_every_field() {
        let full = RegisterForm {
            name: "Alice".into(),
            email: "a@x.com".into(),
            password: "pw1".into(),
        };
        assert!(all_fields_present(&full));

        for blank in ["name", "email", "password"] {
            let form = RegisterForm {
                name: if blank == "name" { String::new() } else { "Alice".into() },
                email: if blank == "email" { String::new() } else { "a@x.com".into() },
                password: if blank == "password" { String::new() } else { "pw1".into() },
            };
            assert!(!all_fields_present(&form), "blank {blank} should fail");
        }
    }

    #[test]
    fn interpolated_values_are_html_escaped() {
        let html = page("Log in", Some(r#"<script>alert("x")</script>"#), LOGIN_FORM);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));

        assert_eq!(
            escape_html(r#"a&b<c>"d""#),
            "a&amp;b&lt;c&gt;&quot;d&quot;"
        );
    }

    #[test]
    fn page_renders_flash_only_when_present() {
        let with = page("Log in", Some("Invalid OTP"), LOGIN_FORM);
        assert!(with.contains("Invalid OTP"));
        assert!(with.contains(r#"class="flash""#));

        let without = page("Log in", None, LOGIN_FORM);
        assert!(!without.contains(r#"class="flash""#));
    }

    #[tokio::test]
    async fn otp_mismatch_sends_the_client_back_to_the_verify_step() {
        let state = AppState::fake();
        let session = fresh_session(&state).await;
        let res = fail(session, AuthError::InvalidOtp).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/verify-otp");
    }

    #[tokio::test]
    async fn missing_pending_session_redirects_to_login_without_flash() {
        let state = AppState::fake();
        let session = fresh_session(&state).await;
        let res = fail(session, AuthError::NoPendingSession).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn internal_errors_are_a_500_not_a_redirect() {
        let state = AppState::fake();
        let session = fresh_session(&state).await;
        let res = fail(session, AuthError::Internal(anyhow::anyhow!("boom"))).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
