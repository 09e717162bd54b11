use crate::application::AuthService;
use crate::domain::DomainError;
use crate::infrastructure::session::{SessionService, SessionUser, SESSION_COOKIE};
use actix_web::body::MessageBody;
use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, Header};
use actix_web::middleware::Next;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/accounts/login/";

// Cached per request so the session is looked up at most once.
#[derive(Clone)]
struct ResolvedSession(Option<SessionUser>);

fn presented_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            Authorization::<Bearer>::parse(req)
                .ok()
                .map(|auth| auth.into_scheme().token().to_string())
        })
}

/// Identity behind the request: the `sessionid` cookie, or a bearer token
/// for non-browser clients. The token must still match a live user.
pub async fn resolve_session(req: &HttpRequest) -> Result<Option<SessionUser>, DomainError> {
    if let Some(resolved) = req.extensions().get::<ResolvedSession>() {
        return Ok(resolved.0.clone());
    }

    let auth_service = match req.app_data::<web::Data<Arc<AuthService>>>() {
        Some(service) => service.get_ref().clone(),
        None => {
            tracing::error!("Auth service not configured");
            return Err(DomainError::InternalError(
                "Auth service not configured".to_string(),
            ));
        }
    };

    let user = match presented_token(req) {
        Some(token) => auth_service.resolve_session(&token).await?,
        None => None,
    };

    req.extensions_mut().insert(ResolvedSession(user.clone()));
    Ok(user)
}

/// Guards login-only routes: anonymous requests are redirected to the login
/// page with the original path in `next`.
pub async fn require_login(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if resolve_session(req.request()).await?.is_some() {
        return next
            .call(req)
            .await
            .map(ServiceResponse::map_into_left_body);
    }

    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string());

    tracing::debug!("Anonymous request to {} redirected to login", target);

    let response = login_redirect(&target);
    Ok(req.into_response(response).map_into_right_body())
}

pub fn login_redirect(next: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((
            header::LOCATION,
            format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next)),
        ))
        .finish()
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

pub fn session_cookie(sessions: &SessionService, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(sessions.cookie_secure())
        .max_age(time::Duration::seconds(sessions.ttl().num_seconds()))
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// The viewer of a public page; `None` when anonymous.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<SessionUser>);

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(Viewer(resolve_session(&req).await?)) })
    }
}

/// The signed-in user on a route guarded by [`require_login`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequest for CurrentUser {
    type Error = DomainError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            resolve_session(&req)
                .await?
                .map(CurrentUser)
                .ok_or_else(|| DomainError::Unauthorized("User not authenticated".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/post/3/edit/")), "/post/3/edit/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn login_redirect_encodes_next() {
        let response = login_redirect("/post/new/?draft=1");
        assert_eq!(response.status(), actix_web::http::StatusCode::FOUND);
        let location = response.headers().get(header::LOCATION).unwrap();
        assert_eq!(
            location.to_str().unwrap(),
            "/accounts/login/?next=%2Fpost%2Fnew%2F%3Fdraft%3D1"
        );
    }

    #[test]
    fn removal_cookie_expires_session() {
        let cookie = removal_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
