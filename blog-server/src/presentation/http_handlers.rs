use crate::application::blog_service::DEFAULT_PAGE_SIZE;
use crate::application::{AuthService, BlogService};
use crate::domain::comment::CommentForm;
use crate::domain::post::{PostForm, PostResponse};
use crate::domain::user::{LoginForm, RegisterForm, UserResponse};
use crate::domain::{Action, DomainError, FieldErrors};
use crate::infrastructure::SessionService;
use crate::presentation::middleware::{
    removal_cookie, safe_next, session_cookie, CurrentUser, Viewer, LOGIN_PATH,
};
use actix_web::http::{header, StatusCode};
use actix_web::{web, Either, HttpResponse, Responder, ResponseError};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

// Тело запроса: HTML-форма или JSON
pub type FormOrJson<T> = Either<web::Form<T>, web::Json<T>>;

fn form_data<T>(body: FormOrJson<T>) -> T {
    match body {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    }
}

// Структура для пагинации
#[derive(serde::Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(serde::Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// Структура для ответа со списком постов
#[derive(Serialize)]
struct PostsResponse {
    posts: Vec<PostResponse>,
    total: i64,
    limit: i64,
    offset: i64,
}

#[derive(Serialize)]
struct SessionResponse {
    message: String,
    user: UserResponse,
}

// Преобразование DomainError в HttpResponse
fn error_to_response(err: &DomainError) -> HttpResponse {
    let message = err.to_string();

    match err {
        DomainError::Validation(errors) => {
            HttpResponse::BadRequest().json(json!({ "errors": errors }))
        }
        DomainError::InvalidCredentials | DomainError::Unauthorized(_) => {
            HttpResponse::Unauthorized().json(json!({ "error": message }))
        }
        DomainError::Forbidden => HttpResponse::Forbidden().json(json!({ "error": message })),
        DomainError::PostNotFound | DomainError::UserNotFound => {
            HttpResponse::NotFound().json(json!({ "error": message }))
        }
        DomainError::UserAlreadyExists => {
            HttpResponse::Conflict().json(json!({ "error": message }))
        }
        DomainError::DatabaseError(_) | DomainError::InternalError(_) => {
            tracing::error!("Request failed: {}", message);
            HttpResponse::InternalServerError().json(json!({ "error": "Internal server error" }))
        }
    }
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.to_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        error_to_response(self)
    }
}

// Ошибки валидации вместе с отправленными значениями для повторного редактирования
fn validation_response(errors: &FieldErrors, values: impl Serialize) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "errors": errors, "values": values }))
}

fn redirect(location: &str) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location.to_string()));
    builder
}

fn post_path(id: i64) -> String {
    format!("/post/{}/", id)
}

// ============== Account Handlers ==============

pub async fn register_form() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "form": "register",
        "values": { "username": "" },
    }))
}

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    body: FormOrJson<RegisterForm>,
) -> impl Responder {
    let form = form_data(body);
    let username = form.username.clone();

    match auth_service.register(form).await {
        Ok(user) => redirect(LOGIN_PATH).json(json!({
            "message": format!("Account {} created. You can now log in.", user.username),
            "user": user,
        })),
        // passwords are never echoed back
        Err(DomainError::Validation(errors)) => {
            validation_response(&errors, json!({ "username": username }))
        }
        Err(err) => error_to_response(&err),
    }
}

pub async fn login_form() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "form": "login",
        "values": { "username": "" },
    }))
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    sessions: web::Data<Arc<SessionService>>,
    query: web::Query<NextQuery>,
    body: FormOrJson<LoginForm>,
) -> impl Responder {
    let form = form_data(body);
    let username = form.username.clone();

    match auth_service.login(form).await {
        Ok((token, user)) => {
            let target = safe_next(query.next.as_deref());
            tracing::debug!("Login for {} redirects to {}", user.username, target);
            redirect(target)
                .cookie(session_cookie(&sessions, token))
                .json(SessionResponse {
                    message: format!("Welcome, {}!", user.username),
                    user,
                })
        }
        Err(DomainError::InvalidCredentials) => HttpResponse::Unauthorized().json(json!({
            "error": DomainError::InvalidCredentials.to_string(),
            "values": { "username": username },
        })),
        Err(err) => error_to_response(&err),
    }
}

pub async fn logout(
    auth_service: web::Data<Arc<AuthService>>,
    user: CurrentUser,
) -> impl Responder {
    match auth_service.end_session(user.0.id).await {
        Ok(()) => redirect("/")
            .cookie(removal_cookie())
            .json(json!({ "message": "You have been logged out." })),
        Err(err) => error_to_response(&err),
    }
}

// ============== Post Handlers ==============

pub async fn list_posts(
    blog_service: web::Data<Arc<BlogService>>,
    viewer: Viewer,
    query: web::Query<PaginationQuery>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    match blog_service.list_posts(viewer.id(), limit, offset).await {
        Ok((posts, total)) => HttpResponse::Ok().json(PostsResponse {
            posts,
            total,
            limit,
            offset,
        }),
        Err(err) => error_to_response(&err),
    }
}

pub async fn get_post(
    blog_service: web::Data<Arc<BlogService>>,
    viewer: Viewer,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Getting post with id={}", post_id);

    match blog_service.get_post(post_id, viewer.id()).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => error_to_response(&err),
    }
}

pub async fn new_post_form(_user: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "form": "post",
        "values": { "title": "", "content": "", "published": false },
    }))
}

pub async fn create_post(
    blog_service: web::Data<Arc<BlogService>>,
    user: CurrentUser,
    body: FormOrJson<PostForm>,
) -> impl Responder {
    let form = form_data(body);

    tracing::info!("Creating post for user_id={}", user.0.id);

    match blog_service.create_post(user.0.id, form.clone()).await {
        Ok(post) => redirect(&post_path(post.id)).json(post),
        Err(DomainError::Validation(errors)) => validation_response(&errors, &form),
        Err(err) => error_to_response(&err),
    }
}

pub async fn edit_post_form(
    blog_service: web::Data<Arc<BlogService>>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    match blog_service
        .authorize(post_id, Some(user.0.id), Action::Edit)
        .await
    {
        Ok(post) => HttpResponse::Ok().json(json!({
            "form": "post",
            "post_id": post.id,
            "values": {
                "title": post.title,
                "content": post.content,
                "published": post.published,
            },
        })),
        Err(err) => error_to_response(&err),
    }
}

pub async fn update_post(
    blog_service: web::Data<Arc<BlogService>>,
    user: CurrentUser,
    path: web::Path<i64>,
    body: FormOrJson<PostForm>,
) -> impl Responder {
    let post_id = path.into_inner();
    let form = form_data(body);

    tracing::info!("Updating post id={} for user_id={}", post_id, user.0.id);

    match blog_service
        .update_post(post_id, user.0.id, form.clone())
        .await
    {
        Ok(post) => redirect(&post_path(post.id)).json(post),
        Err(DomainError::Validation(errors)) => validation_response(&errors, &form),
        Err(err) => error_to_response(&err),
    }
}

pub async fn delete_post_confirm(
    blog_service: web::Data<Arc<BlogService>>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    match blog_service
        .authorize(post_id, Some(user.0.id), Action::Delete)
        .await
    {
        Ok(post) => HttpResponse::Ok().json(json!({
            "confirm": "delete",
            "post": PostResponse::from(post),
        })),
        Err(err) => error_to_response(&err),
    }
}

pub async fn delete_post(
    blog_service: web::Data<Arc<BlogService>>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Deleting post id={} for user_id={}", post_id, user.0.id);

    match blog_service.delete_post(post_id, user.0.id).await {
        Ok(()) => redirect("/").json(json!({ "message": "Post deleted." })),
        Err(err) => error_to_response(&err),
    }
}

pub async fn add_comment(
    blog_service: web::Data<Arc<BlogService>>,
    user: CurrentUser,
    path: web::Path<i64>,
    body: FormOrJson<CommentForm>,
) -> impl Responder {
    let post_id = path.into_inner();
    let form = form_data(body);

    match blog_service
        .add_comment(post_id, user.0.id, form.clone())
        .await
    {
        Ok(comment) => redirect(&post_path(post_id)).json(comment),
        Err(DomainError::Validation(errors)) => validation_response(&errors, &form),
        Err(err) => error_to_response(&err),
    }
}
