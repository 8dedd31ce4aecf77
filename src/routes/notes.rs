//! Note actions. The router below is the whole dispatch table:
//!
//! | action  | method     | path              | success          | failure        |
//! |---------|------------|-------------------|------------------|----------------|
//! | list    | GET        | `/notes?search=`  | 200 list         |                |
//! | show    | GET        | `/notes/:id`      | 200 detail       | 404            |
//! | new     | GET        | `/notes/new`      | 200 empty form   |                |
//! | create  | POST       | `/notes`          | 302 → detail     | 422 form, 400  |
//! | edit    | GET        | `/notes/:id/edit` | 200 filled form  | 404            |
//! | update  | PATCH, PUT | `/notes/:id`      | 302 → detail     | 422, 404, 400  |
//! | destroy | DELETE     | `/notes/:id`      | 302 → list       | 404            |
//!
//! `POST /notes/:id?_method=…` lets plain HTML forms reach update and destroy.

use axum::{
    Extension, Router, async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::flash::{self, Flash, Notice};
use crate::models::ValidationErrors;
use crate::models::note::NoteInput;
use crate::security::form::ValidatedForm;
use crate::store::NoteStore;
use crate::views;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list))
        .route("/notes", get(list).post(create))
        .route("/notes/new", get(new))
        .route(
            "/notes/:id",
            get(show)
                .patch(update)
                .put(update)
                .delete(destroy)
                .post(method_override),
        )
        .route("/notes/:id/edit", get(edit))
}

/// How a handler's result reaches the client.
#[derive(Debug)]
pub enum Rendered {
    Page {
        status: StatusCode,
        html: String,
        clear_flash: bool,
    },
    Redirect {
        location: String,
        notice: Notice,
    },
}

impl Rendered {
    fn page(html: String) -> Self {
        Rendered::Page {
            status: StatusCode::OK,
            html,
            clear_flash: false,
        }
    }

    fn page_with_flash(html: String, flash: Flash) -> Self {
        Rendered::Page {
            status: StatusCode::OK,
            html,
            clear_flash: flash.is_present(),
        }
    }

    fn unprocessable(html: String) -> Self {
        Rendered::Page {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            html,
            clear_flash: false,
        }
    }

    fn redirect(location: String, notice: Notice) -> Self {
        Rendered::Redirect { location, notice }
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        match self {
            Rendered::Page {
                status,
                html,
                clear_flash,
            } => {
                let mut response = (status, Html(html)).into_response();
                if clear_flash {
                    response
                        .headers_mut()
                        .append(header::SET_COOKIE, flash::clear_cookie());
                }
                response
            }
            Rendered::Redirect { location, notice } => {
                let mut response = StatusCode::FOUND.into_response();
                let headers = response.headers_mut();
                match HeaderValue::from_str(&location) {
                    Ok(value) => {
                        headers.insert(header::LOCATION, value);
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "Redirect location is not a valid header");
                        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                    }
                }
                headers.append(header::SET_COOKIE, notice.set_cookie());
                response
            }
        }
    }
}

/// A note id from the path. Anything that is not a positive integer cannot
/// name a note, so it is a 404 rather than a 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for NoteId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;

        raw.parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .map(NoteId)
            .ok_or(AppError::NotFound)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MethodOverride {
    #[serde(rename = "_method")]
    method: Option<String>,
}

pub async fn list(
    Extension(store): Extension<NoteStore>,
    flash: Flash,
    Query(params): Query<SearchParams>,
) -> Result<Rendered, AppError> {
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty());

    let notes = store.list(search).await?;

    Ok(Rendered::page_with_flash(
        views::notes::index(&notes, search, flash.0),
        flash,
    ))
}

pub async fn show(
    Extension(store): Extension<NoteStore>,
    flash: Flash,
    NoteId(id): NoteId,
) -> Result<Rendered, AppError> {
    let note = store.get(id).await?;

    Ok(Rendered::page_with_flash(
        views::notes::show(&note, flash.0),
        flash,
    ))
}

pub async fn new() -> Rendered {
    Rendered::page(views::notes::new_note(
        &NoteInput::default(),
        &ValidationErrors::new(),
    ))
}

#[tracing::instrument(name = "create_note", skip_all)]
pub async fn create(
    Extension(store): Extension<NoteStore>,
    ValidatedForm(input): ValidatedForm<NoteInput>,
) -> Result<Rendered, AppError> {
    match store.create(&input).await {
        Ok(note) => Ok(Rendered::redirect(
            views::notes::note_path(note.id),
            Notice::Created,
        )),
        Err(AppError::Validation(errors)) => {
            log_rejected(&errors);
            Ok(Rendered::unprocessable(views::notes::new_note(
                &input, &errors,
            )))
        }
        Err(err) => Err(err),
    }
}

pub async fn edit(
    Extension(store): Extension<NoteStore>,
    NoteId(id): NoteId,
) -> Result<Rendered, AppError> {
    let note = store.get(id).await?;

    Ok(Rendered::page(views::notes::edit_note(
        note.id,
        &NoteInput::from_note(&note),
        &ValidationErrors::new(),
    )))
}

#[tracing::instrument(name = "update_note", skip_all)]
pub async fn update(
    Extension(store): Extension<NoteStore>,
    NoteId(id): NoteId,
    ValidatedForm(input): ValidatedForm<NoteInput>,
) -> Result<Rendered, AppError> {
    match store.update(id, &input).await {
        Ok(note) => Ok(Rendered::redirect(
            views::notes::note_path(note.id),
            Notice::Updated,
        )),
        Err(AppError::Validation(errors)) => {
            log_rejected(&errors);
            Ok(Rendered::unprocessable(views::notes::edit_note(
                id, &input, &errors,
            )))
        }
        Err(err) => Err(err),
    }
}

#[tracing::instrument(name = "destroy_note", skip_all)]
pub async fn destroy(
    Extension(store): Extension<NoteStore>,
    NoteId(id): NoteId,
) -> Result<Rendered, AppError> {
    store.delete(id).await?;

    Ok(Rendered::redirect("/notes".to_string(), Notice::Deleted))
}

/// `POST /notes/:id` from an HTML form; `_method` picks the real action.
pub async fn method_override(
    Extension(store): Extension<NoteStore>,
    note_id: NoteId,
    Query(params): Query<MethodOverride>,
    request: Request,
) -> Result<Rendered, AppError> {
    let method = params
        .method
        .as_deref()
        .map(str::trim)
        .unwrap_or("patch")
        .to_ascii_lowercase();

    match method.as_str() {
        "patch" | "put" => {
            let form = ValidatedForm::<NoteInput>::from_request(request, &()).await?;
            update(Extension(store), note_id, form).await
        }
        "delete" => destroy(Extension(store), note_id).await,
        _ => Err(AppError::UnsupportedMethod(method)),
    }
}

fn log_rejected(errors: &ValidationErrors) {
    crate::log_note_event!(
        crate::logging::NoteEvent::ValidationFailed,
        errors = %errors,
        "Note submission rejected"
    );
}
