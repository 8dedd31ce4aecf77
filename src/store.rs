use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel_async::RunQueryDsl;

use crate::db::{DbPool, fold_case};
use crate::errors::AppError;
use crate::logging::{LoggableSearchTerm, NoteEvent};
use crate::models::note::{NewNote, Note, NoteInput};
use crate::schema::notes;

/// Upper bound on rows returned by [`NoteStore::list`].
pub const LIST_LIMIT: i64 = 50;

const LIKE_ESCAPE: char = '\\';

/// Persistence operations for notes. Cheap to clone; every clone shares the
/// same pool.
#[derive(Clone)]
pub struct NoteStore {
    pool: DbPool,
}

impl NoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(name = "note_create", skip_all, fields(note_id))]
    pub async fn create(&self, input: &NoteInput) -> Result<Note, AppError> {
        let new_note = NewNote::from_input(input, Utc::now().naive_utc())?;

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| AppError::Pool(err.to_string()))?;

        let note = diesel::insert_into(notes::table)
            .values(&new_note)
            .returning(Note::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from_diesel)?;

        tracing::Span::current().record("note_id", note.id);
        crate::log_note_event!(NoteEvent::Created, note_id = note.id, "Note created");

        Ok(note)
    }

    #[tracing::instrument(name = "note_get", skip(self))]
    pub async fn get(&self, id: i32) -> Result<Note, AppError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| AppError::Pool(err.to_string()))?;

        notes::table
            .find(id)
            .select(Note::as_select())
            .first(&mut conn)
            .await
            .map_err(AppError::from_diesel)
    }

    /// Unknown ids are reported before validation runs.
    #[tracing::instrument(name = "note_update", skip(self, input))]
    pub async fn update(&self, id: i32, input: &NoteInput) -> Result<Note, AppError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| AppError::Pool(err.to_string()))?;

        let exists: i64 = notes::table
            .filter(notes::id.eq(id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from_diesel)?;
        if exists == 0 {
            return Err(AppError::NotFound);
        }

        let changes = NewNote::from_input(input, Utc::now().naive_utc())?;

        let note = diesel::update(notes::table.find(id))
            .set((
                notes::title.eq(changes.title),
                notes::content.eq(changes.content),
                notes::updated_at.eq(changes.updated_at),
            ))
            .returning(Note::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from_diesel)?;

        crate::log_note_event!(NoteEvent::Updated, note_id = note.id, "Note updated");

        Ok(note)
    }

    #[tracing::instrument(name = "note_delete", skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| AppError::Pool(err.to_string()))?;

        let affected = diesel::delete(notes::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(AppError::from_diesel)?;

        if affected == 0 {
            return Err(AppError::NotFound);
        }

        crate::log_note_event!(NoteEvent::Deleted, note_id = id, "Note deleted");

        Ok(())
    }

    /// Newest notes first, at most [`LIST_LIMIT`]. A search term keeps notes
    /// whose title or content contains it, ignoring case (Unicode, not just
    /// ASCII); a blank term is the same as none.
    #[tracing::instrument(name = "note_list", skip_all)]
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Note>, AppError> {
        self.list_with_limit(search, LIST_LIMIT).await
    }

    pub async fn list_with_limit(
        &self,
        search: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Note>, AppError> {
        let term = search.map(str::trim).filter(|term| !term.is_empty());

        let mut query: notes::BoxedQuery<'static, Sqlite> = notes::table.into_boxed();

        if let Some(term) = term {
            crate::log_note_event!(
                NoteEvent::Searched,
                search = %LoggableSearchTerm::new(term),
                "Searching notes"
            );

            // Both sides are lowercased in full Unicode; LIKE alone folds ASCII only.
            let pattern = like_pattern(&term.to_lowercase());
            query = query.filter(
                fold_case(notes::title)
                    .like(pattern.clone())
                    .escape(LIKE_ESCAPE)
                    .or(fold_case(notes::content).like(pattern).escape(LIKE_ESCAPE)),
            );
        }

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| AppError::Pool(err.to_string()))?;

        query
            .order((notes::created_at.desc(), notes::id.desc()))
            .limit(limit.clamp(0, LIST_LIMIT))
            .load::<Note>(&mut conn)
            .await
            .map_err(AppError::from_diesel)
    }
}

/// Wraps `term` in `%` wildcards with its own wildcards escaped, so the term
/// always matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
