use std::fmt::Write;

use crate::flash::Notice;
use crate::markdown::render_markdown;
use crate::models::note::{Note, NoteInput, PREVIEW_LENGTH};
use crate::models::{NoteField, ValidationErrors};

use super::{escape_html, layout};

const DATE_FORMAT: &str = "%B %-d, %Y %H:%M";

pub fn note_path(id: i32) -> String {
    format!("/notes/{id}")
}

pub fn index(notes: &[Note], search: Option<&str>, notice: Option<Notice>) -> String {
    let search_value = escape_html(search.unwrap_or_default());

    let mut items = String::new();
    for note in notes {
        let _ = write!(
            items,
            r#"<li class="note-card">
<h2><a href="{path}">{title}</a></h2>
<p class="preview">{preview}</p>
<p class="meta">Created {created}</p>
</li>
"#,
            path = note_path(note.id),
            title = escape_html(&note.title),
            preview = escape_html(&note.preview(PREVIEW_LENGTH)),
            created = note.created_at.format(DATE_FORMAT),
        );
    }

    let listing = if !notes.is_empty() {
        format!(r#"<ul class="notes">{items}</ul>"#)
    } else if search.is_some() {
        format!(
            r#"<p class="empty">No notes match "{search_value}".</p>"#
        )
    } else {
        r#"<p class="empty">No notes yet. Write your first one!</p>"#.to_string()
    };

    let body = format!(
        r#"<div class="toolbar">
<h1>Notes</h1>
<a class="button" href="/notes/new">New Note</a>
</div>
<form class="search" action="/notes" method="get">
<input type="search" name="search" value="{search_value}" placeholder="Search notes..." aria-label="Search notes">
<button type="submit">Search</button>
</form>
{listing}"#
    );

    layout("Notes", notice, &body)
}

pub fn show(note: &Note, notice: Option<Notice>) -> String {
    let body = format!(
        r#"<article class="note">
<h1>{title}</h1>
<p class="meta">Created {created} · Updated {updated}</p>
<div class="markdown-body">{content}</div>
</article>
<nav class="actions">
<a href="{path}/edit">Edit</a>
<a href="/notes">Back to notes</a>
<form action="{path}?_method=delete" method="post" class="inline">
<button type="submit" class="danger">Delete</button>
</form>
</nav>"#,
        title = escape_html(&note.title),
        created = note.created_at.format(DATE_FORMAT),
        updated = note.updated_at.format(DATE_FORMAT),
        content = render_markdown(&note.content),
        path = note_path(note.id),
    );

    layout(&note.title, notice, &body)
}

pub fn new_note(input: &NoteInput, errors: &ValidationErrors) -> String {
    let body = format!(
        "<h1>New Note</h1>\n{}\n<p><a href=\"/notes\">Back to notes</a></p>",
        note_form("/notes", "Create Note", input, errors)
    );

    layout("New Note", None, &body)
}

pub fn edit_note(id: i32, input: &NoteInput, errors: &ValidationErrors) -> String {
    let path = note_path(id);
    let body = format!(
        "<h1>Editing Note</h1>\n{}\n<p><a href=\"{path}\">Show</a> · <a href=\"/notes\">Back to notes</a></p>",
        note_form(&format!("{path}?_method=patch"), "Update Note", input, errors)
    );

    layout("Editing Note", None, &body)
}

fn note_form(action: &str, submit_label: &str, input: &NoteInput, errors: &ValidationErrors) -> String {
    let mut error_summary = String::new();
    if !errors.is_empty() {
        let noun = if errors.len() == 1 { "error" } else { "errors" };
        let _ = write!(
            error_summary,
            r#"<div class="form-errors" role="alert"><h2>{count} {noun} prohibited this note from being saved:</h2><ul>"#,
            count = errors.len(),
        );
        for error in errors.iter() {
            let _ = write!(error_summary, "<li>{}</li>", escape_html(&error.to_string()));
        }
        error_summary.push_str("</ul></div>");
    }

    format!(
        r#"<form class="note-form" action="{action}" method="post">
{error_summary}
<div class="field{title_class}">
<label for="note_title">Title</label>
<input type="text" id="note_title" name="title" value="{title}" maxlength="200" required>
</div>
<div class="editor" data-controller="markdown-preview">
<div class="field{content_class}">
<label for="note_content">Content</label>
<textarea id="note_content" name="content" rows="16" required data-markdown-preview-target="input">
{content}</textarea>
</div>
<div class="preview-pane">
<span class="preview-label">Preview</span>
<div class="markdown-body" data-markdown-preview-target="preview">{preview}</div>
</div>
</div>
<button type="submit">{submit_label}</button>
</form>"#,
        action = escape_html(action),
        title_class = field_class(errors, NoteField::Title),
        title = escape_html(&input.title),
        content_class = field_class(errors, NoteField::Content),
        content = escape_html(&input.content),
        preview = render_markdown(&input.content),
        submit_label = escape_html(submit_label),
    )
}

fn field_class(errors: &ValidationErrors, field: NoteField) -> &'static str {
    if errors.has_field(field) { " field-with-errors" } else { "" }
}
