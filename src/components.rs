use super::models::{self, ToastStatus};
use ammonia::clean_text;
use std::fmt::Write;

/// Removes each toast once its `data-duration-ms` runs out.
const TOAST_SCRIPT: &str = r#"<script>
    new MutationObserver((records) => {
        for (const record of records) {
            for (const el of record.addedNodes) {
                if (el.dataset && el.dataset.durationMs) {
                    setTimeout(() => el.remove(), Number(el.dataset.durationMs));
                }
            }
        }
    }).observe(document.getElementById("toasts"), { childList: true });
</script>"#;

pub trait Component {
    /// Render the component to a HTML string. By convention, the
    /// implementation should sanitize all string properties at render-time
    fn render(&self) -> String;
}

pub struct Page<'a> {
    pub title: &'a str,
    pub children: Box<dyn Component + 'a>,
}

impl Component for Page<'_> {
    fn render(&self) -> String {
        let styles = include_str!("./styles.css");
        format!(
            r#"
            <html>
                <head>
                    <meta name="viewport" content="width=device-width, initial-scale=1.0"></meta>
                    <title>{title}</title>
                    <style>
                        {styles}
                    </style>
                </head>
                <body hx-boost="true">
                    {body_html}
                    <div id="toasts" class="toasts" aria-live="polite"></div>
                    {TOAST_SCRIPT}
                    <script src="https://unpkg.com/htmx.org@1.9.6"></script>
                    <script>
                        htmx.config.defaultSwapStyle = "outerHTML"
                    </script>
                </body>
            </html>
            "#,
            styles = styles,
            title = clean_text(self.title),
            body_html = self.children.render()
        )
    }
}

/// The whole app: the add form plus the list. With `notes: None` the list
/// loads itself after the page arrives.
pub struct NoteApp<'a> {
    pub input: &'a str,
    pub notes: Option<&'a [models::Note]>,
}
impl Component for NoteApp<'_> {
    fn render(&self) -> String {
        let form = AddNoteForm { input: self.input }.render();
        let list = match self.notes {
            Some(notes) => NoteList { notes }.render(),
            None => r#"
                <div hx-get="/note" hx-trigger="load">
                    Loading your notes...
                </div>
            "#
            .to_string(),
        };
        format!(
            r#"
            <main id="note-app" class="app">
                <h1 class="title">Notes</h1>
                {form}
                {list}
            </main>
            "#
        )
    }
}

pub struct AddNoteForm<'a> {
    pub input: &'a str,
}
impl Component for AddNoteForm<'_> {
    fn render(&self) -> String {
        let input = clean_text(self.input);
        format!(
            r##"
            <form
                class="add-form"
                hx-post="/note"
                hx-target="#note-app"
            >
                <input
                    type="text"
                    name="text"
                    placeholder="Add a new note..."
                    value="{input}"
                    autofocus
                />
                <button class="btn btn-teal" aria-label="Add note">+</button>
            </form>
            "##
        )
    }
}

pub struct NoteList<'a> {
    pub notes: &'a [models::Note],
}
impl Component for NoteList<'_> {
    fn render(&self) -> String {
        if self.notes.is_empty() {
            return r#"
                <div id="notes" class="notes">
                    <p class="empty">No notes yet</p>
                </div>
            "#
            .to_string();
        }
        let items = self.notes.iter().fold(String::new(), |mut str, note| {
            let _ = write!(str, "{}", NoteItem { note }.render());
            str
        });
        format!(
            r#"
            <div id="notes" class="notes">
                {items}
            </div>
            "#
        )
    }
}

pub struct NoteItem<'a> {
    pub note: &'a models::Note,
}
impl Component for NoteItem<'_> {
    fn render(&self) -> String {
        let id = clean_text(&self.note.id);
        let text = clean_text(&self.note.text);
        let delete_button = format!(
            r#"
                <button
                    type="button"
                    class="btn btn-red"
                    hx-delete="/note/{id}"
                    hx-target="closest .note"
                    aria-label="Delete note"
                >Delete</button>
            "#
        );
        if self.note.is_editing {
            format!(
                r#"
                <form class="note" hx-put="/note/{id}" hx-target="this">
                    <input type="text" name="text" value="{text}" autofocus />
                    <div class="buttons">
                        {delete_button}
                        <button class="btn btn-blue">Save</button>
                    </div>
                </form>
                "#
            )
        } else {
            format!(
                r#"
                <div class="note">
                    <p class="note-text">{text}</p>
                    <div class="buttons">
                        {delete_button}
                        <button
                            type="button"
                            class="btn btn-blue"
                            hx-post="/note/{id}/edit"
                            hx-target="closest .note"
                        >Edit</button>
                    </div>
                </div>
                "#
            )
        }
    }
}

pub struct Toast<'a> {
    pub toast: &'a models::Toast,
}
impl Component for Toast<'_> {
    fn render(&self) -> String {
        let status = match self.toast.status {
            ToastStatus::Success => "toast-success",
            ToastStatus::Error => "toast-error",
        };
        let description = match self.toast.description {
            Some(d) => format!("<p>{}</p>", clean_text(d)),
            None => "".to_string(),
        };
        let close_button = if self.toast.is_closable {
            r#"<button type="button" class="toast-close" onclick="this.parentElement.remove()" aria-label="Close">&times;</button>"#
        } else {
            ""
        };
        format!(
            r#"
            <div class="toast {status}" role="status" data-duration-ms="{duration}">
                <strong>{title}</strong>
                {description}
                {close_button}
            </div>
            "#,
            duration = self.toast.duration.as_millis(),
            title = clean_text(self.toast.title),
        )
    }
}

/// Appends toasts to the `#toasts` region on the page, whatever the main
/// swap target of the response is.
pub struct OobToasts<'a> {
    pub toasts: &'a [models::Toast],
}
impl Component for OobToasts<'_> {
    fn render(&self) -> String {
        if self.toasts.is_empty() {
            return "".to_string();
        }
        let toasts = self
            .toasts
            .iter()
            .map(|toast| Toast { toast }.render())
            .collect::<Vec<String>>()
            .join("");
        format!(
            r##"<div hx-swap-oob="beforeend:#toasts">{toasts}</div>"##
        )
    }
}
