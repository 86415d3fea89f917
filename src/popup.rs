//! Popup Content
//!
//! Builds the HTML bound to each sighting's marker:
//! - Cat summary: name, colour, friendliness, best image
//! - Sighting details: who, when, photos
//! - Notes rendered as Markdown (pulldown-cmark), with raw HTML shown as text
//!
//! Everything here is user-supplied text, so it is escaped before it
//! reaches the page.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use pulldown_cmark::{html::push_html, CowStr, Event, Options, Parser, Tag};

use crate::config::PresentationConfig;
use crate::derived;
use crate::models::{Cat, CatSighting};

const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Renders popup HTML for sightings
#[derive(Debug, Clone, Default)]
pub struct PopupRenderer {
    image_base_url: Option<String>,
}

impl PopupRenderer {
    pub fn new(config: &PresentationConfig) -> Self {
        Self {
            image_base_url: config.image_base_url.clone(),
        }
    }

    /// Popup for one sighting of `cat`
    pub fn render(&self, cat: &Cat, sighting: &CatSighting) -> String {
        let mut html = String::from(r#"<div class="cat-popup">"#);
        html.push_str(&format!("<h3>{}</h3>", escape_html(&cat.name)));

        if let Some(url) = derived::best_image_url(cat) {
            html.push_str(&image_tag(&self.resolve_image(url), "cat-popup-best"));
        }

        let mut traits = vec![escape_html(&cat.colour)];
        traits.extend(cat.markings.as_deref().map(escape_html));
        traits.extend(cat.collar.as_deref().map(|c| format!("collar: {}", escape_html(c))));
        html.push_str(&format!(
            r#"<p class="cat-popup-traits">{}</p>"#,
            traits.join(" &middot; ")
        ));

        if let Some(label) = derived::friendliness_label(cat) {
            html.push_str(&format!(r#"<p class="cat-popup-friendliness">{}</p>"#, label));
        }
        if let Some(description) = &cat.description {
            html.push_str(&format!(
                r#"<p class="cat-popup-description">{}</p>"#,
                escape_html(description)
            ));
        }

        let when = sighting.observed_at.format("%Y-%m-%d %H:%M UTC");
        let seen = match &sighting.observer {
            Some(who) => format!("Seen {} by {}", when, escape_html(who)),
            None => format!("Seen {}", when),
        };
        html.push_str(&format!(r#"<p class="cat-popup-sighting">{}</p>"#, seen));

        if sighting.has_images() {
            html.push_str(r#"<div class="cat-popup-images">"#);
            for url in &sighting.image_urls {
                html.push_str(&image_tag(&self.resolve_image(url), "cat-popup-thumb"));
            }
            html.push_str("</div>");
        }

        if let Some(notes) = &sighting.notes {
            html.push_str(&format!(
                r#"<div class="cat-popup-notes">{}</div>"#,
                self.render_notes(notes)
            ));
        }

        html.push_str("</div>");
        html
    }

    /// Render sighting notes as Markdown
    pub fn render_notes(&self, notes: &str) -> String {
        let parser = Parser::new_ext(notes, Options::ENABLE_STRIKETHROUGH);
        let events = self.transform_events(parser);
        let mut html_output = String::new();
        push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Resolve an image reference against the configured base URL
    pub fn resolve_image(&self, url: &str) -> String {
        let lower = url.to_lowercase();
        let is_absolute = lower.starts_with("http://")
            || lower.starts_with("https://")
            || lower.starts_with("data:image/")
            || url.starts_with('/');
        if is_absolute {
            return url.to_string();
        }

        let encoded = utf8_percent_encode(url, PATH_ENCODE_SET).to_string();
        match &self.image_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), encoded),
            None => encoded,
        }
    }

    fn transform_events<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut state = State::Normal;

        for event in parser {
            match state {
                State::Normal => match event {
                    // Raw HTML from a reporter is displayed, never interpreted
                    Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),

                    Event::Start(Tag::Image { dest_url, .. }) => {
                        let html = image_tag(&self.resolve_image(&dest_url), "cat-popup-note-image");
                        events.push(Event::Html(CowStr::from(html)));
                        state = State::InImage { depth: 0 };
                    }

                    Event::Start(Tag::Link { link_type, dest_url, title, id }) => {
                        let dest_url = if is_script_url(&dest_url) {
                            CowStr::from("#")
                        } else {
                            dest_url
                        };
                        events.push(Event::Start(Tag::Link { link_type, dest_url, title, id }));
                    }

                    other => events.push(other),
                },

                // Alt text is dropped; the <img> was already emitted
                State::InImage { ref mut depth } => match event {
                    Event::Start(_) => *depth += 1,
                    Event::End(_) => {
                        if *depth == 0 {
                            state = State::Normal;
                        } else {
                            *depth -= 1;
                        }
                    }
                    _ => {}
                },
            }
        }

        events
    }
}

enum State {
    Normal,
    InImage { depth: usize },
}

fn image_tag(src: &str, class: &str) -> String {
    format!(
        r#"<img class="{}" src="{}" style="max-width: 100%; border-radius: 4px;" />"#,
        class,
        escape_html(src)
    )
}

fn is_script_url(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
