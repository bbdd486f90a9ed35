//! Custom emoji
//!
//! Builds the per-server catalog shown by the composer's symbol picker and
//! substitutes `:shortcode:` references in display text.

use std::collections::HashSet;

use serde::Serialize;

use crate::data::{Emoji, Server};

/// Picker catalog for one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmojiCatalog {
    /// Server domain
    pub id: String,
    pub name: String,
    pub emojis: Vec<CatalogEmoji>,
}

/// One picker entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEmoji {
    pub id: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub skins: Vec<EmojiSkin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmojiSkin {
    pub src: String,
}

impl EmojiCatalog {
    /// Build a catalog from the raw list fetched for `server`.
    ///
    /// Shortcodes are unique and case-sensitive; the first occurrence in input
    /// order wins and later duplicates are dropped. Emoji the server hides
    /// from pickers are left out but still render through [`emojify`].
    pub fn build(server: &Server, raw: &[Emoji]) -> Self {
        let mut seen = HashSet::new();
        let emojis = raw
            .iter()
            .filter(|emoji| emoji.visible_in_picker)
            .filter(|emoji| seen.insert(emoji.shortcode.as_str()))
            .map(|emoji| {
                let mut keywords = vec![emoji.shortcode.clone()];
                if let Some(category) = emoji.category.as_ref().filter(|c| !c.is_empty()) {
                    keywords.push(category.clone());
                }
                CatalogEmoji {
                    id: emoji.shortcode.clone(),
                    name: emoji.shortcode.clone(),
                    keywords,
                    skins: vec![EmojiSkin {
                        src: emoji.url.clone(),
                    }],
                }
            })
            .collect();

        Self {
            id: server.domain.clone(),
            name: server.domain.clone(),
            emojis,
        }
    }

    pub fn get(&self, shortcode: &str) -> Option<&CatalogEmoji> {
        self.emojis.iter().find(|emoji| emoji.id == shortcode)
    }

    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }
}

/// Replace `:shortcode:` references bound to `emojis` with image tags.
///
/// `text` is display HTML: plain text must already be escaped. Markup is
/// copied verbatim, which keeps already substituted images intact, so the
/// function is idempotent. Unknown shortcodes stay literal.
pub fn emojify(text: &str, emojis: &[Emoji]) -> String {
    if emojis.is_empty() || !text.contains(':') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        if rest.starts_with('<') {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }
        let next_tag = rest.find('<').unwrap_or(rest.len());
        substitute_segment(&rest[..next_tag], emojis, &mut out);
        rest = &rest[next_tag..];
    }
    out
}

fn substitute_segment(segment: &str, emojis: &[Emoji], out: &mut String) {
    let mut rest = segment;
    while let Some(start) = rest.find(':') {
        let after = &rest[start + 1..];
        let bound = after
            .find(':')
            .filter(|&len| len > 0)
            .map(|len| &after[..len])
            .filter(|code| code.chars().all(is_shortcode_char))
            .and_then(|code| emojis.iter().find(|emoji| emoji.shortcode == code));

        match bound {
            Some(emoji) => {
                out.push_str(&rest[..start]);
                out.push_str(&image_tag(emoji));
                rest = &after[emoji.shortcode.len() + 1..];
            }
            None => {
                // The closing colon may open the next reference.
                out.push_str(&rest[..=start]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
}

fn is_shortcode_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn image_tag(emoji: &Emoji) -> String {
    let shortcode = html_escape::encode_double_quoted_attribute(&emoji.shortcode);
    format!(
        r#"<img class="emojione" src="{}" alt=":{}:" title=":{}:" />"#,
        html_escape::encode_double_quoted_attribute(&emoji.url),
        shortcode,
        shortcode
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emoji(shortcode: &str, url: &str) -> Emoji {
        Emoji {
            shortcode: shortcode.to_string(),
            url: url.to_string(),
            static_url: url.to_string(),
            visible_in_picker: true,
            category: None,
        }
    }

    fn server() -> Server {
        Server {
            domain: "social.example.com".to_string(),
            base_url: "https://social.example.com".to_string(),
            sns: Default::default(),
        }
    }

    #[test]
    fn build_keeps_first_occurrence_of_duplicate_shortcodes() {
        let raw = vec![emoji("a", "1"), emoji("b", "2"), emoji("a", "3")];
        let catalog = EmojiCatalog::build(&server(), &raw);

        assert_eq!(catalog.id, "social.example.com");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().skins[0].src, "1");
        assert_eq!(catalog.get("b").unwrap().skins[0].src, "2");
        assert_eq!(catalog.emojis[0].id, "a");
        assert_eq!(catalog.emojis[1].id, "b");
    }

    #[test]
    fn build_treats_shortcodes_case_sensitively() {
        let raw = vec![emoji("Blob", "1"), emoji("blob", "2")];
        assert_eq!(EmojiCatalog::build(&server(), &raw).len(), 2);
    }

    #[test]
    fn build_adds_category_keyword() {
        let mut raw = emoji("blobcat", "1");
        raw.category = Some("Blobs".to_string());
        let catalog = EmojiCatalog::build(&server(), &[raw]);
        assert_eq!(catalog.emojis[0].keywords, vec!["blobcat", "Blobs"]);
    }

    #[test]
    fn build_skips_emoji_hidden_from_picker() {
        let mut hidden = emoji("blobcat", "1");
        hidden.visible_in_picker = false;
        let raw = vec![hidden, emoji("blobcat", "2"), emoji("wave", "3")];

        let catalog = EmojiCatalog::build(&server(), &raw);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("blobcat").unwrap().skins[0].src, "2");
        assert!(emojify(":blobcat:", &raw[..1]).contains("src=\"1\""));
    }

    #[test]
    fn emoji_default_is_visible_in_picker() {
        assert!(Emoji::default().visible_in_picker);
    }

    #[test]
    fn emojify_replaces_bound_shortcodes_only() {
        let emojis = vec![emoji("blobcat", "https://cdn.example/blobcat.png")];
        let html = emojify("hi :blobcat: and :unknown:", &emojis);

        assert!(html.starts_with("hi <img class=\"emojione\""));
        assert!(html.contains("src=\"https://cdn.example/blobcat.png\""));
        assert!(html.ends_with(" and :unknown:"));
    }

    #[test]
    fn emojify_is_idempotent() {
        let emojis = vec![emoji("blobcat", "https://cdn.example/blobcat.png")];
        let once = emojify("<p>:blobcat::blobcat:</p>", &emojis);
        let twice = emojify(&once, &emojis);

        assert_eq!(once, twice);
        assert_eq!(once.matches("<img").count(), 2);
    }

    #[test]
    fn emojify_handles_colons_that_are_not_references() {
        let emojis = vec![emoji("wave", "w.png")];
        assert_eq!(emojify("time 10:30", &emojis), "time 10:30");
        assert_eq!(emojify("::", &emojis), "::");
        assert!(emojify("a :b c :wave:", &emojis).starts_with("a :b c <img"));
        assert!(emojify("ratio 1:wave:", &emojis).contains("<img"));
    }

    #[test]
    fn emojify_without_emoji_list_is_identity() {
        assert_eq!(emojify(":blobcat:", &[]), ":blobcat:");
    }
}
