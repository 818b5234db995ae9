use hookwarden_core::{HookwardenError, HookwardenResult};
use regex::Regex;

const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
];

/// Flattens an HTML document into plain text so it can be scanned for
/// filter strings. Not a general-purpose renderer: markup is stripped, not
/// interpreted.
#[derive(Debug)]
pub struct TextExtractor {
    script: Regex,
    style: Regex,
    block_end: Regex,
    tag: Regex,
    horizontal_space: Regex,
    indented_line: Regex,
    blank_lines: Regex,
}

impl TextExtractor {
    /// Compiles the extraction pipeline.
    pub fn new() -> HookwardenResult<Self> {
        Ok(Self {
            script: compile(r"(?is)<script[^>]*>.*?</script>")?,
            style: compile(r"(?is)<style[^>]*>.*?</style>")?,
            block_end: compile(r"(?i)<(?:br|hr|/p|/div|/h[1-6]|/li|/tr)[^>]*>")?,
            tag: compile(r"<[^>]+>")?,
            horizontal_space: compile(r"[ \t]+")?,
            indented_line: compile(r"\n[ \t]+")?,
            blank_lines: compile(r"\n{3,}")?,
        })
    }

    /// Runs the pipeline. Each stage depends on the previous one, so the
    /// order below is fixed.
    pub fn to_plain_text(&self, html: &str) -> String {
        let text = self.script.replace_all(html, "");
        let text = self.style.replace_all(&text, "");
        let text = self.block_end.replace_all(&text, "\n");
        let text = self.tag.replace_all(&text, " ");
        let mut text = text.into_owned();
        for (entity, decoded) in ENTITIES {
            if text.contains(entity) {
                text = text.replace(entity, decoded);
            }
        }
        let text = self.horizontal_space.replace_all(&text, " ");
        let text = self.indented_line.replace_all(&text, "\n");
        let text = self.blank_lines.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

fn compile(pattern: &str) -> HookwardenResult<Regex> {
    Regex::new(pattern).map_err(|e| HookwardenError::Config(format!("html pattern: {e}")))
}
