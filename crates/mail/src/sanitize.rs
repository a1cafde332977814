use std::collections::HashSet;

/// Cleans untrusted text before it is stored or echoed back in mail.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, input: &str) -> String;
}

/// Strips every tag, keeping text content. Script and style bodies are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl HtmlSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, input: &str) -> String {
        ammonia::Builder::empty()
            .clean_content_tags(HashSet::from(["script", "style"]))
            .clean(input)
            .to_string()
    }
}
