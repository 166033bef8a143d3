/// Everything decoded so far in the current run.
///
/// Cleared at the start of a run, then only ever appended to (or, for the
/// single status message and the buffered fallback, replaced wholesale).
#[derive(Debug, Default, Clone)]
pub struct StreamBuffer {
    text: String,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.text.clear();
    }

    pub fn push_str(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    pub fn replace(&mut self, text: String) {
        self.text = text;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_until_reset() {
        let mut buffer = StreamBuffer::new();
        buffer.push_str("Step 1\n");
        buffer.push_str("Step 2\n");
        assert_eq!(buffer.as_str(), "Step 1\nStep 2\n");

        buffer.reset();
        assert_eq!(buffer.as_str(), "");
    }
}
