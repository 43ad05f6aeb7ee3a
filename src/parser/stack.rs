use super::ParseError;

/// Ordered stack of currently open element names
#[derive(Debug, Default)]
pub struct ElementStack {
    open: Vec<String>,
}

impl ElementStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an opened element
    pub fn push(&mut self, name: &str) {
        self.open.push(name.to_string());
    }

    /// Close `name`, which must be the innermost open element
    pub fn pop(&mut self, name: &str, position: u64) -> Result<(), ParseError> {
        match self.open.last() {
            Some(top) if top == name => {
                self.open.pop();
                Ok(())
            }
            Some(top) => Err(ParseError::DocumentStructure {
                position,
                detail: format!("found </{}> while <{}> is open", name, top),
            }),
            None => Err(ParseError::DocumentStructure {
                position,
                detail: format!("found </{}> with no open element", name),
            }),
        }
    }

    /// Fail if any element is still open at end of input
    pub fn finish(&self, position: u64) -> Result<(), ParseError> {
        if self.open.is_empty() {
            Ok(())
        } else {
            Err(ParseError::DocumentStructure {
                position,
                detail: format!(
                    "document ended with unclosed elements: {}",
                    self.open.join(" > ")
                ),
            })
        }
    }
}
