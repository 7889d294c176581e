use std::{
    collections::HashMap,
    io::{Write, stdout},
};

/// Output captured from child processes, keyed by test name.
///
/// Only filled in capture mode; inherited output never passes through here.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub logs: HashMap<String, Vec<String>>,
    echo: bool,
}

impl PipelineOutput {
    /// Captured chunks are also written to stdout as they arrive.
    pub fn new() -> Self {
        Self {
            logs: HashMap::new(),
            echo: true,
        }
    }

    /// Keep captured chunks without echoing them.
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, chunk: String) {
        if self.echo {
            let mut out = stdout().lock();
            let _ = out.write_all(chunk.as_bytes());
            let _ = out.flush();
        }
        match self.logs.get_mut(key) {
            Some(entry) => entry.push(chunk),
            None => {
                self.logs.insert(key.to_string(), vec![chunk]);
            }
        }
    }

    pub fn take(&mut self, key: &str) -> Vec<String> {
        self.logs.remove(key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_accumulate_per_key() {
        let mut output = PipelineOutput::quiet();
        output.push("backprop", String::from("a"));
        output.push("fftests", String::from("b"));
        output.push("backprop", String::from("c"));

        assert_eq!(output.take("backprop"), vec!["a", "c"]);
        assert!(output.take("backprop").is_empty());
        assert_eq!(output.logs.len(), 1);
    }
}
