use speechwire_core::{StreamingRecognitionResult, StreamingRecognizeResponse};

/// Builds a running transcript from streaming responses. Final results are
/// settled and concatenated in arrival order; interim results from the most
/// recent response describe the portion still being processed.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    finals: Vec<String>,
    interim: Vec<StreamingRecognitionResult>,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, response: &StreamingRecognizeResponse) {
        let StreamingRecognizeResponse::Results(results) = response else {
            return;
        };
        self.interim = results.iter().filter(|r| !r.is_final).cloned().collect();
        if let Some(fin) = response.final_result() {
            self.finals.push(fin.top_transcript().to_string());
        }
    }

    pub fn final_count(&self) -> usize {
        self.finals.len()
    }

    /// Everything settled so far.
    pub fn transcript(&self) -> String {
        self.finals.concat()
    }

    pub fn interim_text(&self) -> String {
        self.interim.iter().map(|r| r.top_transcript()).collect()
    }

    /// The leading interim portions whose stability reaches `threshold`.
    /// Stops at the first portion below it, later text builds on it.
    pub fn stable_interim(&self, threshold: f32) -> String {
        self.interim
            .iter()
            .take_while(|r| r.stability >= threshold)
            .map(|r| r.top_transcript())
            .collect()
    }

    pub fn display_text(&self, threshold: f32) -> String {
        let mut text = self.transcript();
        text.push_str(&self.stable_interim(threshold));
        text
    }
}
