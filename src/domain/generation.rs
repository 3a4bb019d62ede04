use crate::error::Result;

/// Text generation behind a uniform contract.
///
/// `generate` takes `&mut self` because local models keep a decoder cache between steps.
/// Callers are expected to check `test_connection` before starting a batch.
#[cfg_attr(test, mockall::automock)]
pub trait GenerationBackend {
    /// Produces text for `prompt`. Any failure aborts the current batch.
    fn generate(&mut self, prompt: &str) -> Result<String>;

    /// Whether this backend can serve requests at all.
    fn test_connection(&self) -> bool;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}

impl<B: GenerationBackend + ?Sized> GenerationBackend for Box<B> {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }

    fn test_connection(&self) -> bool {
        (**self).test_connection()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
