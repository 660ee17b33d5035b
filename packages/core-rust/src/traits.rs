/// Splits a message body into transmittable segments.
///
/// The split depends on carrier character-set rules, so the coordinator only
/// relies on the contract: segments come back in order and concatenate to the
/// body. An empty body may yield zero segments.
pub trait Segmenter: Send + Sync {
    fn divide_message(&self, body: &str) -> Vec<String>;
}

impl<F> Segmenter for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn divide_message(&self, body: &str) -> Vec<String> {
        self(body)
    }
}
