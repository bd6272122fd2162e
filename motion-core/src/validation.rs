pub const MIN_CADENCE_MS: u64 = 16;
pub const MAX_CADENCE_MS: u64 = 5_000;

pub struct Validator;

impl Validator {
    pub fn clamp_cadence_ms(cadence_ms: u64) -> u64 {
        cadence_ms.clamp(MIN_CADENCE_MS, MAX_CADENCE_MS)
    }

    /// Non-finite or negative lengths become 0.
    pub fn non_negative(value: f64) -> f64 {
        if value.is_finite() {
            value.max(0.0)
        } else {
            0.0
        }
    }

    pub fn validate_http_url(url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        ["http://", "https://"]
            .iter()
            .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
    }
}
