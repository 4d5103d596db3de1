use strand_domain::WindowConfig;

pub const DEFAULT_VIEWPORT_PX: u64 = 900;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub viewport_px: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            viewport_px: DEFAULT_VIEWPORT_PX,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut out = Self::default();

        if let Some(px) = parse_var(&lookup, "STRAND_OVERSCAN_PX") {
            out.window.overscan_px = px;
        }
        if let Some(threshold) = parse_var(&lookup, "STRAND_WINDOW_THRESHOLD") {
            out.window.materialize_threshold = threshold;
        }
        if let Some(px) = parse_var(&lookup, "STRAND_VIEWPORT_PX") {
            out.viewport_px = px;
        }

        out
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "ignoring invalid config value");
            None
        }
    }
}
