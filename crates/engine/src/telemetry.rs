use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. Returns false if one was already set.
pub fn init_tracing(filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let _ = init_tracing("debug");
        assert!(!init_tracing("not a [valid filter"));
    }
}
