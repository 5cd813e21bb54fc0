/// Default values for the run configuration. These reproduce the production
/// settings of the Buff / CSFloat / Youpin price monitor.

// Source display names, also used as output field prefixes
pub const PRIMARY_SOURCE_NAME: &str = "buff";
pub const COMPARE_A_SOURCE_NAME: &str = "csfloat";
pub const COMPARE_B_SOURCE_NAME: &str = "youpin";

// Source document locations
pub const PRIMARY_SOURCE_URL: &str = "https://jakupl.github.io/buff/buffPriceList.json";
pub const COMPARE_A_SOURCE_URL: &str = "https://jakupl.github.io/csfloat/floatPriceList.json";
pub const COMPARE_B_SOURCE_URL: &str = "https://jakupl.github.io/youpin/youpinPriceList.json";

// Thresholds
pub const PRICE_RATIO_A: f64 = 0.92;
pub const PRICE_RATIO_B: f64 = 0.92;
pub const MIN_PRIMARY_STOCK: u64 = 15;
pub const MIN_COMPARE_A_STOCK: u64 = 10;
pub const MIN_PRIMARY_PRICE: f64 = 1.0;
pub const MAX_PRIMARY_PRICE: f64 = 1000.0;

/// Top-level keys that carry document metadata rather than items
pub const RESERVED_KEYS: &[&str] = &["updated_at"];

/// Field of a wrapper document that holds the item mapping
pub const ITEMS_FIELD: &str = "items";

// Artifacts
pub const OUTPUT_FILE: &str = "filteredPriceList.json";
pub const LOG_FILE: &str = "debug-log.txt";

/// Number of primary keys echoed into the diagnostic log for spot checks
pub const SAMPLE_KEY_COUNT: usize = 5;

/// Default config file looked up by the CLI when `--config` is not given
pub const CONFIG_FILE: &str = "market_filter.toml";

// Environment overrides
pub const ENV_OUTPUT_FILE: &str = "MARKET_FILTER_OUTPUT_FILE";
pub const ENV_LOG_FILE: &str = "MARKET_FILTER_LOG_FILE";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "MARKET_FILTER_FETCH_TIMEOUT_SECS";
pub const ENV_PUSHGATEWAY_URL: &str = "MARKET_FILTER_PUSHGATEWAY_URL";
