//! Static response-code table
//!
//! Maps the numeric body codes used across the API to their default
//! human-readable messages. The table is packaged with the binary and loaded
//! once for the lifetime of the process.

use std::collections::HashMap;
use std::sync::OnceLock;

static RAW_TABLE: &str = include_str!("../config/response_codes.json");

static TABLE: OnceLock<ResponseCodes> = OnceLock::new();

/// Process-wide response-code lookup, loaded on first access.
///
/// `main` touches this at startup so a malformed packaged table fails the
/// process before it starts serving.
pub fn table() -> &'static ResponseCodes {
    TABLE.get_or_init(|| {
        ResponseCodes::load().expect("packaged response_codes.json must parse")
    })
}

/// Immutable code -> message lookup
#[derive(Debug, Clone)]
pub struct ResponseCodes {
    map: HashMap<u16, String>,
}

impl ResponseCodes {
    /// Parse the packaged JSON resource
    pub fn load() -> anyhow::Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(RAW_TABLE)?;
        let mut map = HashMap::with_capacity(raw.len());
        for (key, message) in raw {
            let code: u16 = key
                .parse()
                .map_err(|_| anyhow::anyhow!("non-numeric response code key: {key}"))?;
            map.insert(code, message);
        }
        Ok(Self { map })
    }

    /// Default message for a code
    pub fn message(&self, code: u16) -> &str {
        self.map
            .get(&code)
            .map(String::as_str)
            .unwrap_or("Unknown response code")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_loads() {
        let codes = ResponseCodes::load().unwrap();
        assert_eq!(codes.message(601), "Account is disabled");
        assert_eq!(codes.message(600), "No user data found");
        assert_eq!(
            codes.message(429),
            "Too many requests from this IP, please try again later"
        );
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let codes = ResponseCodes::load().unwrap();
        assert_eq!(codes.message(999), "Unknown response code");
    }

    #[test]
    fn test_singleton_access() {
        // Two lookups observe the same table instance.
        let a = table() as *const ResponseCodes;
        let b = table() as *const ResponseCodes;
        assert_eq!(a, b);
    }
}
