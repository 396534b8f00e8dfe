//! Storage units accepted in collector options

use serde::{Deserialize, Serialize};

/// Unit used to render byte amounts.
///
/// Plain prefixes are decimal (powers of 1000), `i` suffixed ones binary
/// (powers of 1024). `Auto` picks the largest binary prefix that keeps the
/// value below 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ByteUnit {
    K,
    Ki,
    M,
    Mi,
    G,
    Gi,
    T,
    Ti,
    P,
    Pi,
    #[default]
    #[serde(rename = "auto")]
    Auto,
}

impl ByteUnit {
    /// Divisor and prefix label, `None` for `Auto`
    pub fn scale(&self) -> Option<(f64, &'static str)> {
        let (base, power, label): (f64, i32, &'static str) = match self {
            ByteUnit::K => (1000.0, 1, "K"),
            ByteUnit::Ki => (1024.0, 1, "Ki"),
            ByteUnit::M => (1000.0, 2, "M"),
            ByteUnit::Mi => (1024.0, 2, "Mi"),
            ByteUnit::G => (1000.0, 3, "G"),
            ByteUnit::Gi => (1024.0, 3, "Gi"),
            ByteUnit::T => (1000.0, 4, "T"),
            ByteUnit::Ti => (1024.0, 4, "Ti"),
            ByteUnit::P => (1000.0, 5, "P"),
            ByteUnit::Pi => (1024.0, 5, "Pi"),
            ByteUnit::Auto => return None,
        };
        Some((base.powi(power), label))
    }
}
