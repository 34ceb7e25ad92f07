use serde::{Deserialize, Serialize};

/// A professional's fiscal regime: VAT plus an optional social-contribution
/// add-on (cassa previdenziale) computed before VAT.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiscalProfile {
    pub id: String,
    pub name: String,
    pub iva_percent: f64,
    pub previdenza_percent: f64,
    pub note: Option<String>,
}

impl FiscalProfile {
    /// The flat 22% VAT regime with no social contribution. This is the
    /// default applied when a professional has not configured a regime.
    pub fn ordinario() -> Self {
        Self {
            id: "ordinario".to_string(),
            name: "Regime ordinario".to_string(),
            iva_percent: 22.0,
            previdenza_percent: 0.0,
            note: None,
        }
    }
}

/// Totals derived from a subtotal and a fiscal profile:
/// `cassa = imponibile * previdenza%`, `iva = (imponibile + cassa) * iva%`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiscalTotals {
    pub imponibile: f64,
    pub cassa: f64,
    pub imponibile_con_cassa: f64,
    pub iva: f64,
    pub totale: f64,
}
