//! Account balance.

use serde_json::Value;

use super::{ProcessError, object_at, put};
use crate::metrics::MetricSet;

const INFO: &[&str] = &["data", "account", "current", "info"];

pub(super) fn process(doc: &Value, m: &mut MetricSet) -> Result<usize, ProcessError> {
    let info = object_at(doc, INFO)?;

    if let Some(v) = info.key("balance").f64() {
        put(&m.prepay_balance, &["account"], v)?;
    }
    if let Some(v) = info.key("bonuses").f64() {
        put(&m.bonus_balance, &["account"], v)?;
    }
    if let Some(v) = info.key("blocked").f64() {
        put(&m.blocked_balance, &["account"], v)?;
    }

    let credit = info.key("credit");
    for (field, label) in [
        ("credit", "account_credit"),
        ("maxCredit", "account_max_credit"),
        ("availableCredit", "account_available_credit"),
    ] {
        if let Some(v) = credit.key(field).f64() {
            put(&m.credit_balance, &[label], v)?;
        }
    }
    if let Some(v) = credit.key("debt").f64() {
        put(&m.debt_balance, &["account"], v)?;
    }

    Ok(1)
}
