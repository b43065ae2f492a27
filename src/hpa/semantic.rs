//! Semantic equality for HorizontalPodAutoscaler specs
//!
//! Two specs are equal when they mean the same thing to the autoscaler, even
//! if the API server or another writer spelled them differently:
//! - unset and empty lists/maps are the same
//! - quantities compare by value (`"1000m"` equals `"1"`, `"1Gi"` equals `"1024Mi"`)
//! - an unset `minReplicas` equals the server default of 1
//!
//! Metric order is significant and is compared as-is.

use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscalerSpec;
use serde_json::Value;

/// Server default for `spec.minReplicas` on `autoscaling/v2`
const DEFAULT_MIN_REPLICAS: i32 = 1;

/// Keys whose string values are resource quantities in HPA metric targets
const QUANTITY_KEYS: &[&str] = &["value", "averageValue"];

/// Whether two HPA specs are semantically equal
pub fn hpa_specs_equal(
    desired: &HorizontalPodAutoscalerSpec,
    current: &HorizontalPodAutoscalerSpec,
) -> bool {
    match (normalized(desired), normalized(current)) {
        (Some(a), Some(b)) => a == b,
        _ => desired == current,
    }
}

fn normalized(spec: &HorizontalPodAutoscalerSpec) -> Option<Value> {
    let mut value = serde_json::to_value(spec).ok()?;
    if let Some(obj) = value.as_object_mut() {
        obj.entry("minReplicas")
            .or_insert_with(|| Value::from(DEFAULT_MIN_REPLICAS));
    }
    normalize(&mut value, None);
    Some(value)
}

fn normalize(value: &mut Value, key: Option<&str>) {
    match value {
        Value::Object(map) => {
            for (k, child) in map.iter_mut() {
                normalize(child, Some(k.as_str()));
            }
            map.retain(|_, child| !is_empty(child));
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize(item, None);
            }
        }
        Value::String(s) if key.is_some_and(|k| QUANTITY_KEYS.contains(&k)) => {
            if let Some(nanos) = parse_quantity_nanos(s) {
                *s = nanos.to_string();
            }
        }
        _ => {}
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Parse a Kubernetes resource quantity into nano-units
///
/// Supports decimal SI suffixes (`n`, `u`, `m`, `k`, `M`, `G`, `T`, `P`, `E`),
/// binary suffixes (`Ki` .. `Ei`) and decimal exponents (`1e3`). Values finer
/// than a nano-unit round up, matching the API server. Returns `None` for
/// anything unparseable or out of range.
pub fn parse_quantity_nanos(quantity: &str) -> Option<i128> {
    let q = quantity.trim();
    let split = q
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(q.len());
    let (number, suffix) = q.split_at(split);

    let (binary, pow10) = match suffix {
        "" => (1i128, 0i32),
        "n" => (1, -9),
        "u" => (1, -6),
        "m" => (1, -3),
        "k" => (1, 3),
        "M" => (1, 6),
        "G" => (1, 9),
        "T" => (1, 12),
        "P" => (1, 15),
        "E" => (1, 18),
        "Ki" => (1 << 10, 0),
        "Mi" => (1 << 20, 0),
        "Gi" => (1 << 30, 0),
        "Ti" => (1 << 40, 0),
        "Pi" => (1 << 50, 0),
        "Ei" => (1 << 60, 0),
        s if s.starts_with('e') || s.starts_with('E') => (1, s[1..].parse::<i32>().ok()?),
        _ => return None,
    };

    let (negative, unsigned) = match number.as_bytes().first() {
        Some(b'-') => (true, &number[1..]),
        Some(b'+') => (false, &number[1..]),
        _ => (false, number),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{}{}", int_part, frac_part);
    let mantissa: i128 = digits.parse().ok()?;
    let scaled = mantissa.checked_mul(binary)?;

    let exponent = 9i32
        .checked_add(pow10)?
        .checked_sub(i32::try_from(frac_part.len()).ok()?)?;
    let magnitude = if exponent >= 0 {
        scaled.checked_mul(10i128.checked_pow(u32::try_from(exponent).ok()?)?)?
    } else {
        let divisor = 10i128.checked_pow(u32::try_from(exponent.checked_neg()?).ok()?)?;
        let quotient = scaled / divisor;
        if scaled % divisor == 0 {
            quotient
        } else {
            quotient + 1
        }
    };

    Some(if negative { -magnitude } else { magnitude })
}
