//! Telegram message formatting.

use crate::engine::{Alert, AlertDirection};
use chrono::{DateTime, Utc};
use ratewatch_core::{AssetPair, ThresholdConfig};

/// Reply sent when a price command cannot be answered.
pub const PRICES_UNAVAILABLE: &str = "⚠️ Could not fetch prices. Please try again later.";

/// Format an amount with two decimals and thousands separators, e.g. `4,621.68`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Current cross-rate with the target range and both trigger lines.
pub fn format_price_message(
    pair: &AssetPair,
    thresholds: &ThresholdConfig,
    cross_rate: f64,
    stale: bool,
    now: DateTime<Utc>,
) -> String {
    let label = pair.cross_label();
    let mut msg = format!(
        "💰 <b>{label} Price</b> ({time})\n\n\
         {label}: {rate}\n\
         Target Range: {lower} - {upper}\n\
         You will get an alert when the {label} price is above {upper_trigger} or below {lower_trigger}.",
        label = label,
        time = now.format("%Y-%m-%d %H:%M:%S UTC"),
        rate = format_amount(cross_rate),
        lower = format_amount(thresholds.lower()),
        upper = format_amount(thresholds.upper()),
        upper_trigger = format_amount(thresholds.upper_trigger()),
        lower_trigger = format_amount(thresholds.lower_trigger()),
    );

    if stale {
        msg.push_str("\n\n<i>Quote provider unreachable, showing last known prices.</i>");
    }

    msg
}

/// Alert headline naming the approached edge, followed by the price report.
pub fn format_alert_message(
    pair: &AssetPair,
    thresholds: &ThresholdConfig,
    alert: &Alert,
    stale: bool,
) -> String {
    let label = pair.cross_label();
    let headline = match alert.direction {
        AlertDirection::Upper => format!(
            "🚀 {} is close to the upper edge ({})",
            label,
            format_amount(thresholds.upper())
        ),
        AlertDirection::Lower => format!(
            "⚠️ {} is close to the lower edge ({})",
            label,
            format_amount(thresholds.lower())
        ),
    };

    format!(
        "{}\n{}",
        headline,
        format_price_message(pair, thresholds, alert.cross_rate, stale, alert.fired_at)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig::new(5135.2, 2992.61, 0.10, Duration::from_secs(3600)).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(4621.68), "4,621.68");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-2500.5), "-2,500.50");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_price_message_contains_all_figures() {
        let msg = format_price_message(&AssetPair::erg_eth(), &thresholds(), 4000.0, false, now());
        assert_eq!(
            msg,
            "💰 <b>ETH/ERG Price</b> (2024-05-01 12:30:00 UTC)\n\n\
             ETH/ERG: 4,000.00\n\
             Target Range: 2,992.61 - 5,135.20\n\
             You will get an alert when the ETH/ERG price is above 4,621.68 or below 3,291.87."
        );
    }

    #[test]
    fn test_stale_note() {
        let msg = format_price_message(&AssetPair::erg_eth(), &thresholds(), 4000.0, true, now());
        assert!(msg.ends_with("showing last known prices.</i>"));
    }

    #[test]
    fn test_alert_headlines() {
        let pair = AssetPair::erg_eth();
        let upper = Alert {
            direction: AlertDirection::Upper,
            cross_rate: 4700.0,
            fired_at: now(),
        };
        let msg = format_alert_message(&pair, &thresholds(), &upper, false);
        assert!(msg.starts_with("🚀 ETH/ERG is close to the upper edge (5,135.20)\n💰"));
        assert!(msg.contains("ETH/ERG: 4,700.00"));

        let lower = Alert {
            direction: AlertDirection::Lower,
            cross_rate: 3200.0,
            fired_at: now(),
        };
        let msg = format_alert_message(&pair, &thresholds(), &lower, false);
        assert!(msg.starts_with("⚠️ ETH/ERG is close to the lower edge (2,992.61)"));
    }
}
