// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const MAX_INPUT_CHARS: usize = 16;
const MAX_DISTANCE_SCALE: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    /// Inclusive upper bound in km; `None` marks the open-ended last tier.
    #[serde(default)]
    pub up_to_km: Option<f64>,
    pub cents_per_km: i64,
}

/// Ordered per-km rate tiers. The first tier whose bound covers the distance
/// wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    tiers: Vec<RateTier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub distance_km: f64,
    pub cents_per_km: i64,
    pub contribution_cents: i64,
}

impl Contribution {
    pub fn rate(&self) -> f64 {
        self.cents_per_km as f64 / 100.0
    }

    pub fn rate_label(&self) -> String {
        format_cents(self.cents_per_km)
    }

    pub fn amount_label(&self) -> String {
        format_cents(self.contribution_cents)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RateTable {
    /// 0.20 €/km up to 150 km, 0.25 €/km up to 300 km, 0.30 €/km beyond.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                RateTier {
                    up_to_km: Some(150.0),
                    cents_per_km: 20,
                },
                RateTier {
                    up_to_km: Some(300.0),
                    cents_per_km: 25,
                },
                RateTier {
                    up_to_km: None,
                    cents_per_km: 30,
                },
            ],
        }
    }

    pub fn new(tiers: Vec<RateTier>) -> Result<Self> {
        let table = Self { tiers };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        let Some((last, bounded)) = self.tiers.split_last() else {
            bail!("rate table needs at least one tier");
        };
        if last.up_to_km.is_some() {
            bail!("the last rate tier must omit up_to_km so every distance is covered");
        }

        let mut previous: Option<f64> = None;
        for (index, tier) in bounded.iter().enumerate() {
            let Some(bound) = tier.up_to_km else {
                bail!("rate tier {index} has no up_to_km; only the last tier may be open ended");
            };
            if !bound.is_finite() {
                bail!("rate tier {index} has a non-finite up_to_km");
            }
            if let Some(previous) = previous
                && bound <= previous
            {
                bail!(
                    "rate tier bounds must increase strictly; tier {index} ({bound}) follows {previous}"
                );
            }
            previous = Some(bound);
        }

        if let Some(index) = self.tiers.iter().position(|tier| tier.cents_per_km < 0) {
            bail!("rate tier {index} has a negative cents_per_km");
        }
        Ok(())
    }

    pub fn tiers(&self) -> &[RateTier] {
        &self.tiers
    }

    pub fn cents_per_km(&self, distance: Distance) -> i64 {
        self.tiers
            .iter()
            .find(|tier| tier.up_to_km.is_none_or(|bound| distance.within(bound)))
            .or(self.tiers.last())
            .map(|tier| tier.cents_per_km)
            .unwrap_or(0)
    }

    /// Rounds the exact decimal amount to cents, half away from zero.
    /// Returns `None` when the amount does not fit in `i64` cents.
    pub fn contribution_for(&self, distance: Distance) -> Option<Contribution> {
        let cents_per_km = self.cents_per_km(distance);
        let product = distance.units.checked_mul(i128::from(cents_per_km))?;
        let divisor = 10_i128.checked_pow(distance.scale)?;
        let magnitude = product.checked_abs()?;
        let mut cents = magnitude / divisor;
        if (magnitude % divisor) * 2 >= divisor {
            cents += 1;
        }
        let signed = if product < 0 { -cents } else { cents };

        Some(Contribution {
            distance_km: distance.to_f64(),
            cents_per_km,
            contribution_cents: i64::try_from(signed).ok()?,
        })
    }

    /// Returns `None` when `raw` is blank, not a decimal number, or too large
    /// to price.
    pub fn compute(&self, raw: &str) -> Option<Contribution> {
        Distance::parse(raw).and_then(|distance| self.contribution_for(distance))
    }
}

pub fn compute_contribution(raw: &str) -> Option<Contribution> {
    RateTable::standard().compute(raw)
}

/// A distance held exactly as typed: `units / 10^scale` km.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distance {
    units: i128,
    scale: u32,
}

impl Distance {
    /// Accepts an optional sign, digits with an optional decimal point and an
    /// optional exponent (`1e3`). Anything else, including `NaN` and `inf`,
    /// is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (negative, body) = match trimmed.as_bytes().first()? {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (number, exponent) = match body.find(['e', 'E']) {
            Some(at) => (&body[..at], body[at + 1..].parse::<i32>().ok()?),
            None => (body, 0),
        };
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().chain(fraction.bytes()).all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        let fraction = fraction.trim_end_matches('0');
        let mut units: i128 = 0;
        for digit in whole.bytes().chain(fraction.bytes()) {
            units = units
                .checked_mul(10)?
                .checked_add(i128::from(digit - b'0'))?;
        }

        let mut scale = i64::try_from(fraction.len()).ok()? - i64::from(exponent);
        if scale < 0 {
            let shift = u32::try_from(-scale).ok()?;
            units = units.checked_mul(10_i128.checked_pow(shift)?)?;
            scale = 0;
        }
        let scale = u32::try_from(scale)
            .ok()
            .filter(|scale| *scale <= MAX_DISTANCE_SCALE)?;

        Some(Self {
            units: if negative { -units } else { units },
            scale,
        })
    }

    pub fn to_f64(self) -> f64 {
        self.units as f64 / 10_f64.powi(self.scale as i32)
    }

    fn within(self, bound_km: f64) -> bool {
        match Self::parse(&bound_km.to_string()).and_then(|bound| self.cmp_exact(bound)) {
            Some(ordering) => ordering.is_le(),
            None => self.to_f64() <= bound_km,
        }
    }

    fn cmp_exact(self, other: Self) -> Option<Ordering> {
        let scale = self.scale.max(other.scale);
        let left = self
            .units
            .checked_mul(10_i128.checked_pow(scale - self.scale)?)?;
        let right = other
            .units
            .checked_mul(10_i128.checked_pow(scale - other.scale)?)?;
        Some(left.cmp(&right))
    }
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Accepted,
    InvalidChar,
    Full,
}

/// Editable distance text owned by the calculator row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculatorInput {
    buffer: String,
}

impl CalculatorInput {
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Accepts digits, a decimal point and a sign, up to
    /// `MAX_INPUT_CHARS` characters.
    pub fn push(&mut self, ch: char) -> PushOutcome {
        if !(ch.is_ascii_digit() || matches!(ch, '.' | '-')) {
            return PushOutcome::InvalidChar;
        }
        if self.buffer.chars().count() >= MAX_INPUT_CHARS {
            return PushOutcome::Full;
        }
        self.buffer.push(ch);
        PushOutcome::Accepted
    }

    pub fn backspace(&mut self) -> bool {
        self.buffer.pop().is_some()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.buffer = value.into();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn contribution(&self, table: &RateTable) -> Option<Contribution> {
        table.compute(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CalculatorInput, Distance, MAX_INPUT_CHARS, PushOutcome, RateTable, RateTier,
        compute_contribution, format_cents,
    };

    fn labels(raw: &str) -> Option<(String, String)> {
        compute_contribution(raw).map(|result| (result.rate_label(), result.amount_label()))
    }

    #[test]
    fn boundary_scenarios_match_published_rates() {
        let cases = [
            ("100", "0.20", "20.00"),
            ("150", "0.20", "30.00"),
            ("151", "0.25", "37.75"),
            ("300", "0.25", "75.00"),
            ("301", "0.30", "90.30"),
            ("0", "0.20", "0.00"),
        ];
        for (input, rate, amount) in cases {
            assert_eq!(
                labels(input),
                Some((rate.to_owned(), amount.to_owned())),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn rate_tiers_hold_across_each_band() {
        let bands: [(&[&str], i64); 3] = [
            (&["0", "0.5", "42", "149.99", "150", "150.000"], 20),
            (&["150.0000001", "150.01", "151", "299.5", "300", "3e2"], 25),
            (&["300.01", "300.000000000000000000001", "301", "1200"], 30),
        ];
        for (inputs, cents_per_km) in bands {
            for km in inputs {
                let result = compute_contribution(km).expect("numeric input");
                assert_eq!(result.cents_per_km, cents_per_km, "{km}");
                assert!((result.rate() - cents_per_km as f64 / 100.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn blank_and_non_numeric_input_is_not_applicable() {
        for raw in ["", "   ", "abc", "12km", "NaN", "inf", "-", ".", "1.2.3", "1e", "--5"] {
            assert!(compute_contribution(raw).is_none(), "{raw:?}");
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            labels(" 100 "),
            Some(("0.20".to_owned(), "20.00".to_owned()))
        );
    }

    #[test]
    fn fractional_distances_round_half_away_from_zero() {
        // 12.5 km * 20 cents = 250 cents exactly.
        assert_eq!(labels("12.5").map(|pair| pair.1), Some("2.50".to_owned()));
        // 0.025 km * 20 cents = 0.5 cents, rounded up to 1.
        assert_eq!(
            compute_contribution("0.025").map(|result| result.contribution_cents),
            Some(1)
        );
        assert_eq!(labels("150.5").map(|pair| pair.1), Some("37.63".to_owned()));
        // Exact amounts of 37.535 and 37.605 whose binary products sit just
        // below the half cent.
        assert_eq!(labels("150.14").map(|pair| pair.1), Some("37.54".to_owned()));
        assert_eq!(labels("150.42").map(|pair| pair.1), Some("37.61".to_owned()));
        assert_eq!(
            compute_contribution("-0.025").map(|result| result.contribution_cents),
            Some(-1)
        );
    }

    #[test]
    fn every_thousandth_of_a_km_rounds_the_exact_amount() {
        for thousandths in 0..=400_000_i64 {
            let raw = format!("{}.{:03}", thousandths / 1000, thousandths % 1000);
            let cents_per_km = match thousandths {
                0..=150_000 => 20,
                150_001..=300_000 => 25,
                _ => 30,
            };
            let expected = (thousandths * cents_per_km + 500) / 1000;
            let result = compute_contribution(&raw).expect("numeric input");
            assert_eq!(result.contribution_cents, expected, "{raw}");
        }
    }

    #[test]
    fn amounts_beyond_i64_cents_are_not_applicable() {
        assert!(compute_contribution("1e300").is_none());
        assert!(compute_contribution("1e18").is_none());
        assert!(compute_contribution("-1e18").is_none());
        let large = compute_contribution("1e16").expect("fits in i64 cents");
        assert_eq!(large.contribution_cents, 300_000_000_000_000_000);
    }

    #[test]
    fn negative_distance_uses_lowest_tier() {
        let result = compute_contribution("-10").expect("negative input still computes");
        assert_eq!(result.cents_per_km, 20);
        assert_eq!(result.amount_label(), "-2.00");
    }

    #[test]
    fn format_cents_pads_and_signs() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(9030), "90.30");
        assert_eq!(format_cents(-6020), "-60.20");
        assert_eq!(format_cents(-7), "-0.07");
    }

    #[test]
    fn distance_parses_exact_decimal_text() {
        assert_eq!(Distance::parse("42"), Some(Distance { units: 42, scale: 0 }));
        assert_eq!(Distance::parse("-3.5"), Some(Distance { units: -35, scale: 1 }));
        assert_eq!(Distance::parse("+1e3"), Some(Distance { units: 1000, scale: 0 }));
        assert_eq!(Distance::parse("2.50e-1"), Some(Distance { units: 25, scale: 2 }));
        assert_eq!(Distance::parse(".5"), Some(Distance { units: 5, scale: 1 }));
        assert_eq!(Distance::parse("7."), Some(Distance { units: 7, scale: 0 }));
        assert_eq!(Distance::parse(""), None);
        assert_eq!(Distance::parse("1e-40"), None);
        assert_eq!(Distance::parse("-3.5").map(Distance::to_f64), Some(-3.5));
    }

    #[test]
    fn custom_table_validates_ordering_and_open_tail() {
        let error = RateTable::new(vec![
            RateTier {
                up_to_km: Some(200.0),
                cents_per_km: 20,
            },
            RateTier {
                up_to_km: Some(100.0),
                cents_per_km: 25,
            },
            RateTier {
                up_to_km: None,
                cents_per_km: 30,
            },
        ])
        .expect_err("decreasing bounds should fail");
        assert!(error.to_string().contains("increase strictly"));

        let error = RateTable::new(vec![RateTier {
            up_to_km: Some(100.0),
            cents_per_km: 20,
        }])
        .expect_err("bounded last tier should fail");
        assert!(error.to_string().contains("last rate tier"));

        let error = RateTable::new(Vec::new()).expect_err("empty table should fail");
        assert!(error.to_string().contains("at least one tier"));

        let error = RateTable::new(vec![RateTier {
            up_to_km: None,
            cents_per_km: -1,
        }])
        .expect_err("negative rate should fail");
        assert!(error.to_string().contains("negative"));
    }

    #[test]
    fn custom_table_applies_its_own_tiers() -> anyhow::Result<()> {
        let table = RateTable::new(vec![
            RateTier {
                up_to_km: Some(50.0),
                cents_per_km: 10,
            },
            RateTier {
                up_to_km: None,
                cents_per_km: 40,
            },
        ])?;
        let short = table.compute("50").expect("numeric input");
        assert_eq!(short.amount_label(), "5.00");
        let long = table.compute("51").expect("numeric input");
        assert_eq!(long.amount_label(), "20.40");
        Ok(())
    }

    #[test]
    fn calculator_input_filters_characters_and_edits() {
        let mut input = CalculatorInput::default();
        assert_eq!(input.push('1'), PushOutcome::Accepted);
        assert_eq!(input.push('5'), PushOutcome::Accepted);
        assert_eq!(input.push('k'), PushOutcome::InvalidChar);
        assert_eq!(input.push('1'), PushOutcome::Accepted);
        assert_eq!(input.as_str(), "151");
        assert_eq!(
            input
                .contribution(&RateTable::standard())
                .map(|result| result.amount_label()),
            Some("37.75".to_owned())
        );

        assert!(input.backspace());
        assert_eq!(input.as_str(), "15");
        input.clear();
        assert!(input.is_empty());
        assert!(!input.backspace());
        assert!(input.contribution(&RateTable::standard()).is_none());
    }

    #[test]
    fn calculator_input_caps_length() {
        let mut input = CalculatorInput::default();
        for _ in 0..MAX_INPUT_CHARS {
            assert_eq!(input.push('9'), PushOutcome::Accepted);
        }
        assert_eq!(input.push('9'), PushOutcome::Full);
        assert_eq!(input.push('x'), PushOutcome::InvalidChar);
        assert_eq!(input.as_str().len(), MAX_INPUT_CHARS);
    }
}
