//! Axis tick placement for the visible interval. Label text is left to the
//! host.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

pub trait TickGenerator {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick>;
}

/// Ticks on multiples of a power of ten chosen so that a span yields
/// roughly 3 to 30 ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalTicks;

impl DecimalTicks {
    pub fn step(span: f64) -> f64 {
        10f64.powf((span.log10() - 0.5).floor())
    }
}

impl TickGenerator for DecimalTicks {
    fn ticks(&self, min: f64, max: f64) -> Vec<Tick> {
        let span = max - min;
        if !span.is_finite() || span <= 0.0 {
            return Vec::new();
        }
        let step = Self::step(span);
        let first = (min / step).ceil() as i64;
        let last = (max / step).floor() as i64;
        (first..=last)
            .map(|i| {
                let value = i as f64 * step;
                Tick {
                    value,
                    label: format_label(value),
                }
            })
            .collect()
    }
}

/// Ten significant digits with trailing zeros removed.
fn format_label(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let digits = (9 - value.abs().log10().floor() as i32).clamp(0, 17) as usize;
    let text = format!("{:.*}", digits, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
