//! Ichimoku Kinko Hyo.
//!
//! - Conversion (Tenkan): midpoint of the highest high / lowest low over c bars
//! - Base (Kijun): same midpoint over b bars
//! - Span A: (conversion + base) / 2
//! - Span B: midpoint over s bars
//! - Lagging (Chikou): the close
//!
//! Values are those computed at each bar. Charts shift the spans b bars
//! forward and the lagging line b bars back; that displacement is a plotting
//! concern, so the lagging value at bar i is close i and never a later one.
//! Each line is tail-aligned: conversion has N - c + 1 values, base and
//! span A N - b + 1, span B N - s + 1, lagging N.

use crate::domain::ohlcv::Candle;

pub const DEFAULT_CONVERSION: usize = 9;
pub const DEFAULT_BASE: usize = 26;
pub const DEFAULT_SPAN_B: usize = 52;

#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuSeries {
    pub conversion: Vec<f64>,
    pub base: Vec<f64>,
    pub span_a: Vec<f64>,
    pub span_b: Vec<f64>,
    pub lagging: Vec<f64>,
}

fn midpoints(candles: &[Candle], period: usize) -> Vec<f64> {
    candles
        .windows(period)
        .map(|w| {
            let high = w.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let low = w.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            (high + low) / 2.0
        })
        .collect()
}

pub fn ichimoku(
    candles: &[Candle],
    conversion_period: usize,
    base_period: usize,
    span_b_period: usize,
) -> Option<IchimokuSeries> {
    let longest = conversion_period.max(base_period).max(span_b_period);
    if conversion_period == 0 || base_period == 0 || span_b_period == 0 || candles.len() < longest
    {
        return None;
    }

    let conversion = midpoints(candles, conversion_period);
    let base = midpoints(candles, base_period);
    let span_b = midpoints(candles, span_b_period);

    // span A needs both lines; align on whichever is shorter
    let len = conversion.len().min(base.len());
    let conv_tail = &conversion[conversion.len() - len..];
    let base_tail = &base[base.len() - len..];
    let span_a = conv_tail
        .iter()
        .zip(base_tail)
        .map(|(c, b)| (c + b) / 2.0)
        .collect();

    Some(IchimokuSeries {
        conversion,
        base,
        span_a,
        span_b,
        lagging: candles.iter().map(|c| c.close).collect(),
    })
}
